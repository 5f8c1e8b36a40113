use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use footfall_core::config::{AuthMode, Config};
use footfall_core::event::DeviceType;
use footfall_duckdb::DuckDbBackend;
use footfall_server::app::build_app;
use footfall_server::auth::jwt::encode_jwt;
use footfall_server::state::AppState;

const SECRET: &str = "test-secret-with-enough-entropy";

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/footfall-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        auth_mode: AuthMode::Jwt(SECRET.to_string()),
        cors_origins: vec![],
        timezone: chrono_tz::UTC,
        admin_users: vec![],
        catalog_path: None,
        realtime_window_minutes: 5,
    }
}

fn setup() -> Arc<AppState> {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    Arc::new(AppState::new(db, test_config()))
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn track_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/api/admin/analytics")
        .header("content-type", "application/json")
}

#[tokio::test]
async fn test_track_records_page_view_and_returns_id() {
    let state = setup();
    let app = build_app(Arc::clone(&state));

    let payload = json!({
        "path": "/free",
        "page_title": "Free Board",
        "referrer": "https://www.google.com/search?q=x",
        "session_id": "s1",
        "visitor_id": "v1",
        "is_new_visitor": true
    });
    let request = track_request()
        .header(
            "user-agent",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
        )
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    let id = json["id"].as_str().expect("id").to_string();

    let rows = state
        .db
        .page_views_since(Utc::now() - Duration::minutes(5))
        .await
        .expect("read");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, id);
    assert_eq!(row.path, "/free");
    assert_eq!(row.page_title.as_deref(), Some("Free Board"));
    assert_eq!(row.session_id.as_deref(), Some("s1"));
    assert_eq!(row.visitor_id.as_deref(), Some("v1"));
    assert_eq!(row.device_type, Some(DeviceType::Mobile));
    assert!(row.is_new_visitor);
    assert_eq!(row.duration, 0);
    assert_eq!(row.user_id, None);
}

#[tokio::test]
async fn test_track_attributes_valid_token_to_user() {
    let state = setup();
    let app = build_app(Arc::clone(&state));
    let token = encode_jwt(SECRET, "user_42", Duration::hours(1)).expect("token");

    let payload = json!({ "path": "/it-ai", "session_id": "s1" });
    let request = track_request()
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let rows = state
        .db
        .page_views_since(Utc::now() - Duration::minutes(5))
        .await
        .expect("read");
    assert_eq!(rows[0].user_id.as_deref(), Some("user_42"));
}

#[tokio::test]
async fn test_track_with_invalid_token_is_recorded_anonymously() {
    let state = setup();
    let app = build_app(Arc::clone(&state));
    let forged = encode_jwt("some-other-secret", "user_42", Duration::hours(1)).expect("token");

    let payload = json!({ "path": "/" });
    let request = track_request()
        .header("cookie", format!("footfall_session={forged}"))
        .body(Body::from(payload.to_string()))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let rows = state
        .db
        .page_views_since(Utc::now() - Duration::minutes(5))
        .await
        .expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, None);
}

#[tokio::test]
async fn test_track_without_path_is_rejected() {
    let state = setup();

    for payload in [json!({ "session_id": "s1" }), json!({ "path": "  " })] {
        let app = build_app(Arc::clone(&state));
        let request = track_request()
            .body(Body::from(payload.to_string()))
            .expect("build request");
        let response = app.oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    let rows = state
        .db
        .page_views_since(Utc::now() - Duration::minutes(5))
        .await
        .expect("read");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_track_malformed_json_is_rejected() {
    let app = build_app(setup());
    let request = Request::builder()
        .method("POST")
        .uri("/api/admin/analytics")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("build request");

    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_track_empty_referrer_is_stored_as_missing() {
    let state = setup();
    let app = build_app(Arc::clone(&state));

    let payload = json!({ "path": "/", "referrer": "" });
    let request = track_request()
        .body(Body::from(payload.to_string()))
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let rows = state
        .db
        .page_views_since(Utc::now() - Duration::minutes(5))
        .await
        .expect("read");
    assert_eq!(rows[0].referrer, None);
    assert_eq!(rows[0].device_type, Some(DeviceType::Desktop));
}

#[tokio::test]
async fn test_track_null_new_visitor_flag_is_recorded_as_returning() {
    let state = setup();
    let app = build_app(Arc::clone(&state));

    let payload = json!({ "path": "/free", "session_id": "s1", "is_new_visitor": null });
    let request = track_request()
        .body(Body::from(payload.to_string()))
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let rows = state
        .db
        .page_views_since(Utc::now() - Duration::minutes(5))
        .await
        .expect("read");
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_new_visitor);
}
