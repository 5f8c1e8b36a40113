use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use footfall_core::event::{PageViewEvent, TrackContext, TrackPayload};

use crate::{auth::identity::MaybeIdentity, error::AppError, state::AppState};

/// `POST /api/admin/analytics` with a JSON body: record one page view.
///
/// No authentication is required. A valid token attributes the view to the
/// caller's user id; anything else is recorded anonymously.
///
/// Returns `200 OK` with `{ "success": true, "id": "<uuid>" }`. The id is what
/// the client later sends to the duration endpoint.
#[tracing::instrument(skip(state, identity, headers, payload))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    MaybeIdentity(identity): MaybeIdentity,
    headers: HeaderMap,
    payload: Result<Json<TrackPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) =
        payload.map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))?;

    let path = match payload.path.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => return Err(AppError::BadRequest("path is required".to_string())),
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let ctx = TrackContext {
        user_agent,
        user_id: identity.map(|i| i.user_id),
    };
    let event = PageViewEvent::from_payload(path, payload, ctx, Utc::now());

    state.analytics.insert_page_view(&event).await?;
    tracing::debug!(id = %event.id, path = %event.path, "Page view recorded");

    Ok(Json(json!({ "success": true, "id": event.id })))
}
