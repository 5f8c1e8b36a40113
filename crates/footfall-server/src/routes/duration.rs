use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use serde_json::json;

use footfall_core::event::DurationPatch;

use crate::{error::AppError, state::AppState};

/// `POST /api/admin/analytics/duration`: set the dwell time of a recorded
/// page view.
///
/// The body is parsed as JSON whatever the `Content-Type`, because
/// `navigator.sendBeacon` posts strings as `text/plain`. A well-formed patch
/// for an id that does not exist is acknowledged without effect.
#[tracing::instrument(skip(state, body))]
pub async fn patch_duration(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let patch: DurationPatch = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))?;

    let page_view_id = match patch.page_view_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(AppError::BadRequest("page_view_id is required".to_string())),
    };
    let duration = match patch.duration {
        Some(d) if d >= 0 => d,
        Some(_) => {
            return Err(AppError::BadRequest(
                "duration must be a non-negative integer".to_string(),
            ))
        }
        None => return Err(AppError::BadRequest("duration is required".to_string())),
    };

    let found = state
        .analytics
        .update_duration(&page_view_id, duration)
        .await?;
    if !found {
        tracing::debug!(page_view_id = %page_view_id, "Duration patch for unknown page view");
    }

    Ok(Json(json!({ "success": true })))
}
