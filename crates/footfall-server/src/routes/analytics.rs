use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use footfall_core::analytics::{load_window, Aggregator, TimeRange, WindowBounds};

use crate::{auth::identity::AdminIdentity, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub range: Option<String>,
}

/// `GET /api/admin/analytics?range=7d|30d|90d`: the dashboard summary.
///
/// Admin only. Any storage failure while reading the three working sets
/// fails the whole request with 500; no partial summary is returned.
#[tracing::instrument(skip(state, admin))]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = TimeRange::parse(query.range.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let bounds = WindowBounds::resolve(range, Utc::now(), state.config.realtime_window_minutes);
    let window = load_window(state.analytics.as_ref(), &bounds).await?;

    let summary = Aggregator::new(range, state.config.timezone, &state.catalog).summarize(&window);
    tracing::debug!(
        user_id = ?admin.user_id,
        range = range.as_str(),
        page_views = summary.total_page_views,
        "Analytics summary served"
    );

    Ok(Json(summary))
}
