use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::backend::format_ts;
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Distinct non-empty session ids seen at or after `since`.
    ///
    /// Backs the "visitors right now" card; the window width comes from
    /// `Config.realtime_window_minutes`.
    pub async fn active_sessions_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().await;
        let active: i64 = conn
            .prepare(
                "SELECT COUNT(DISTINCT NULLIF(session_id, '')) FROM page_views \
                 WHERE created_at >= CAST(?1 AS TIMESTAMP)",
            )?
            .query_row(duckdb::params![format_ts(since)], |row| row.get(0))?;
        Ok(active)
    }
}
