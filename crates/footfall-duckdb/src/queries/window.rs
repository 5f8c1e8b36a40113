use anyhow::Result;
use chrono::{DateTime, Utc};
use duckdb::types::Type;

use footfall_core::analytics::PeriodTotals;
use footfall_core::event::PageViewEvent;

use crate::backend::{format_ts, parse_ts};
use crate::DuckDbBackend;

impl DuckDbBackend {
    /// Load the current working set: every page view at or after `start`,
    /// newest first.
    pub async fn page_views_since(&self, start: DateTime<Utc>) -> Result<Vec<PageViewEvent>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, path, page_title, referrer, user_agent, device_type, \
                    session_id, visitor_id, user_id, is_new_visitor, duration, \
                    CAST(created_at AS VARCHAR) \
             FROM page_views \
             WHERE created_at >= CAST(?1 AS TIMESTAMP) \
             ORDER BY created_at DESC, id",
        )?;

        let rows = stmt.query_map(duckdb::params![format_ts(start)], |row| {
            let created_at: String = row.get(11)?;
            let created_at = parse_ts(&created_at).map_err(|e| {
                duckdb::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e))
            })?;
            Ok(PageViewEvent {
                id: row.get(0)?,
                path: row.get(1)?,
                page_title: row.get(2)?,
                referrer: row.get(3)?,
                user_agent: row.get(4)?,
                device_type: row
                    .get::<_, Option<String>>(5)?
                    .and_then(|d| d.parse().ok()),
                session_id: row.get(6)?,
                visitor_id: row.get(7)?,
                user_id: row.get(8)?,
                is_new_visitor: row.get(9)?,
                duration: row.get(10)?,
                created_at,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Raw page views and distinct non-empty sessions in `[start, end)`.
    ///
    /// Backs the period-over-period deltas, so only the two counts are read.
    pub async fn period_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PeriodTotals> {
        let conn = self.conn.lock().await;
        let (page_views, sessions): (i64, i64) = conn
            .prepare(
                "SELECT COUNT(*), COUNT(DISTINCT NULLIF(session_id, '')) \
                 FROM page_views \
                 WHERE created_at >= CAST(?1 AS TIMESTAMP) \
                   AND created_at < CAST(?2 AS TIMESTAMP)",
            )?
            .query_row(duckdb::params![format_ts(start), format_ts(end)], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
        Ok(PeriodTotals {
            page_views,
            sessions,
        })
    }
}
