use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use footfall_core::event::PageViewEvent;

use crate::schema::init_sql;

/// Layout for `TIMESTAMP` binds. DuckDB stores microseconds, so bind exactly six
/// fractional digits.
const TS_BIND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
/// Layout of `CAST(ts AS VARCHAR)` output; the fraction is optional.
const TS_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_BIND_FORMAT).to_string()
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(NaiveDateTime::parse_from_str(raw, TS_READ_FORMAT)?.and_utc())
}

/// A DuckDB backend for Footfall.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. The connection sits behind `Arc<Mutex<_>>` so the struct
/// can be shared across Axum handlers while each query holds the lock only
/// for its own statement.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append one page view.
    pub async fn insert_page_view(&self, event: &PageViewEvent) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO page_views (
                id, path, page_title, referrer, user_agent, device_type,
                session_id, visitor_id, user_id, is_new_visitor, duration,
                created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                CAST(?12 AS TIMESTAMP)
            )"#,
            duckdb::params![
                event.id,
                event.path,
                event.page_title,
                event.referrer,
                event.user_agent,
                event.device_type.map(|d| d.as_str()),
                event.session_id,
                event.visitor_id,
                event.user_id,
                event.is_new_visitor,
                event.duration,
                format_ts(event.created_at),
            ],
        )?;
        tracing::debug!(id = %event.id, path = %event.path, "Page view stored");
        Ok(())
    }

    /// Patch `duration` on a single page view. Touches no other column.
    ///
    /// Returns `false` when no row has that id.
    pub async fn update_duration(&self, page_view_id: &str, duration: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE page_views SET duration = ?1 WHERE id = ?2",
            duckdb::params![duration, page_view_id],
        )?;
        Ok(changed > 0)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }
}
