/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `FOOTFALL_DUCKDB_MEMORY`, default `"1GB"`). Always set it explicitly:
/// the DuckDB default of 80% of system RAM is not acceptable for a server
/// process.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- PAGE VIEWS (one row per navigation)
-- ===========================================
-- Rows are append-only except `duration`, which the duration endpoint
-- patches once by `id`.
CREATE TABLE IF NOT EXISTS page_views (
    id              VARCHAR PRIMARY KEY,           -- uuid v4
    path            VARCHAR NOT NULL,
    page_title      VARCHAR,
    referrer        VARCHAR,                       -- NULL = direct navigation
    user_agent      VARCHAR,
    device_type     VARCHAR,                       -- 'mobile' | 'desktop' | 'tablet'
    session_id      VARCHAR,                       -- client sessionStorage id
    visitor_id      VARCHAR,                       -- client localStorage id
    user_id         VARCHAR,                       -- set when the caller is signed in
    is_new_visitor  BOOLEAN NOT NULL DEFAULT false,
    duration        BIGINT NOT NULL DEFAULT 0,     -- seconds on page
    created_at      TIMESTAMP NOT NULL
);

-- Every summary read is a trailing-window scan.
CREATE INDEX IF NOT EXISTS idx_page_views_created
    ON page_views(created_at DESC);

-- ===========================================
-- USER PROFILES (role lookup for the admin dashboard)
-- ===========================================
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id         VARCHAR PRIMARY KEY,           -- identity provider `sub`
    role            VARCHAR NOT NULL DEFAULT 'user',  -- 'user' | 'admin'
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#
    )
}
