use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub auth_mode: AuthMode,
    pub cors_origins: Vec<String>,
    /// Zone used for daily and hourly buckets in the analytics summary.
    pub timezone: Tz,
    /// User ids promoted to admin when the server starts.
    pub admin_users: Vec<String>,
    pub catalog_path: Option<String>,
    pub realtime_window_minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthMode {
    /// No identity checks: every caller is treated as an administrator.
    None,
    /// Holds the shared HS256 secret read from `FOOTFALL_JWT_SECRET`.
    Jwt(String),
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("FOOTFALL_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("FOOTFALL_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("FOOTFALL_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            auth_mode: {
                let raw = std::env::var("FOOTFALL_AUTH").unwrap_or_else(|_| "jwt".to_string());
                match raw.as_str() {
                    "none" => AuthMode::None,
                    _ => {
                        let secret = std::env::var("FOOTFALL_JWT_SECRET").map_err(|_| {
                            "FOOTFALL_JWT_SECRET required when FOOTFALL_AUTH=jwt".to_string()
                        })?;
                        AuthMode::Jwt(secret)
                    }
                }
            },
            cors_origins: split_list(std::env::var("FOOTFALL_CORS_ORIGINS").ok()),
            timezone: std::env::var("FOOTFALL_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string())
                .parse()
                .map_err(|e| format!("invalid timezone: {e}"))?,
            admin_users: split_list(std::env::var("FOOTFALL_ADMIN_USERS").ok()),
            catalog_path: std::env::var("FOOTFALL_CATALOG_PATH").ok(),
            realtime_window_minutes: parse_realtime_minutes(
                &std::env::var("FOOTFALL_REALTIME_MINUTES").unwrap_or_else(|_| "5".to_string()),
            )?,
        })
    }
}

/// Width of the "visitors right now" window; must be at least one minute.
fn parse_realtime_minutes(raw: &str) -> Result<i64, String> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid FOOTFALL_REALTIME_MINUTES: {e}"))?;
    if minutes < 1 {
        return Err(format!(
            "invalid FOOTFALL_REALTIME_MINUTES: {minutes} (must be at least 1)"
        ));
    }
    Ok(minutes)
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
