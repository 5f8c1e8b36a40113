use std::sync::Arc;

use tracing::{error, info};

use footfall_core::{
    analytics::AnalyticsBackend, catalog::Catalog, config::Config, event::UserRole,
};
use footfall_duckdb::DuckDbBackend;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Handlers are stateless request/response cycles; nothing in here is mutated
/// after startup.
pub struct AppState {
    /// The DuckDB backend, kept concretely for health checks and startup
    /// seeding.
    pub db: Arc<DuckDbBackend>,

    /// The same backend behind the storage trait used by the routes.
    pub analytics: Arc<dyn AnalyticsBackend>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Page titles and referrer categories for the summary.
    pub catalog: Arc<Catalog>,
}

impl AppState {
    /// Construct a new `AppState` with the built-in catalog.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        Self::with_catalog(db, config, Catalog::default())
    }

    pub fn with_catalog(db: DuckDbBackend, config: Config, catalog: Catalog) -> Self {
        let db = Arc::new(db);
        Self {
            analytics: db.clone(),
            db,
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        }
    }

    /// Promote every user id in `config.admin_users` to admin.
    ///
    /// A failed upsert is logged and skipped; the server still starts.
    pub async fn seed_admins(&self) {
        for user_id in &self.config.admin_users {
            match self.db.upsert_user_role(user_id, UserRole::Admin).await {
                Ok(()) => info!(user_id = %user_id, "Administrator seeded"),
                Err(e) => error!(user_id = %user_id, error = %e, "Failed to seed administrator"),
            }
        }
    }
}
