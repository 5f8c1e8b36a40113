use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use footfall_core::{catalog::Catalog, config::AuthMode};
use footfall_duckdb::DuckDbBackend;
use footfall_server::state::AppState;

/// `footfall health` — liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$FOOTFALL_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("FOOTFALL_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("footfall=info".parse()?),
        )
        .json()
        .init();

    let cfg = footfall_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/footfall.db", cfg.data_dir);
    let db = DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let catalog = match &cfg.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };

    match &cfg.auth_mode {
        AuthMode::Jwt(_) => info!(admins = cfg.admin_users.len(), "JWT auth enabled"),
        AuthMode::None => {
            info!("Auth disabled (FOOTFALL_AUTH=none): analytics summary is open")
        }
    }

    let state = Arc::new(AppState::with_catalog(db, cfg.clone(), catalog));
    state.seed_admins().await;

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = footfall_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, timezone = %cfg.timezone, "Footfall listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
