use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crm_api_rust::config::config;
use crm_api_rust::database::DatabaseManager;
use crm_api_rust::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config();
    tracing::info!("Starting CRM API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to open database")?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let state = AppState::new(pool, config.clone())
        .context("invalid session settings: check SECURITY_JWT_SECRET and SECURITY_SESSION_TTL_HOURS")?;
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("CRM API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
