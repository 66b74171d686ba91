use sqlx::SqlitePool;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

/// Migrations already ran while connecting; this reports what is applied.
pub async fn handle(pool: &SqlitePool, output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate(pool).await?;
    let applied: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
            .fetch_all(pool)
            .await?;

    output_success(
        &output_format,
        &format!("Database is up to date ({} migration(s) applied)", applied.len()),
        Some(serde_json::json!({ "applied": applied })),
    )
}
