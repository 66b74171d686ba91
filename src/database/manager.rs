use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors raised by the store layer, already sorted into the caller-facing taxonomy
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound { entity, id: id.into() }
    }

    /// Map a failed write to the closest taxonomy member. Unique violations become
    /// conflicts, foreign-key and check violations become validation failures.
    pub fn from_write(err: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::Conflict(conflict_message.into());
            }
            if db_err.is_foreign_key_violation() {
                return DatabaseError::Validation("Referenced record does not exist".to_string());
            }
            if db_err.is_check_violation() {
                return DatabaseError::Validation("Value violates a field constraint".to_string());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Connection pool construction and store lifecycle
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool for the configured database. In-memory databases are pinned to a
    /// single connection that never idles out, otherwise every connection would see
    /// its own empty database.
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
        let in_memory = Self::is_memory_url(&config.url);

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl(config.url.clone()))?
            .foreign_keys(true);
        if !in_memory {
            options = options
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .after_release(|conn, _meta| {
                Box::pin(async move {
                    // Ends a write transaction dropped before commit. Fails harmlessly
                    // when no transaction is open.
                    let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                    Ok::<_, sqlx::Error>(true)
                })
            });
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        info!("Created database pool for: {}", config.url);
        Ok(pool)
    }

    /// Fresh, migrated in-memory store
    pub async fn in_memory() -> Result<SqlitePool, DatabaseError> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: 5,
            run_migrations: true,
        };
        let pool = Self::connect(&config).await?;
        Self::migrate(&pool).await?;
        Ok(pool)
    }

    /// Apply the embedded migrations from `migrations/`
    pub async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Open a write transaction holding SQLite's write lock from the first statement.
    ///
    /// Concurrent writers queue on the busy timeout here. A deferred transaction that
    /// reads before writing fails with SQLITE_BUSY instead once another connection has
    /// written.
    pub async fn begin_write(pool: &SqlitePool) -> Result<WriteTransaction, DatabaseError> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(WriteTransaction { conn })
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn is_memory_url(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }
}

/// Connection inside `BEGIN IMMEDIATE`. Dropping it without [`commit`](Self::commit)
/// rolls back when the connection is released to the pool.
pub struct WriteTransaction {
    conn: PoolConnection<Sqlite>,
}

impl WriteTransaction {
    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        sqlx::query("COMMIT").execute(&mut *self.conn).await?;
        Ok(())
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &self.conn
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}
