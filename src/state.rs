use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{JwtError, SessionAuthority};
use crate::config::AppConfig;
use crate::database::Database;

/// Shared by every handler through `State`
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<SessionAuthority>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Fails when the session secret is empty or the session TTL is out of range
    pub fn new(pool: SqlitePool, config: AppConfig) -> Result<Self, JwtError> {
        let sessions = SessionAuthority::from_config(&config.security)?;
        Ok(Self {
            db: Database::new(pool),
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        })
    }
}
