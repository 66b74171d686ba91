pub mod associations;
pub mod manager;
pub mod models;
pub mod repositories;
pub mod validation;

pub use associations::{normalize_ids, RelationKind};
pub use manager::{DatabaseError, DatabaseManager};
pub use repositories::{
    BusinessRepository, CategoryRepository, PersonRepository, TagRepository, TaskRepository,
    UserRepository,
};

use sqlx::SqlitePool;
use uuid::Uuid;

/// Cheap, cloneable handle that hands out per-entity repositories over one pool
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository { pool: &self.pool }
    }

    pub fn businesses(&self) -> BusinessRepository<'_> {
        BusinessRepository { pool: &self.pool }
    }

    pub fn people(&self) -> PersonRepository<'_> {
        PersonRepository { pool: &self.pool }
    }

    pub fn tags(&self) -> TagRepository<'_> {
        TagRepository { pool: &self.pool }
    }

    pub fn categories(&self) -> CategoryRepository<'_> {
        CategoryRepository { pool: &self.pool }
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository { pool: &self.pool }
    }
}

/// Opaque identifier for new rows
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
