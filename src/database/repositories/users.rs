use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::database::new_id;
use crate::database::validation::required_text;

const USER_COLUMNS: &str = "id, email, password_hash, name, created_at";

/// Credential store. Holds already-hashed passwords only; hashing lives in `auth::password`.
pub struct UserRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let email = required_text(Some(email), "Email is required")?;
        let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);

        let user = User {
            id: new_id(),
            email,
            password_hash: password_hash.to_string(),
            name,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "User already exists"))?;

        tracing::info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY email");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(self.pool).await?;
        Ok(users)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User", id));
        }
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }
}
