use chrono::Utc;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use crate::database::associations::{businesses_linked_to, remove_related_links, RelationKind};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Category, CategoryCount, CategoryInput, CategoryRecord};
use crate::database::new_id;
use crate::database::validation::required_text;

const ENTITY: &str = "Category";

pub struct CategoryRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    pub async fn list(&self) -> Result<Vec<CategoryRecord>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT c.id, c.name, c.created_at, \
             (SELECT COUNT(*) FROM business_categories bc WHERE bc.category_id = c.id) AS businesses \
             FROM categories c ORDER BY c.name, c.id",
        )
        .fetch_all(self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(CategoryRecord {
                category: Category::from_row(row)?,
                count: Some(CategoryCount {
                    businesses: row.try_get("businesses")?,
                }),
                businesses: None,
            });
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<CategoryRecord, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    pub async fn create(&self, input: CategoryInput) -> Result<CategoryRecord, DatabaseError> {
        let category = Category {
            id: new_id(),
            name: required_text(input.name.as_deref(), "Name is required")?,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "Category already exists"))?;

        tracing::info!(category_id = %category.id, "Created category");
        Ok(CategoryRecord {
            category,
            count: None,
            businesses: None,
        })
    }

    pub async fn update(&self, id: &str, input: CategoryInput) -> Result<CategoryRecord, DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        if let Some(name) = input.name.as_deref() {
            let name = required_text(Some(name), "Name cannot be empty")?;
            let result = sqlx::query("UPDATE categories SET name = ? WHERE id = ?")
                .bind(&name)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| DatabaseError::from_write(e, "Category name already exists"))?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::not_found(ENTITY, id));
            }
        }
        let record = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let links = remove_related_links(&mut tx, id, &[RelationKind::BusinessCategories]).await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(ENTITY, id));
        }
        tx.commit().await?;

        tracing::info!(category_id = %id, links, "Deleted category");
        Ok(())
    }
}

async fn load(conn: &mut SqliteConnection, id: &str) -> Result<CategoryRecord, DatabaseError> {
    let category =
        sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    let businesses = businesses_linked_to(conn, id, RelationKind::BusinessCategories).await?;

    Ok(CategoryRecord {
        category,
        count: Some(CategoryCount {
            businesses: businesses.len() as i64,
        }),
        businesses: Some(businesses),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateBusiness;
    use crate::database::{Database, DatabaseManager};

    async fn db() -> Database {
        Database::new(DatabaseManager::in_memory().await.unwrap())
    }

    fn input(name: &str) -> CategoryInput {
        CategoryInput { name: Some(name.to_string()) }
    }

    #[tokio::test]
    async fn list_is_sorted_and_counted() {
        let db = db().await;
        let retail = db.categories().create(input("Retail")).await.unwrap().category;
        db.categories().create(input("Manufacturing")).await.unwrap();
        db.businesses()
            .create(CreateBusiness {
                name: Some("Acme".to_string()),
                category_ids: Some(vec![retail.id.clone()]),
                ..Default::default()
            })
            .await
            .unwrap();

        let list = db.categories().list().await.unwrap();
        let names: Vec<&str> = list.iter().map(|c| c.category.name.as_str()).collect();
        assert_eq!(names, vec!["Manufacturing", "Retail"]);
        assert_eq!(list[1].count, Some(CategoryCount { businesses: 1 }));

        let detail = db.categories().get(&retail.id).await.unwrap();
        assert_eq!(detail.businesses.unwrap()[0].name, "Acme");
    }

    #[tokio::test]
    async fn delete_unlinks_businesses() {
        let db = db().await;
        let retail = db.categories().create(input("Retail")).await.unwrap().category;
        let business = db
            .businesses()
            .create(CreateBusiness {
                name: Some("Acme".to_string()),
                category_ids: Some(vec![retail.id.clone()]),
                ..Default::default()
            })
            .await
            .unwrap();

        db.categories().delete(&retail.id).await.unwrap();
        let business = db.businesses().get(&business.business.id).await.unwrap();
        assert!(business.categories.is_empty());
        assert!(matches!(
            db.categories().get(&retail.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let db = db().await;
        let err = db.categories().create(input("")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }
}
