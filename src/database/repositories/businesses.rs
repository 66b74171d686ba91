use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::database::associations::{
    associated_refs, detach_dependents, remove_owner_links, replace_associations, RelationKind,
};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Business, BusinessCount, BusinessRecord, CreateBusiness, PersonRef, UpdateBusiness,
};
use crate::database::new_id;
use crate::database::validation::{required_patch, required_text};

const ENTITY: &str = "Business";

pub struct BusinessRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> BusinessRepository<'a> {
    /// All businesses by name, each with its tags, categories and link counts
    pub async fn list(&self) -> Result<Vec<BusinessRecord>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let businesses = sqlx::query_as::<_, Business>(
            "SELECT id, name, description, created_at, updated_at FROM businesses ORDER BY name, id",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut records = Vec::with_capacity(businesses.len());
        for business in businesses {
            let tags = associated_refs(&mut conn, &business.id, RelationKind::BusinessTags).await?;
            let categories =
                associated_refs(&mut conn, &business.id, RelationKind::BusinessCategories).await?;
            let people: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE business_id = ?")
                .bind(&business.id)
                .fetch_one(&mut *conn)
                .await?;

            records.push(BusinessRecord {
                count: Some(BusinessCount {
                    people,
                    tags: tags.len() as i64,
                    categories: categories.len() as i64,
                }),
                business,
                tags,
                categories,
                people: None,
            });
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<BusinessRecord, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    pub async fn create(&self, input: CreateBusiness) -> Result<BusinessRecord, DatabaseError> {
        let name = required_text(input.name.as_deref(), "Name is required")?;
        let id = new_id();
        let now = Utc::now();

        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        sqlx::query(
            "INSERT INTO businesses (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Business already exists"))?;

        replace_associations(&mut tx, &id, RelationKind::BusinessTags, input.tag_ids.as_deref())
            .await?;
        replace_associations(
            &mut tx,
            &id,
            RelationKind::BusinessCategories,
            input.category_ids.as_deref(),
        )
        .await?;

        let record = load(&mut tx, &id).await?;
        tx.commit().await?;

        tracing::info!(business_id = %id, "Created business");
        Ok(record)
    }

    /// Apply only the supplied fields. The scalar update and both link replacements
    /// share one transaction: a bad tag id leaves the name untouched too.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateBusiness,
    ) -> Result<BusinessRecord, DatabaseError> {
        let name = required_patch(input.name.as_deref(), "Name cannot be empty")?;

        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let existing = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;

        let name = name.unwrap_or(existing.name);
        let description = match input.description {
            Some(description) => description,
            None => existing.description,
        };

        sqlx::query("UPDATE businesses SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&description)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_write(e, "Business name already exists"))?;

        replace_associations(&mut tx, id, RelationKind::BusinessTags, input.tag_ids.as_deref())
            .await?;
        replace_associations(
            &mut tx,
            id,
            RelationKind::BusinessCategories,
            input.category_ids.as_deref(),
        )
        .await?;

        let record = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Delete a business. Its tag/category links go with it; people and tasks that
    /// pointed at it stay, with the reference cleared.
    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        if fetch(&mut tx, id).await?.is_none() {
            return Err(DatabaseError::not_found(ENTITY, id));
        }

        let links = remove_owner_links(
            &mut tx,
            id,
            &[RelationKind::BusinessTags, RelationKind::BusinessCategories],
        )
        .await?;
        let tasks = detach_dependents(&mut tx, "tasks", "business_id", id).await?;
        let people = detach_dependents(&mut tx, "people", "business_id", id).await?;

        sqlx::query("DELETE FROM businesses WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(business_id = %id, links, tasks, people, "Deleted business");
        Ok(())
    }
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<Business>, DatabaseError> {
    let business = sqlx::query_as::<_, Business>(
        "SELECT id, name, description, created_at, updated_at FROM businesses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(business)
}

/// Detail view: the business with its tags, categories and people
async fn load(conn: &mut SqliteConnection, id: &str) -> Result<BusinessRecord, DatabaseError> {
    let business = fetch(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    let tags = associated_refs(conn, id, RelationKind::BusinessTags).await?;
    let categories = associated_refs(conn, id, RelationKind::BusinessCategories).await?;
    let people = sqlx::query_as::<_, PersonRef>(
        "SELECT id, first_name, last_name, email FROM people WHERE business_id = ? \
         ORDER BY last_name, first_name",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(BusinessRecord {
        business,
        tags,
        categories,
        people: Some(people),
        count: None,
    })
}
