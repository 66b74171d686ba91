use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use crate::database::associations::{
    businesses_linked_to, people_tagged_with, remove_related_links, RelationKind,
};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Tag, TagCount, TagInput, TagRecord};
use crate::database::new_id;
use crate::database::validation::required_text;

const ENTITY: &str = "Tag";

pub struct TagRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> TagRepository<'a> {
    pub async fn list(&self) -> Result<Vec<TagRecord>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.created_at, \
             (SELECT COUNT(*) FROM business_tags bt WHERE bt.tag_id = t.id) AS businesses, \
             (SELECT COUNT(*) FROM person_tags pt WHERE pt.tag_id = t.id) AS people \
             FROM tags t ORDER BY t.name, t.id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.iter()
            .map(|row: &SqliteRow| {
                Ok(TagRecord {
                    tag: Tag::from_row(row)?,
                    count: Some(TagCount {
                        businesses: row.try_get("businesses")?,
                        people: row.try_get("people")?,
                    }),
                    businesses: None,
                    people: None,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(DatabaseError::from)
    }

    /// A tag with everything it is attached to
    pub async fn get(&self, id: &str) -> Result<TagRecord, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    pub async fn create(&self, input: TagInput) -> Result<TagRecord, DatabaseError> {
        let tag = Tag {
            id: new_id(),
            name: required_text(input.name.as_deref(), "Name is required")?,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&tag.id)
            .bind(&tag.name)
            .bind(tag.created_at)
            .execute(self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "Tag already exists"))?;

        tracing::info!(tag_id = %tag.id, "Created tag");
        Ok(TagRecord {
            tag,
            count: None,
            businesses: None,
            people: None,
        })
    }

    /// Rename a tag. A body without a name is a no-op that still reports a missing tag.
    pub async fn update(&self, id: &str, input: TagInput) -> Result<TagRecord, DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        if let Some(name) = input.name.as_deref() {
            let name = required_text(Some(name), "Name cannot be empty")?;
            let result = sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
                .bind(&name)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| DatabaseError::from_write(e, "Tag name already exists"))?;
            if result.rows_affected() == 0 {
                return Err(DatabaseError::not_found(ENTITY, id));
            }
        }
        let record = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Delete a tag and unlink it from every business and person
    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let links = remove_related_links(
            &mut tx,
            id,
            &[RelationKind::BusinessTags, RelationKind::PersonTags],
        )
        .await?;
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(ENTITY, id));
        }
        tx.commit().await?;

        tracing::info!(tag_id = %id, links, "Deleted tag");
        Ok(())
    }
}

async fn load(conn: &mut SqliteConnection, id: &str) -> Result<TagRecord, DatabaseError> {
    let tag = sqlx::query_as::<_, Tag>("SELECT id, name, created_at FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    let businesses = businesses_linked_to(conn, id, RelationKind::BusinessTags).await?;
    let people = people_tagged_with(conn, id).await?;

    Ok(TagRecord {
        tag,
        count: Some(TagCount {
            businesses: businesses.len() as i64,
            people: people.len() as i64,
        }),
        businesses: Some(businesses),
        people: Some(people),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CreateBusiness, CreatePerson};
    use crate::database::{Database, DatabaseManager};

    async fn db() -> Database {
        Database::new(DatabaseManager::in_memory().await.unwrap())
    }

    fn input(name: &str) -> TagInput {
        TagInput { name: Some(name.to_string()) }
    }

    #[tokio::test]
    async fn rename_and_conflict() {
        let db = db().await;
        let vip = db.tags().create(input("VIP")).await.unwrap().tag;
        db.tags().create(input("Lead")).await.unwrap();

        let renamed = db.tags().update(&vip.id, input("Key account")).await.unwrap();
        assert_eq!(renamed.tag.name, "Key account");

        let err = db.tags().update(&vip.id, input("Lead")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let err = db.tags().update("missing", input("Other")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_cascades_to_business_and_person_links() {
        let db = db().await;
        let vip = db.tags().create(input("VIP")).await.unwrap().tag;
        let business = db
            .businesses()
            .create(CreateBusiness {
                name: Some("Acme".to_string()),
                tag_ids: Some(vec![vip.id.clone()]),
                ..Default::default()
            })
            .await
            .unwrap();
        let person = db
            .people()
            .create(CreatePerson {
                first_name: Some("Jane".to_string()),
                last_name: Some("Doe".to_string()),
                tag_ids: Some(vec![vip.id.clone()]),
                ..Default::default()
            })
            .await
            .unwrap();

        let counted = db.tags().list().await.unwrap();
        assert_eq!(counted[0].count, Some(TagCount { businesses: 1, people: 1 }));

        db.tags().delete(&vip.id).await.unwrap();

        assert!(db.businesses().get(&business.business.id).await.unwrap().tags.is_empty());
        assert!(db.people().get(&person.person.id).await.unwrap().tags.is_empty());
        assert!(matches!(
            db.tags().delete(&vip.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
