use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::database::associations::{
    associated_refs, detach_dependents, remove_owner_links, replace_associations,
    resolve_reference, Reference, RelationKind,
};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    CreatePerson, NamedRef, Person, PersonCount, PersonRecord, UpdatePerson,
};
use crate::database::new_id;
use crate::database::validation::{optional_text, required_patch, required_text};

const ENTITY: &str = "Person";
const PERSON_COLUMNS: &str = "id, first_name, last_name, email, business_id, created_at, updated_at";
const NAMES_REQUIRED: &str = "First name and last name are required";

pub struct PersonRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> PersonRepository<'a> {
    /// Everyone, ordered by last then first name
    pub async fn list(&self) -> Result<Vec<PersonRecord>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY last_name, first_name, id");
        let people = sqlx::query_as::<_, Person>(&sql)
            .fetch_all(&mut *conn)
            .await?;

        let mut records = Vec::with_capacity(people.len());
        for person in people {
            let mut record = assemble(&mut conn, person).await?;
            let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE person_id = ?")
                .bind(&record.person.id)
                .fetch_one(&mut *conn)
                .await?;
            record.count = Some(PersonCount {
                tags: record.tags.len() as i64,
                tasks,
            });
            records.push(record);
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<PersonRecord, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    pub async fn create(&self, input: CreatePerson) -> Result<PersonRecord, DatabaseError> {
        let first_name = required_text(input.first_name.as_deref(), NAMES_REQUIRED)?;
        let last_name = required_text(input.last_name.as_deref(), NAMES_REQUIRED)?;
        let email = optional_text(input.email.as_deref());
        let id = new_id();
        let now = Utc::now();

        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let business_id =
            resolve_reference(&mut tx, Reference::Business, input.business_id.as_deref()).await?;

        let sql = format!("INSERT INTO people ({PERSON_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(&id)
            .bind(&first_name)
            .bind(&last_name)
            .bind(&email)
            .bind(&business_id)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_write(e, "A person with this email already exists"))?;

        replace_associations(&mut tx, &id, RelationKind::PersonTags, input.tag_ids.as_deref())
            .await?;

        let record = load(&mut tx, &id).await?;
        tx.commit().await?;

        tracing::info!(person_id = %id, "Created person");
        Ok(record)
    }

    pub async fn update(&self, id: &str, input: UpdatePerson) -> Result<PersonRecord, DatabaseError> {
        let first_name = required_patch(input.first_name.as_deref(), "First name cannot be empty")?;
        let last_name = required_patch(input.last_name.as_deref(), "Last name cannot be empty")?;

        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let existing = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;

        let email = match input.email {
            Some(email) => optional_text(email.as_deref()),
            None => existing.email,
        };
        let business_id = match input.business_id {
            Some(business_id) => {
                resolve_reference(&mut tx, Reference::Business, business_id.as_deref()).await?
            }
            None => existing.business_id,
        };

        sqlx::query(
            "UPDATE people SET first_name = ?, last_name = ?, email = ?, business_id = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(first_name.unwrap_or(existing.first_name))
        .bind(last_name.unwrap_or(existing.last_name))
        .bind(&email)
        .bind(&business_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "A person with this email already exists"))?;

        replace_associations(&mut tx, id, RelationKind::PersonTags, input.tag_ids.as_deref())
            .await?;

        let record = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Delete a person, dropping their tag links and clearing `personId` on their tasks
    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        if fetch(&mut tx, id).await?.is_none() {
            return Err(DatabaseError::not_found(ENTITY, id));
        }

        let links = remove_owner_links(&mut tx, id, &[RelationKind::PersonTags]).await?;
        let tasks = detach_dependents(&mut tx, "tasks", "person_id", id).await?;
        sqlx::query("DELETE FROM people WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(person_id = %id, links, tasks, "Deleted person");
        Ok(())
    }
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<Person>, DatabaseError> {
    let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?");
    let person = sqlx::query_as::<_, Person>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(person)
}

async fn load(conn: &mut SqliteConnection, id: &str) -> Result<PersonRecord, DatabaseError> {
    let person = fetch(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    assemble(conn, person).await
}

async fn assemble(conn: &mut SqliteConnection, person: Person) -> Result<PersonRecord, DatabaseError> {
    let business = match person.business_id.as_deref() {
        Some(business_id) => {
            sqlx::query_as::<_, NamedRef>("SELECT id, name FROM businesses WHERE id = ?")
                .bind(business_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => None,
    };
    let tags = associated_refs(conn, &person.id, RelationKind::PersonTags).await?;

    Ok(PersonRecord {
        person,
        business,
        tags,
        count: None,
    })
}
