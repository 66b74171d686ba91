use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use crate::database::associations::{resolve_reference, Reference};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::task::parse_due_date;
use crate::database::models::{
    CreateTask, NamedRef, PersonRef, Task, TaskFilter, TaskRecord, UpdateTask,
};
use crate::database::new_id;
use crate::database::validation::{required_patch, required_text};

const ENTITY: &str = "Task";

/// Tasks joined with the display fields of their business and person
const TASK_SELECT: &str = "SELECT t.id AS id, t.title AS title, t.description AS description, \
     t.status AS status, t.due_date AS due_date, t.business_id AS business_id, \
     t.person_id AS person_id, t.created_at AS created_at, t.updated_at AS updated_at, \
     b.name AS business_name, p.first_name AS person_first_name, p.last_name AS person_last_name \
     FROM tasks t \
     LEFT JOIN businesses b ON b.id = t.business_id \
     LEFT JOIN people p ON p.id = t.person_id";

pub struct TaskRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

impl<'a> TaskRepository<'a> {
    /// Newest first, optionally narrowed to one status
    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<TaskRecord>, DatabaseError> {
        let rows = match filter.status {
            Some(status) => {
                let sql = format!("{TASK_SELECT} WHERE t.status = ? ORDER BY t.created_at DESC, t.rowid DESC");
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(self.pool)
                    .await?
            }
            None => {
                let sql = format!("{TASK_SELECT} ORDER BY t.created_at DESC, t.rowid DESC");
                sqlx::query(&sql).fetch_all(self.pool).await?
            }
        };

        rows.iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::from)
    }

    pub async fn get(&self, id: &str) -> Result<TaskRecord, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    pub async fn create(&self, input: CreateTask) -> Result<TaskRecord, DatabaseError> {
        let title = required_text(input.title.as_deref(), "Title is required")?;
        let due_date = due_date(input.due_date.as_deref())?;
        let status = input.status.unwrap_or_default();
        let id = new_id();
        let now = Utc::now();

        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let business_id =
            resolve_reference(&mut tx, Reference::Business, input.business_id.as_deref()).await?;
        let person_id =
            resolve_reference(&mut tx, Reference::Person, input.person_id.as_deref()).await?;

        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, due_date, business_id, person_id, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&title)
        .bind(&input.description)
        .bind(status.as_str())
        .bind(due_date)
        .bind(&business_id)
        .bind(&person_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Task already exists"))?;

        let record = load(&mut tx, &id).await?;
        tx.commit().await?;

        tracing::info!(task_id = %id, status = %status, "Created task");
        Ok(record)
    }

    pub async fn update(&self, id: &str, input: UpdateTask) -> Result<TaskRecord, DatabaseError> {
        let title = required_patch(input.title.as_deref(), "Title cannot be empty")?;
        let due_date = match input.due_date.as_ref() {
            Some(raw) => Some(due_date(raw.as_deref())?),
            None => None,
        };

        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let existing = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;

        let business_id = match input.business_id {
            Some(requested) => {
                resolve_reference(&mut tx, Reference::Business, requested.as_deref()).await?
            }
            None => existing.business_id,
        };
        let person_id = match input.person_id {
            Some(requested) => {
                resolve_reference(&mut tx, Reference::Person, requested.as_deref()).await?
            }
            None => existing.person_id,
        };

        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, status = ?, due_date = ?, \
             business_id = ?, person_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(title.unwrap_or(existing.title))
        .bind(input.description.unwrap_or(existing.description))
        .bind(input.status.unwrap_or(existing.status).as_str())
        .bind(due_date.unwrap_or(existing.due_date))
        .bind(&business_id)
        .bind(&person_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Task already exists"))?;

        let record = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Flip PENDING <-> COMPLETED in a single statement, so concurrent toggles never
    /// read a stale status.
    pub async fn toggle_status(&self, id: &str) -> Result<TaskRecord, DatabaseError> {
        let mut tx = DatabaseManager::begin_write(self.pool).await?;
        let result = sqlx::query(
            "UPDATE tasks SET status = CASE status WHEN 'PENDING' THEN 'COMPLETED' ELSE 'PENDING' END, \
             updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(ENTITY, id));
        }

        let record = load(&mut tx, id).await?;
        tx.commit().await?;

        tracing::debug!(task_id = %id, status = %record.task.status, "Toggled task status");
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(ENTITY, id));
        }
        tracing::info!(task_id = %id, "Deleted task");
        Ok(())
    }
}

fn due_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match raw {
        Some(raw) => parse_due_date(raw).map_err(DatabaseError::Validation),
        None => Ok(None),
    }
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<Option<Task>, DatabaseError> {
    let task = sqlx::query_as::<_, Task>(
        "SELECT id, title, description, status, due_date, business_id, person_id, created_at, \
         updated_at FROM tasks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(task)
}

async fn load(conn: &mut SqliteConnection, id: &str) -> Result<TaskRecord, DatabaseError> {
    let sql = format!("{TASK_SELECT} WHERE t.id = ?");
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found(ENTITY, id))?;
    Ok(record_from_row(&row)?)
}

fn record_from_row(row: &SqliteRow) -> Result<TaskRecord, sqlx::Error> {
    let task = Task::from_row(row)?;

    let business_name: Option<String> = row.try_get("business_name")?;
    let business = task
        .business_id
        .clone()
        .zip(business_name)
        .map(|(id, name)| NamedRef { id, name });

    let first_name: Option<String> = row.try_get("person_first_name")?;
    let last_name: Option<String> = row.try_get("person_last_name")?;
    let person = match (task.person_id.clone(), first_name, last_name) {
        (Some(id), Some(first_name), Some(last_name)) => Some(PersonRef {
            id,
            first_name,
            last_name,
            email: None,
        }),
        _ => None,
    };

    Ok(TaskRecord {
        task,
        business,
        person,
    })
}
