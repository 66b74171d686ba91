//! Join-row and foreign-key bookkeeping shared by the entity repositories.
//!
//! Every function here takes a `&mut SqliteConnection` so it can run inside the
//! caller's transaction: the owner's own field update, the join-row replacement and
//! any cascade must commit or roll back together.

use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::HashSet;

use super::manager::DatabaseError;
use super::models::{NamedRef, PersonRef};

/// Many-to-many relation backed by a join table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BusinessTags,
    BusinessCategories,
    PersonTags,
}

impl RelationKind {
    fn join_table(self) -> &'static str {
        match self {
            RelationKind::BusinessTags => "business_tags",
            RelationKind::BusinessCategories => "business_categories",
            RelationKind::PersonTags => "person_tags",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            RelationKind::BusinessTags | RelationKind::BusinessCategories => "business_id",
            RelationKind::PersonTags => "person_id",
        }
    }

    fn related_column(self) -> &'static str {
        match self {
            RelationKind::BusinessTags | RelationKind::PersonTags => "tag_id",
            RelationKind::BusinessCategories => "category_id",
        }
    }

    fn related_table(self) -> &'static str {
        match self {
            RelationKind::BusinessTags | RelationKind::PersonTags => "tags",
            RelationKind::BusinessCategories => "categories",
        }
    }

    fn related_label(self) -> &'static str {
        match self {
            RelationKind::BusinessTags | RelationKind::PersonTags => "tag",
            RelationKind::BusinessCategories => "category",
        }
    }
}

/// Single-valued foreign key on a row (`people.business_id`, `tasks.person_id`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Business,
    Person,
}

impl Reference {
    fn table(self) -> &'static str {
        match self {
            Reference::Business => "businesses",
            Reference::Person => "people",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Reference::Business => "business",
            Reference::Person => "person",
        }
    }
}

/// Turn a requested id list into a set: blank ids are dropped, duplicates collapse,
/// first-seen order is kept so inserts are deterministic.
pub fn normalize_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter_map(|id| {
            let id = id.as_ref().trim();
            (!id.is_empty() && seen.insert(id.to_string())).then(|| id.to_string())
        })
        .collect()
}

/// Make the join rows for `(owner_id, kind)` exactly equal to `target_ids`.
///
/// `None` means the caller did not send the field at all and nothing is touched.
/// `Some(ids)` replaces the whole set, so `Some(vec![])` clears it. Every target id
/// must exist; otherwise the call fails with `Validation` before any row changes and
/// the caller's transaction is expected to roll back.
pub async fn replace_associations(
    conn: &mut SqliteConnection,
    owner_id: &str,
    kind: RelationKind,
    target_ids: Option<&[String]>,
) -> Result<(), DatabaseError> {
    let Some(target_ids) = target_ids else {
        return Ok(());
    };
    let ids = normalize_ids(target_ids);

    ensure_related_exist(conn, kind, &ids).await?;

    let delete_sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        kind.join_table(),
        kind.owner_column()
    );
    sqlx::query(&delete_sql).bind(owner_id).execute(&mut *conn).await?;

    let insert_sql = format!(
        "INSERT INTO {} ({}, {}, created_at) VALUES (?, ?, ?)",
        kind.join_table(),
        kind.owner_column(),
        kind.related_column()
    );
    let now = Utc::now();
    for related_id in &ids {
        sqlx::query(&insert_sql)
            .bind(owner_id)
            .bind(related_id)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| DatabaseError::from_write(e, format!("Duplicate {} link", kind.related_label())))?;
    }

    tracing::debug!(
        owner = owner_id,
        relation = ?kind,
        count = ids.len(),
        "Replaced associations"
    );
    Ok(())
}

/// Related ids currently linked to `owner_id`, sorted for stable comparison
pub async fn associated_ids(
    conn: &mut SqliteConnection,
    owner_id: &str,
    kind: RelationKind,
) -> Result<Vec<String>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
        kind.related_column(),
        kind.join_table(),
        kind.owner_column(),
        kind.related_column()
    );
    let ids: Vec<String> = sqlx::query_scalar(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(ids)
}

/// `{id, name}` of the related rows linked to `owner_id`, ordered by name
pub async fn associated_refs(
    conn: &mut SqliteConnection,
    owner_id: &str,
    kind: RelationKind,
) -> Result<Vec<NamedRef>, DatabaseError> {
    let sql = format!(
        "SELECT r.id, r.name FROM {join} j JOIN {related} r ON r.id = j.{related_col} \
         WHERE j.{owner_col} = ? ORDER BY r.name",
        join = kind.join_table(),
        related = kind.related_table(),
        related_col = kind.related_column(),
        owner_col = kind.owner_column(),
    );
    let refs = sqlx::query_as::<_, NamedRef>(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(refs)
}

/// Businesses linked to a tag or category (the reverse side of a business relation)
pub async fn businesses_linked_to(
    conn: &mut SqliteConnection,
    related_id: &str,
    kind: RelationKind,
) -> Result<Vec<NamedRef>, DatabaseError> {
    debug_assert!(kind != RelationKind::PersonTags);
    let sql = format!(
        "SELECT b.id, b.name FROM {join} j JOIN businesses b ON b.id = j.business_id \
         WHERE j.{related_col} = ? ORDER BY b.name",
        join = kind.join_table(),
        related_col = kind.related_column(),
    );
    let refs = sqlx::query_as::<_, NamedRef>(&sql)
        .bind(related_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(refs)
}

/// People carrying a tag
pub async fn people_tagged_with(
    conn: &mut SqliteConnection,
    tag_id: &str,
) -> Result<Vec<PersonRef>, DatabaseError> {
    let refs = sqlx::query_as::<_, PersonRef>(
        "SELECT p.id, p.first_name, p.last_name, NULL AS email FROM person_tags j \
         JOIN people p ON p.id = j.person_id WHERE j.tag_id = ? \
         ORDER BY p.last_name, p.first_name",
    )
    .bind(tag_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(refs)
}

/// Cascade for an owner delete: drop every join row the owner participates in
pub async fn remove_owner_links(
    conn: &mut SqliteConnection,
    owner_id: &str,
    kinds: &[RelationKind],
) -> Result<u64, DatabaseError> {
    let mut removed = 0;
    for kind in kinds {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            kind.join_table(),
            kind.owner_column()
        );
        removed += sqlx::query(&sql)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(removed)
}

/// Cascade for a tag/category delete: drop every join row pointing at it
pub async fn remove_related_links(
    conn: &mut SqliteConnection,
    related_id: &str,
    kinds: &[RelationKind],
) -> Result<u64, DatabaseError> {
    let mut removed = 0;
    for kind in kinds {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            kind.join_table(),
            kind.related_column()
        );
        removed += sqlx::query(&sql)
            .bind(related_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }
    Ok(removed)
}

/// Fail with `Validation` unless `id` names an existing row of `reference`'s table
pub async fn ensure_reference(
    conn: &mut SqliteConnection,
    reference: Reference,
    id: &str,
) -> Result<(), DatabaseError> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", reference.table());
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;
    if count == 0 {
        return Err(DatabaseError::Validation(format!(
            "Unknown {} id: {}",
            reference.label(),
            id
        )));
    }
    Ok(())
}

/// Resolve a requested single reference. Blank ids count as "no reference".
pub async fn resolve_reference(
    conn: &mut SqliteConnection,
    reference: Reference,
    id: Option<&str>,
) -> Result<Option<String>, DatabaseError> {
    match id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => {
            ensure_reference(conn, reference, id).await?;
            Ok(Some(id.to_string()))
        }
        None => Ok(None),
    }
}

/// Null out `column` on every row of `table` that points at `id`. Used when a business
/// or person is deleted: dependents outlive the row they referenced.
pub async fn detach_dependents(
    conn: &mut SqliteConnection,
    table: &'static str,
    column: &'static str,
    id: &str,
) -> Result<u64, DatabaseError> {
    let sql = format!(
        "UPDATE {table} SET {column} = NULL, updated_at = ? WHERE {column} = ?"
    );
    let result = sqlx::query(&sql)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

async fn ensure_related_exist(
    conn: &mut SqliteConnection,
    kind: RelationKind,
    ids: &[String],
) -> Result<(), DatabaseError> {
    if ids.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id FROM {} WHERE id IN ({})",
        kind.related_table(),
        placeholders
    );
    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let found: HashSet<String> = query.fetch_all(&mut *conn).await?.into_iter().collect();

    let missing: Vec<&str> = ids
        .iter()
        .filter(|id| !found.contains(id.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(DatabaseError::Validation(format!(
            "Unknown {} id(s): {}",
            kind.related_label(),
            missing.join(", ")
        )));
    }
    Ok(())
}
