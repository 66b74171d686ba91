use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{NamedRef, PersonRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Body of both `POST /tags` and `PUT /tags/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub businesses: i64,
    pub people: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRecord {
    #[serde(flatten)]
    pub tag: Tag,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<TagCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub businesses: Option<Vec<NamedRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<PersonRef>>,
}
