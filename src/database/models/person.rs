use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::NamedRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub business_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub business_id: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_utils::id_list")]
    pub tag_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_utils::double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::serde_utils::double_option")]
    pub business_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::serde_utils::id_list")]
    pub tag_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersonCount {
    pub tags: i64,
    pub tasks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonRecord {
    #[serde(flatten)]
    pub person: Person,
    pub business: Option<NamedRef>,
    pub tags: Vec<NamedRef>,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<PersonCount>,
}

impl PersonRecord {
    pub fn tag_ids(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.id.as_str()).collect()
    }
}
