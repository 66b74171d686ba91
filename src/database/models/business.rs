use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{NamedRef, PersonRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusiness {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_utils::id_list")]
    pub tag_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "crate::serde_utils::id_list")]
    pub category_ids: Option<Vec<String>>,
}

/// Partial update. `None` leaves a field alone; for `description`, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusiness {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_utils::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::serde_utils::id_list")]
    pub tag_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "crate::serde_utils::id_list")]
    pub category_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessCount {
    pub people: i64,
    pub tags: i64,
    pub categories: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    #[serde(flatten)]
    pub business: Business,
    pub tags: Vec<NamedRef>,
    pub categories: Vec<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<PersonRef>>,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<BusinessCount>,
}

impl BusinessRecord {
    pub fn tag_ids(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn category_ids(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.id.as_str()).collect()
    }
}
