use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::NamedRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub businesses: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRecord {
    #[serde(flatten)]
    pub category: Category,
    #[serde(rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<CategoryCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub businesses: Option<Vec<NamedRef>>,
}
