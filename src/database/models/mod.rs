//! Row types, request payloads and response views for every entity.

pub mod business;
pub mod category;
pub mod person;
pub mod tag;
pub mod task;
pub mod user;

pub use business::{Business, BusinessCount, BusinessRecord, CreateBusiness, UpdateBusiness};
pub use category::{Category, CategoryCount, CategoryInput, CategoryRecord};
pub use person::{CreatePerson, Person, PersonCount, PersonRecord, UpdatePerson};
pub use tag::{Tag, TagCount, TagInput, TagRecord};
pub use task::{CreateTask, Task, TaskFilter, TaskRecord, TaskStatus, UpdateTask};
pub use user::{User, UserProfile};

use serde::Serialize;
use sqlx::FromRow;

/// `{id, name}` reference to a business, tag or category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Compact person reference embedded in other records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
