use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::password::hash_password_blocking;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::{
    CategoryInput, CreateBusiness, CreatePerson, CreateTask, TagInput, TaskStatus,
};
use crate::database::Database;

const SEED_PASSWORD: &str = "password123";

const USERS: [(&str, &str); 3] = [
    ("alice@example.com", "Alice Johnson"),
    ("bob@example.com", "Bob Smith"),
    ("carol@example.com", "Carol Williams"),
];

const BUSINESSES: [(&str, &str); 4] = [
    ("Acme Corp", "A technology company"),
    ("Tech Solutions", "Software development services"),
    ("Green Energy Ltd", "Renewable energy solutions"),
    ("Creative Studios", "Design and branding agency"),
];

const CATEGORIES: [&str; 5] = ["Technology", "Marketing", "Software", "Renewable", "Design"];

const TAGS: [&str; 4] = ["Priority", "Urgent", "Review", "Completed"];

/// (first, last, email, business index, tag index)
const PEOPLE: [(&str, &str, &str, usize, usize); 3] = [
    ("John", "Doe", "john.doe@example.com", 0, 0),
    ("Jane", "Smith", "jane.smith@example.com", 1, 1),
    ("Michael", "Brown", "michael.brown@example.com", 2, 2),
];

/// Business index -> category indexes
const BUSINESS_CATEGORIES: [&[usize]; 4] = [&[0, 1], &[2], &[3], &[4]];

struct SeedTask {
    title: &'static str,
    description: &'static str,
    status: TaskStatus,
    due_date: Option<&'static str>,
    business: usize,
    person: Option<usize>,
}

const TASKS: [SeedTask; 5] = [
    SeedTask {
        title: "Review quarterly report",
        description: "Analyze Q4 financial data and prepare summary",
        status: TaskStatus::Pending,
        due_date: Some("2026-03-01"),
        business: 0,
        person: Some(0),
    },
    SeedTask {
        title: "Update website",
        description: "Redesign landing page with new branding",
        status: TaskStatus::Pending,
        due_date: Some("2026-02-15"),
        business: 1,
        person: Some(1),
    },
    SeedTask {
        title: "Solar panel installation",
        description: "Coordinate installation at new facility",
        status: TaskStatus::Pending,
        due_date: Some("2026-04-01"),
        business: 2,
        person: Some(2),
    },
    SeedTask {
        title: "Brand guidelines",
        description: "Create comprehensive brand style guide",
        status: TaskStatus::Completed,
        due_date: None,
        business: 3,
        person: None,
    },
    SeedTask {
        title: "Client presentation",
        description: "Prepare slides for upcoming investor meeting",
        status: TaskStatus::Pending,
        due_date: Some("2026-02-20"),
        business: 0,
        person: Some(0),
    },
];

pub async fn handle(pool: &SqlitePool, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = Database::new(pool.clone());

    if !db.businesses().list().await?.is_empty() {
        return output_success(
            &output_format,
            "Database already has data, skipping seed",
            Some(json!({ "seeded": false })),
        );
    }

    let counts = seed(&db).await?;
    output_success(
        &output_format,
        "Seeding completed",
        Some(json!({ "seeded": true, "created": counts })),
    )
}

/// Load the sample dataset through the repositories. Returns per-entity counts.
pub async fn seed(db: &Database) -> anyhow::Result<serde_json::Value> {
    let password_hash = hash_password_blocking(SEED_PASSWORD.to_string()).await?;
    for (email, name) in USERS {
        db.users().create(email, &password_hash, Some(name)).await?;
    }
    tracing::info!("Created {} users", USERS.len());

    let mut tag_ids = Vec::with_capacity(TAGS.len());
    for name in TAGS {
        let tag = db.tags().create(TagInput { name: Some(name.to_string()) }).await?;
        tag_ids.push(tag.tag.id);
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = db
            .categories()
            .create(CategoryInput { name: Some(name.to_string()) })
            .await?;
        category_ids.push(category.category.id);
    }

    let mut business_ids = Vec::with_capacity(BUSINESSES.len());
    for (index, (name, description)) in BUSINESSES.into_iter().enumerate() {
        let business = db
            .businesses()
            .create(CreateBusiness {
                name: Some(name.to_string()),
                description: Some(description.to_string()),
                tag_ids: Some(vec![tag_ids[index].clone()]),
                category_ids: Some(
                    BUSINESS_CATEGORIES[index]
                        .iter()
                        .map(|&c| category_ids[c].clone())
                        .collect(),
                ),
            })
            .await?;
        business_ids.push(business.business.id);
    }

    let mut person_ids = Vec::with_capacity(PEOPLE.len());
    for (first_name, last_name, email, business, tag) in PEOPLE {
        let person = db
            .people()
            .create(CreatePerson {
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
                email: Some(email.to_string()),
                business_id: Some(business_ids[business].clone()),
                tag_ids: Some(vec![tag_ids[tag].clone()]),
            })
            .await?;
        person_ids.push(person.person.id);
    }

    for task in &TASKS {
        db.tasks()
            .create(CreateTask {
                title: Some(task.title.to_string()),
                description: Some(task.description.to_string()),
                status: Some(task.status),
                due_date: task.due_date.map(str::to_string),
                business_id: Some(business_ids[task.business].clone()),
                person_id: task.person.map(|p| person_ids[p].clone()),
            })
            .await?;
    }
    tracing::info!("Seeding completed");

    Ok(json!({
        "users": USERS.len(),
        "businesses": business_ids.len(),
        "people": person_ids.len(),
        "categories": category_ids.len(),
        "tags": tag_ids.len(),
        "tasks": TASKS.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::TaskFilter;
    use crate::database::DatabaseManager;

    #[tokio::test]
    async fn seed_loads_linked_sample_data() {
        let db = Database::new(DatabaseManager::in_memory().await.unwrap());
        let counts = seed(&db).await.unwrap();
        assert_eq!(counts["tasks"], 5);

        let businesses = db.businesses().list().await.unwrap();
        let acme = businesses
            .iter()
            .find(|b| b.business.name == "Acme Corp")
            .unwrap();
        let count = acme.count.unwrap();
        assert_eq!((count.people, count.tags, count.categories), (1, 1, 2));

        let completed = db
            .tasks()
            .list(TaskFilter { status: Some(TaskStatus::Completed) })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].task.title, "Brand guidelines");
        assert!(completed[0].person.is_none());
    }
}
