use clap::Subcommand;
use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::password::hash_password_blocking;
use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::models::UserProfile;
use crate::database::Database;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a login account")]
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },

    #[command(about = "List login accounts")]
    List,
}

pub async fn handle(
    cmd: UserCommands,
    pool: &SqlitePool,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let db = Database::new(pool.clone());

    match cmd {
        UserCommands::Add {
            email,
            password,
            name,
        } => {
            if password.is_empty() {
                anyhow::bail!("Password must not be empty");
            }
            let password_hash = hash_password_blocking(password).await?;
            let user = db
                .users()
                .create(&email, &password_hash, name.as_deref())
                .await?;

            output_success(
                &output_format,
                &format!("Created user {} ({})", user.email, user.id),
                Some(json!({ "user": UserProfile::from(&user) })),
            )
        }
        UserCommands::List => {
            let users = db.users().list().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users");
            }

            match output_format {
                OutputFormat::Json => {
                    let users: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<30} {:<20} {}", "ID", "EMAIL", "NAME", "CREATED");
                    println!("{}", "-".repeat(100));
                    for user in &users {
                        println!(
                            "{:<38} {:<30} {:<20} {}",
                            user.id,
                            user.email,
                            user.name.as_deref().unwrap_or("-"),
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
