// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{credential, start_session};
use crate::auth::password::hash_password_blocking;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Create an account and log it in.
///
/// 201 `{id, email, name}` with the session cookie; 400 when email or password is
/// missing; 409 when the email is taken.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let (Some(email), Some(password)) = (
        credential(payload.email.as_deref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation_error("Email and password are required"));
    };

    let password_hash = hash_password_blocking(password.to_string()).await?;
    let user = state
        .db
        .users()
        .create(email, &password_hash, payload.name.as_deref())
        .await?;

    tracing::info!(user_id = %user.id, "Registered user");
    let cookie = start_session(&state, &user)?;
    Ok((cookie, ApiResponse::created(UserProfile::from(&user))))
}
