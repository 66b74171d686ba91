// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{credential, start_session};
use crate::auth::password::verify_password_blocking;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Check credentials and set the session cookie.
///
/// Unknown email and wrong password produce the same 401 "Invalid credentials"; the
/// unknown-email path still pays for one hash verification.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let (Some(email), Some(password)) = (
        credential(payload.email.as_deref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation_error("Email and password are required"));
    };

    let user = state.db.users().find_by_email(email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let matched = verify_password_blocking(password.to_string(), stored_hash).await?;

    let user = match user {
        Some(user) if matched => user,
        _ => {
            tracing::warn!("Rejected login attempt");
            return Err(ApiError::invalid_credentials());
        }
    };

    tracing::info!(user_id = %user.id, "User logged in");
    let cookie = start_session(&state, &user)?;
    Ok((cookie, ApiResponse::success(UserProfile::from(&user))))
}
