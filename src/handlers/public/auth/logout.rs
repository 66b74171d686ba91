// handlers/public/auth/logout.rs - POST /auth/logout handler

use axum::{extract::State, http::header::SET_COOKIE, response::IntoResponse};

use crate::middleware::{clear_session_cookie, ApiResponse, Message};
use crate::state::AppState;

/// Drop the session cookie. Tokens are stateless, so a copied token stays usable until
/// it expires.
pub async fn logout_post(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_session_cookie(&state.config.security))],
        ApiResponse::success(Message::new("Logged out")),
    )
}
