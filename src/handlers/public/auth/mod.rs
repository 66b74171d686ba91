// handlers/public/auth/mod.rs - Session acquisition and release
//
// These routes sit in front of the session gate: they are how a client gets (or drops)
// the auth cookie in the first place.

use axum::http::header::SET_COOKIE;
use axum::http::HeaderName;

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::session_cookie;
use crate::state::AppState;

pub mod login; // POST /auth/login
pub mod logout; // POST /auth/logout
pub mod register; // POST /auth/register

pub use login::login_post;
pub use logout::logout_post;
pub use register::register_post;

/// Issue a token for `user` and wrap it in a `Set-Cookie` header
pub(crate) fn start_session(
    state: &AppState,
    user: &User,
) -> Result<[(HeaderName, String); 1], ApiError> {
    let token = state.sessions.issue(&user.id)?;
    let cookie = session_cookie(&state.config.security, &token, state.sessions.ttl_seconds());
    Ok([(SET_COOKIE, cookie)])
}

/// Trimmed, non-empty value of a required credential field
pub(crate) fn credential(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
