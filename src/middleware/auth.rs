use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::COOKIE, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The user behind the current session, inserted by [`session_auth_middleware`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Gate for every protected route: reads the session cookie, verifies it and resolves
/// the user. Any failure ends the request with 401 before a handler runs.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_cookie(request.headers(), &state.config.security.cookie_name);
    let user = state
        .sessions
        .verify(token.as_deref(), &state.db.users())
        .await?;

    tracing::debug!(user_id = %user.id, "Session verified");
    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

/// Value of the named cookie from any `Cookie` header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a fresh session token
pub fn session_cookie(security: &SecurityConfig, token: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        security.cookie_name, token, max_age_seconds
    );
    if security.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub fn clear_session_cookie(security: &SecurityConfig) -> String {
    session_cookie(security, "", 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    #[test]
    fn finds_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; auth-token=abc.def.ghi; lang=en"));
        assert_eq!(extract_cookie(&headers, "auth-token").as_deref(), Some("abc.def.ghi"));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("auth-token="));
        assert_eq!(extract_cookie(&headers, "auth-token"), None);
    }

    #[test]
    fn cookie_attributes_follow_config() {
        let mut security = AppConfig::development().security;
        let dev = session_cookie(&security, "tok", 604800);
        assert_eq!(dev, "auth-token=tok; HttpOnly; Path=/; SameSite=Lax; Max-Age=604800");

        security.secure_cookie = true;
        assert!(session_cookie(&security, "tok", 60).ends_with("; Secure"));
        assert!(clear_session_cookie(&security).starts_with("auth-token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"));
    }
}
