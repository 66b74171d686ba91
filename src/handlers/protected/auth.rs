// handlers/protected/auth.rs - GET /auth/me handler

use crate::middleware::{ApiResponse, AuthUser};

/// The user behind the current session
pub async fn me_get(user: AuthUser) -> ApiResponse<AuthUser> {
    ApiResponse::success(user)
}
