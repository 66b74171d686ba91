pub mod auth;
pub mod response;

pub use auth::{
    clear_session_cookie, extract_cookie, session_auth_middleware, session_cookie, AuthUser,
};
pub use response::{ApiResponse, ApiResult, Message};
