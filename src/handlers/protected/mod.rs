// handlers/protected/mod.rs - Handlers behind the session gate
//
// `session_auth_middleware` runs first on every route here, so a handler is only reached
// with a verified `AuthUser` in the request extensions.

pub mod auth;
pub mod businesses;
pub mod categories;
pub mod people;
pub mod tags;
pub mod tasks;
