// handlers/public/mod.rs - Public handlers (no session required)
//
// Everything here runs without the session gate and must validate its own input.

pub mod auth;
