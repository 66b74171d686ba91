// handlers/mod.rs - Two tiers: public routes and routes behind the session gate
pub mod protected;
pub mod public;
