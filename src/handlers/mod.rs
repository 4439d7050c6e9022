// handlers/mod.rs - Two-tier handler layout
//
// Public (no session) → Protected (session token required, organization scoped)

pub mod protected;
pub mod public;
