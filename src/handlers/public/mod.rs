// handlers/public/mod.rs - Public handlers (no session required)
//
// Health, organization listing/creation and token acquisition. These routes
// never pass through the session middleware.

pub mod auth;
pub mod organization;
pub mod root;
