pub mod auth;
pub mod response;

pub use auth::{require_session, Session, SESSION_COOKIE};
pub use response::{envelope_bare_errors, ApiResponse, ApiResult};
