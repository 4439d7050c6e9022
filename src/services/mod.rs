// services/mod.rs - Business rules above the repositories
//
// user_service: signup, login, profile edits, role changes and deletes
// validation:   snapshot checks (uniqueness, last admin) and input shape checks

pub mod user_service;
pub mod validation;

use std::collections::HashMap;

use crate::auth::{AuthError, JwtError, PasswordError};
use crate::database::DatabaseError;

pub use user_service::{NewUser, ProfileUpdate, UserService};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.into());
        ServiceError::Validation {
            message: "Invalid request data".to_string(),
            field_errors,
        }
    }

    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    pub fn admin_required() -> Self {
        ServiceError::Forbidden("Admin role required".to_string())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(message) => ServiceError::NotFound(message),
            DatabaseError::Conflict(field) => {
                ServiceError::Conflict(format!("A record with this {} already exists", field))
            }
            DatabaseError::LastAdmin(_) => ServiceError::Conflict(LAST_ADMIN_MESSAGE.to_string()),
            other => ServiceError::Database(other),
        }
    }
}

pub(crate) const LAST_ADMIN_MESSAGE: &str = "Organization must keep at least one admin";
