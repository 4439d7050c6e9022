// error.rs - The single mapping from failures to HTTP responses
//
// Every layer below returns its own error enum; handlers convert into
// `ApiError`, which owns the status code, the stable `code` string and the
// `{"status":"error","error":{…}}` envelope.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::services::ServiceError;

const GENERIC_FAILURE: &str = "An error occurred while processing your request";

/// Client-facing error; the message is always safe to return
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    ValidationError {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    InvalidJson(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    RequestTimeout(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    InternalServerError(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            ApiError::RequestTimeout(_) => (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "code": self.classify().1,
            "message": self.to_string(),
        });

        if let ApiError::ValidationError { field_errors, .. } = self {
            if !field_errors.is_empty() {
                error["fields"] = json!(field_errors);
            }
        }

        json!({
            "status": "error",
            "error": error,
        })
    }

    /// Envelope for a status produced below the handlers (router, timeout,
    /// body limit), which arrives with an empty body
    pub fn from_status(status: StatusCode) -> Option<Self> {
        let error = match status {
            StatusCode::NOT_FOUND => ApiError::NotFound("Route not found".to_string()),
            StatusCode::METHOD_NOT_ALLOWED => {
                ApiError::MethodNotAllowed("Method not allowed on this route".to_string())
            }
            StatusCode::REQUEST_TIMEOUT => ApiError::RequestTimeout("Request timed out".to_string()),
            StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge("Request body too large".to_string())
            }
            _ => return None,
        };
        Some(error)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::BadCredentials => ApiError::Unauthorized("Invalid email or password".to_string()),
            // Callers log the kind; clients get one message for every session failure
            _ => ApiError::Unauthorized("Authentication required".to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(field) => {
                ApiError::Conflict(format!("A record with this {} already exists", field))
            }
            DatabaseError::LastAdmin(_) => ApiError::Conflict(crate::services::LAST_ADMIN_MESSAGE.to_string()),
            DatabaseError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal(GENERIC_FAILURE)
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation {
                message,
                field_errors,
            } => ApiError::ValidationError {
                message,
                field_errors,
            },
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Auth(auth) => auth.into(),
            ServiceError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                ApiError::internal(GENERIC_FAILURE)
            }
            ServiceError::Token(e) => {
                tracing::error!("Token signing error: {}", e);
                ApiError::internal(GENERIC_FAILURE)
            }
            ServiceError::Database(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge("Request body too large".to_string());
        }
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::BadRequest("Expected Content-Type: application/json".to_string())
            }
            other => ApiError::InvalidJson(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_shape() {
        let body = ApiError::not_found("Thing not found").to_json();

        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Thing not found");
        assert!(body["error"].get("fields").is_none());
    }

    #[test]
    fn validation_errors_carry_fields() {
        let err: ApiError = ServiceError::validation("email", "Must be a valid email address").into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["error"]["fields"]["email"], "Must be a valid email address");
    }

    #[test]
    fn expired_and_invalid_tokens_look_the_same() {
        let expired = ApiError::from(AuthError::Expired).to_json();
        let invalid = ApiError::from(AuthError::Invalid).to_json();

        assert_eq!(expired, invalid);
    }

    #[test]
    fn store_errors_map_to_status() {
        assert_eq!(
            ApiError::from(DatabaseError::Conflict("email")).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DatabaseError::LastAdmin(uuid::Uuid::new_v4())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DatabaseError::Unavailable("pool timed out".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let hidden = ApiError::from(DatabaseError::QueryError("syntax error at or near".into()));
        assert_eq!(hidden.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!hidden.to_string().contains("syntax"));
    }
}
