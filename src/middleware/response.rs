// middleware/response.rs - Success envelope
//
// Handlers return `ApiResult<T>`; the payload lands under `data` next to
// `"status": "success"` and an optional human-readable `message`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: Option<String>,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    status: &'static str,
    data: &'a T,
    message: Option<&'a str>,
}

impl<T: Serialize> ApiResponse<T> {
    fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            data,
            message: None,
            status,
        }
    }

    pub fn success(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload; `data` serializes as null
    pub fn message_only(message: impl Into<String>) -> Self {
        ApiResponse::success(()).with_message(message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status: "success",
            data: &self.data,
            message: self.message.as_deref(),
        };

        // Serialize up front so a failing payload becomes an error envelope
        match serde_json::to_value(&envelope) {
            Ok(body) => (self.status, Json(body)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                ApiError::internal("Failed to format response").into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Error responses built outside the handlers (unmatched route, timeout,
/// body limit) come back without a body. Give them the error envelope and
/// keep their other headers, e.g. `Allow` on a 405.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let Some(error) = ApiError::from_status(status) else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let mut enveloped = error.into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            enveloped.headers_mut().append(name, value.clone());
        }
    }
    enveloped
}
