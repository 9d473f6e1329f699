// src/server/error.rs
//! API error responses (RFC 7807 problem details)
//!
//! Validation failures carry their field-level messages under `errors`:
//!
//! ```json
//! {
//!   "type": "urn:recipe-api:error:validation",
//!   "title": "Bad Request",
//!   "status": 400,
//!   "detail": "Validation failed",
//!   "errors": { "password": ["Ensure this field has at least 6 characters."] }
//! }
//! ```

use crate::error::{Error, FieldErrors};
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Error type URI
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable title
    pub title: String,
    /// HTTP status code
    pub status: u16,
    /// Detailed description
    pub detail: String,
    /// Field-level validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(error_type: &str, title: &str, status: u16, detail: &str) -> Self {
        Self {
            error_type: format!("urn:recipe-api:error:{}", error_type),
            title: title.to_string(),
            status,
            detail: detail.to_string(),
            errors: None,
        }
    }

    /// 400 with field-level messages
    pub fn validation(errors: FieldErrors) -> Self {
        let mut err = Self::new("validation", "Bad Request", 400, "Validation failed");
        err.errors = Some(errors);
        err
    }

    pub fn bad_request(detail: &str) -> Self {
        Self::new("bad_request", "Bad Request", 400, detail)
    }

    pub fn unauthorized(detail: &str) -> Self {
        Self::new("unauthorized", "Unauthorized", 401, detail)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("not_found", "Not Found", 404, &format!("{} not found", resource))
    }

    pub fn internal(detail: &str) -> Self {
        Self::new("internal", "Internal Error", 500, detail)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ValidationError(errors) => ApiError::validation(errors),
            // Never say which credential was wrong
            Error::AuthenticationError(_) => ApiError::validation(FieldErrors::single(
                FieldErrors::NON_FIELD,
                "Unable to authenticate with provided credentials.",
            )),
            Error::NotFoundError(resource) => ApiError::not_found(&resource),
            other => {
                error!("Request failed: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(&self),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
        }

        response
    }
}
