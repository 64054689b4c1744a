/// Error handling for the API server
///
/// A unified error type that maps the core's error taxonomy to HTTP
/// responses. Handlers return `Result<T, ApiError>` which converts to the
/// appropriate status code:
///
/// - validation failures and registration conflicts → 400
/// - invalid credentials / missing identity → 401
/// - CSRF mismatch → 403
/// - lockout → 429 with a `Retry-After` header
/// - store outage → 503
/// - everything internal → 500 with no detail leaked to the client

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use minilms_shared::auth::service::{AuthError, FieldError};
use minilms_shared::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): malformed input or registration conflict
    BadRequest(String),

    /// Bad request (400): field-level validation failures
    ValidationError(Vec<FieldError>),

    /// Unauthorized (401): bad credentials or no logged-in session
    Unauthorized(String),

    /// Forbidden (403): CSRF token missing or wrong
    Forbidden(String),

    /// Too many requests (429): username temporarily locked out
    RateLimited { retry_after: u64, message: String },

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503): credential store unreachable
    ServiceUnavailable(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::RateLimited { message, .. } => write!(f, "Rate limited: {}", message),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Handle rate limit separately to add the Retry-After header
        if let ApiError::RateLimited {
            retry_after,
            message,
        } = &self
        {
            let body = Json(ErrorResponse {
                error: "rate_limited".to_string(),
                message: message.clone(),
                details: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            response.headers_mut().insert(
                "Retry-After",
                axum::http::HeaderValue::from_str(&retry_after.to_string())
                    .unwrap_or_else(|_| axum::http::HeaderValue::from_static("60")),
            );
            return response;
        }

        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::RateLimited { message, .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limited", message, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert auth core errors to API errors
///
/// The status mapping lives in this one conversion; handlers just use `?`.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(details) => ApiError::ValidationError(details),
            AuthError::AlreadyExists => ApiError::BadRequest("user already exists".to_string()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::CsrfMismatch => {
                ApiError::Forbidden("CSRF token missing or invalid".to_string())
            }
            AuthError::RateLimited { retry_after_secs } => ApiError::RateLimited {
                retry_after: retry_after_secs,
                message: format!(
                    "Too many failed attempts. Try again in {} seconds",
                    retry_after_secs
                ),
            },
            AuthError::Unauthorized => ApiError::Unauthorized("Not logged in".to_string()),
            AuthError::Store(err) => ApiError::ServiceUnavailable(err.to_string()),
            AuthError::Password(err) => {
                ApiError::InternalError(format!("Password operation failed: {}", err))
            }
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert store errors to API errors (used by the listing endpoint, which
/// talks to the store directly)
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => ApiError::BadRequest("user already exists".to_string()),
            StoreError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}
