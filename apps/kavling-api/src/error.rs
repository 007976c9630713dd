//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kavling                                │
//! │                                                                         │
//! │  Handler → spawn_blocking → repository                                  │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                     StoreError::kind() / CoreError::kind()              │
//! │                                  │                                      │
//! │          ┌──────────┬────────────┼────────────┬──────────────┐          │
//! │          ▼          ▼            ▼            ▼              ▼          │
//! │     Validation   NotFound     Conflict    Unavailable     Internal      │
//! │        400         404          409          503             500        │
//! │                                                                         │
//! │  Body: {"ok": false, "error": {"code": "CONFLICT", "message": "..."}}   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal errors are logged in full and answered with a generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kavling_core::ErrorKind;
use kavling_store::StoreError;
use serde::Serialize;
use tracing::error;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "ok": false,
///   "error": { "code": "NOT_FOUND", "message": "kpr not found: kpr_1" }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Overlap, duplicate, wrong status, already paid, ... (409)
    Conflict,

    /// Missing or wrong admin token (401)
    Unauthorized,

    /// Collections not loaded (503)
    StorageNotReady,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, message)
    }
}

/// Converts store (and wrapped domain) errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            ErrorKind::Validation => ApiError::validation(err.to_string()),
            ErrorKind::NotFound => ApiError::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, err.to_string()),
            ErrorKind::Conflict => ApiError::new(StatusCode::CONFLICT, ErrorCode::Conflict, err.to_string()),
            ErrorKind::Unavailable => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::StorageNotReady,
                "storage is not ready",
            ),
            ErrorKind::Internal => {
                // Log the actual error but return a generic message
                error!(error = %err, "Storage operation failed");
                ApiError::internal("storage operation failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(format!("invalid query: {}", rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    ok: bool,
    error: ErrorBody<'a>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            ok: false,
            error: ErrorBody {
                code: self.code,
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Success envelope: `{"ok": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub data: T,
}

/// Wraps `data` in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope { ok: true, data })
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;
