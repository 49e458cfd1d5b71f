//! API error types with HTTP response mapping.
//!
//! ## Error Flow
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► ApiError ──► HTTP status + JSON body {"error": msg}
//! DbError ─────────┘
//! ```
//!
//! Domain failures (not found, insufficient stock, duplicates) map to their
//! documented status codes; anything unexpected becomes a generic 500 after
//! the underlying transaction has already rolled back - partial state never
//! reaches the client.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use emporia_core::{CoreError, OrderStatus, ValidationError};
use emporia_db::DbError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Malformed or invalid request (400).
    #[error("{0}")]
    BadRequest(String),

    /// Requested quantity exceeds available stock (400).
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Duplicate SKU / email / username (400).
    #[error("{0}")]
    Conflict(String),

    /// Order status transition not permitted by the state machine (409).
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403).
    #[error("{0}")]
    Forbidden(String),

    /// Transient failure, safe to retry (503). Used for transaction
    /// timeouts - the transaction was rolled back, nothing committed.
    #[error("{0}")]
    Unavailable(String),

    /// Unexpected internal failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a NotFound error naming the entity and its id.
    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{entity} with ID {id} not found"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::InsufficientStock { .. } | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Do not leak internals through 500 responses
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({ "error": message });

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::InsufficientStock {
                name,
                available,
                requested,
            } => ApiError::InsufficientStock {
                name,
                available,
                requested,
            },
            CoreError::InvalidStatusTransition { from, to } => {
                ApiError::InvalidTransition { from, to }
            }
            CoreError::Validation(v) => ApiError::BadRequest(v.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            DbError::PoolExhausted | DbError::TransactionFailed(_) => {
                ApiError::Unavailable(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
