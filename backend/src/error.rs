//! Error handling for the Stock Ledger & Payment Reconciliation Engine
//!
//! Validation errors are raised before any write and surfaced to the
//! caller unchanged; concurrency conflicts are retryable with the same
//! inputs; datastore failures are fatal to the current request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Engine errors
    #[error("Unknown item or store")]
    UnknownItemOrStore { item_id: Uuid, store_id: Uuid },

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Allocation mismatch: {0}")]
    AllocationMismatch(String),

    #[error("Transaction {0} has already been reversed")]
    AlreadyReversed(Uuid),

    /// Lock contention on a position or document row; the caller may
    /// retry with the same inputs.
    #[error("Concurrent modification detected, retry the operation")]
    ConcurrencyConflict,

    // Datastore errors
    #[error("Datastore unavailable")]
    PersistenceFailure(#[source] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Serialization failures, deadlocks, and lock timeouts are
        // retry-safe; everything else is a datastore failure.
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if matches!(code.as_ref(), "40001" | "40P01" | "55P03") {
                    return AppError::ConcurrencyConflict;
                }
            }
        }
        AppError::PersistenceFailure(err)
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::UnknownItemOrStore { item_id, store_id } => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "UNKNOWN_ITEM_OR_STORE".to_string(),
                    message: format!(
                        "No item {} or store {} is known to the ledger",
                        item_id, store_id
                    ),
                    field: None,
                },
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::AllocationMismatch(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "ALLOCATION_MISMATCH".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::AlreadyReversed(id) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_REVERSED".to_string(),
                    message: format!("Transaction {} has already been reversed", id),
                    field: None,
                },
            ),
            AppError::ConcurrencyConflict => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONCURRENCY_CONFLICT".to_string(),
                    message: "Concurrent modification detected, retry the operation".to_string(),
                    field: None,
                },
            ),
            AppError::PersistenceFailure(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "PERSISTENCE_FAILURE".to_string(),
                    message: "The datastore is unavailable".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
