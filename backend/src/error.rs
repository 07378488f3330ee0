//! Error handling for the POS inventory server
//!
//! Provides consistent JSON error responses. Internal identifiers and
//! database details are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::OrderError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Order engine errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Edit forbidden: {0}")]
    EditForbidden(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation { field, message } => AppError::Validation { field, message },
            e @ OrderError::InsufficientStock { .. } => AppError::InsufficientStock(e.to_string()),
            OrderError::AlreadyCancelled => AppError::AlreadyCancelled,
            e @ OrderError::InvalidTransition { .. } => AppError::InvalidStateTransition(e.to_string()),
            e @ OrderError::EditForbidden => AppError::EditForbidden(e.to_string()),
            OrderError::NotFound(resource) => AppError::NotFound(resource),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        OrderError::from(errors).into()
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

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                ),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone()).with_field(field),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()).with_field(resource),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INSUFFICIENT_STOCK", msg.clone()).with_field("items"),
            ),
            AppError::AlreadyCancelled => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("ALREADY_CANCELLED", "Order is already cancelled").with_field("status"),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()).with_field("status"),
            ),
            AppError::EditForbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("EDIT_FORBIDDEN", msg.clone()),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred, please retry"),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::OrderStatus;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_order_errors_map_to_statuses() {
        assert_eq!(
            status_of(OrderError::validation("items", "An order needs at least one item").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                OrderError::InsufficientStock {
                    item_name: "Latte".to_string(),
                    requested: 3,
                    available: 1,
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(OrderError::AlreadyCancelled.into()), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_of(
                OrderError::InvalidTransition {
                    from: OrderStatus::Completed,
                    to: OrderStatus::Completed,
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(OrderError::EditForbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(OrderError::NotFound("Order".to_string()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_insufficient_stock_message_names_the_item() {
        let err: AppError = OrderError::InsufficientStock {
            item_name: "Latte".to_string(),
            requested: 3,
            available: 1,
        }
        .into();
        match err {
            AppError::InsufficientStock(msg) => {
                assert!(msg.contains("Latte"));
                assert!(msg.contains("requested 3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_other_statuses() {
        assert_eq!(status_of(AppError::InsufficientPermissions), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::Unauthorized("Missing token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Conflict {
                resource: "item".to_string(),
                message: "in use".to_string(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(anyhow::anyhow!("boom").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
