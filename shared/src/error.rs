//! Typed failures of the order engine
//!
//! All of these are per-request and recoverable: the caller either fixes
//! the input or retries. None of them leaves partial writes behind.

use thiserror::Error;
use validator::ValidationErrors;

use crate::models::OrderStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Malformed or missing input, detected before any mutation
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Not enough stock for item: {item_name} (requested {requested}, available {available})")]
    InsufficientStock {
        item_name: String,
        requested: i32,
        available: i32,
    },

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Cannot edit cancelled orders")]
    EditForbidden,

    #[error("{0} not found")]
    NotFound(String),
}

impl OrderError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        OrderError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationErrors> for OrderError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.keys().copied().collect();
        fields.sort_unstable();

        match fields.first() {
            Some(field) => {
                let message = field_errors[field]
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                OrderError::validation(*field, message)
            }
            None => OrderError::validation("input", "Invalid input"),
        }
    }
}
