//! Shared types and models for the POS inventory platform
//!
//! This crate contains types shared between the backend, the POS frontend
//! (via WASM), and other components of the system. It also holds the pure
//! stock and order arithmetic so every side agrees on totals and limits.

pub mod cart;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payment;
pub mod reconcile;
pub mod types;
pub mod validation;

pub use error::*;
pub use ledger::{MovementDirection, StockLedger, StockLevel, StockMovement};
pub use models::*;
pub use reconcile::{OrderPlan, PlannedLine, TransitionPlan};
pub use types::*;
pub use validation::*;
