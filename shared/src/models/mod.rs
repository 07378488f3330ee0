//! Domain models for the POS inventory platform

mod activity;
mod catalog;
mod order;

pub use activity::*;
pub use catalog::*;
pub use order::*;
