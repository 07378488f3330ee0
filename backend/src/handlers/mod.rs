//! HTTP handlers

pub mod activity;
pub mod catalog;
pub mod health;
pub mod order;
pub mod supply;

pub use activity::*;
pub use catalog::*;
pub use health::*;
pub use order::*;
pub use supply::*;
