//! Business logic services for the POS inventory server

pub mod activity;
pub mod category;
pub mod dashboard;
pub mod item;
pub mod order;
pub mod stock;
pub mod supply;

pub use activity::ActivityRecorder;
pub use dashboard::DashboardService;
