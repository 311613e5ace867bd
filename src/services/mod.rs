pub mod api;
pub mod chart;
pub mod error;
pub mod logger;
