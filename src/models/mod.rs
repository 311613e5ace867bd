pub mod chart;
pub mod config;
pub mod position;
pub mod ranking;
