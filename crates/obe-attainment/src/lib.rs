pub mod attainment;
pub mod config;
pub mod error;
pub mod telemetry;
