//! Structural queries over finished graphs.
pub mod telemetry;
pub mod topology;

pub use telemetry::GraphReport;
