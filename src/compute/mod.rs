//! Builds dependency graphs: the resolve-and-wire recursion, its errors and
//! its configuration.
pub mod batch;
pub mod builder;
pub mod config;
pub mod error;

pub use batch::TargetRequest;
pub use builder::GraphBuilder;
pub use config::BuilderConfig;
pub use error::{BuildError, ConfigError, UnsatisfiableReason};
