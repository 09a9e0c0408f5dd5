//! Human-readable renderings of a dependency graph.
pub mod dot;
pub mod trace;
