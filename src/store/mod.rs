//! The arena-backed data model: targets, requirements, specifications,
//! dependency nodes and the graph that owns them.
pub mod graph;
pub mod node;
pub mod types;
pub mod value;

pub use graph::{DependencyGraph, GraphSnapshot, NodeSnapshot};
pub use node::{DependencyNode, InvariantViolation, NodeState};
pub use types::{
    ComputationTarget, NodeId, PortfolioNode, Position, Security, TargetSpecification, TargetType, UniqueId,
};
pub use value::{ValueProperties, ValueRequirement, ValueSpecification};
