//! The contract a producing function exposes to the graph builder.

use crate::store::{ComputationTarget, TargetType, ValueRequirement, ValueSpecification};
use std::fmt::Debug;
use std::sync::Arc;

pub type FunctionRef = Arc<dyn FunctionDefinition>;

/// A function that can be bound to a dependency node.
///
/// Implementations are shared between builds (and threads), so they must be
/// immutable once registered.
pub trait FunctionDefinition: Debug + Send + Sync {
    fn unique_id(&self) -> &str;

    /// The tag of the targets this function computes over.
    fn target_type(&self) -> TargetType;

    fn can_apply_to(&self, target: &ComputationTarget) -> bool {
        target.target_type() == self.target_type()
    }

    /// Every value this function produces when applied to `target`.
    fn results(&self, target: &ComputationTarget) -> Vec<ValueSpecification>;

    /// The inputs one application of this function to `target` consumes.
    fn requirements(&self, target: &ComputationTarget) -> Vec<ValueRequirement>;

    /// Raw feed values the function reads directly, alongside its computed inputs.
    fn required_live_data(&self, _target: &ComputationTarget) -> Vec<ValueRequirement> {
        Vec::new()
    }

    fn is_live_data_sourcing(&self) -> bool {
        false
    }
}

/// Degenerate zero-input function standing in for an external feed.
#[derive(Debug, Clone)]
pub struct LiveDataSourcingFunction {
    target_type: TargetType,
    output: ValueSpecification,
}

impl LiveDataSourcingFunction {
    pub const UNIQUE_ID: &'static str = "LiveDataSourcingFunction";

    pub fn new(requirement: &ValueRequirement) -> Self {
        Self {
            target_type: requirement.target.target_type,
            output: ValueSpecification::from_requirement(requirement, Self::UNIQUE_ID),
        }
    }

    pub fn output(&self) -> &ValueSpecification { &self.output }
}

impl FunctionDefinition for LiveDataSourcingFunction {
    fn unique_id(&self) -> &str { Self::UNIQUE_ID }

    fn target_type(&self) -> TargetType { self.target_type }

    fn results(&self, _target: &ComputationTarget) -> Vec<ValueSpecification> {
        vec![self.output.clone()]
    }

    fn requirements(&self, _target: &ComputationTarget) -> Vec<ValueRequirement> {
        Vec::new()
    }

    fn is_live_data_sourcing(&self) -> bool { true }
}
