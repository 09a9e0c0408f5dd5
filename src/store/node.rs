//! Defines the `DependencyNode`: one bound computation step in the graph.
//!
//! A node moves through a one-directional lifecycle:
//! `Unbound -> Bound -> Wired -> Finalized`. Adjacency is stored as arena
//! indices; dependents are non-owning back-references kept in step with
//! inputs by `DependencyGraph::add_input_edge`.

use super::types::{ComputationTarget, NodeId, TargetSpecification, TargetType};
use super::value::{ValueRequirement, ValueSpecification};
use crate::function::FunctionRef;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    /// Target fixed, no function attached yet.
    Unbound,
    /// Function attached and its target type checked.
    Bound,
    /// Input edges attached (possibly none).
    Wired,
    /// Terminal outputs flagged; eligible for pruning.
    Finalized,
}

/// Programmer-level errors: these indicate a defect in the builder or in a
/// function resolver, never a legitimately missing computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Node {node} is already bound to function '{existing}'")]
    AlreadyBound { node: NodeId, existing: String },

    #[error("Function '{function}' computes over {declared} targets but node {node} targets {actual}")]
    TargetTypeMismatch {
        node: NodeId,
        function: String,
        declared: TargetType,
        actual: TargetType,
    },

    #[error("Requirement '{requirement}' does not refer to build target {target}")]
    RequirementTargetMismatch {
        requirement: ValueRequirement,
        target: TargetSpecification,
    },

    #[error("Node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("Node {node} cannot move from {from:?} to {to:?}")]
    IllegalTransition { node: NodeId, from: NodeState, to: NodeState },

    #[error("'{spec}' is not an output of node {node}")]
    NotAnOutput { node: NodeId, spec: ValueSpecification },
}

#[derive(Debug, Clone)]
pub struct DependencyNode {
    id: NodeId,
    target: ComputationTarget,
    function: Option<FunctionRef>,
    state: NodeState,
    input_values: BTreeSet<ValueSpecification>,
    output_values: BTreeSet<ValueSpecification>,
    terminal_outputs: BTreeSet<ValueSpecification>,
    // Abstract input requirement -> the specification that satisfied it.
    input_mapping: Vec<(ValueRequirement, ValueSpecification)>,
    input_nodes: SmallVec<[NodeId; 4]>,
    dependent_nodes: SmallVec<[NodeId; 4]>,
}

impl DependencyNode {
    pub(crate) fn new(id: NodeId, target: ComputationTarget) -> Self {
        Self {
            id,
            target,
            function: None,
            state: NodeState::Unbound,
            input_values: BTreeSet::new(),
            output_values: BTreeSet::new(),
            terminal_outputs: BTreeSet::new(),
            input_mapping: Vec::new(),
            input_nodes: SmallVec::new(),
            dependent_nodes: SmallVec::new(),
        }
    }

    // --- Transitions ---

    /// Attaches `function` and adopts its results as this node's outputs.
    pub(crate) fn bind_function(&mut self, function: FunctionRef) -> Result<(), InvariantViolation> {
        if let Some(existing) = &self.function {
            return Err(InvariantViolation::AlreadyBound {
                node: self.id,
                existing: existing.unique_id().to_string(),
            });
        }
        let actual = self.target.target_type();
        if function.target_type() != actual {
            return Err(InvariantViolation::TargetTypeMismatch {
                node: self.id,
                function: function.unique_id().to_string(),
                declared: function.target_type(),
                actual,
            });
        }
        self.output_values = function.results(&self.target).into_iter().collect();
        self.function = Some(function);
        self.state = NodeState::Bound;
        Ok(())
    }

    /// Adds an output the resolver promised beyond the function's plain results.
    pub(crate) fn ensure_output(&mut self, spec: ValueSpecification) {
        self.output_values.insert(spec);
    }

    pub(crate) fn record_input(
        &mut self,
        producer: NodeId,
        requirement: ValueRequirement,
        spec: ValueSpecification,
    ) -> Result<(), InvariantViolation> {
        self.transition(NodeState::Wired)?;
        if !self.input_nodes.contains(&producer) {
            self.input_nodes.push(producer);
        }
        self.input_values.insert(spec.clone());
        self.input_mapping.push((requirement, spec));
        Ok(())
    }

    pub(crate) fn add_dependent(&mut self, consumer: NodeId) {
        if !self.dependent_nodes.contains(&consumer) {
            self.dependent_nodes.push(consumer);
        }
    }

    pub(crate) fn mark_wired(&mut self) -> Result<(), InvariantViolation> {
        self.transition(NodeState::Wired)
    }

    pub(crate) fn mark_terminal(&mut self, spec: &ValueSpecification) -> Result<(), InvariantViolation> {
        if !matches!(self.state, NodeState::Wired | NodeState::Finalized) {
            return Err(InvariantViolation::IllegalTransition {
                node: self.id,
                from: self.state,
                to: NodeState::Finalized,
            });
        }
        if !self.output_values.contains(spec) {
            return Err(InvariantViolation::NotAnOutput { node: self.id, spec: spec.clone() });
        }
        self.terminal_outputs.insert(spec.clone());
        Ok(())
    }

    pub(crate) fn finalize(&mut self) -> Result<(), InvariantViolation> {
        self.transition(NodeState::Finalized)
    }

    pub(crate) fn remove_output(&mut self, spec: &ValueSpecification) -> bool {
        self.output_values.remove(spec)
    }

    // Moves forward only; re-entering the current state is a no-op.
    fn transition(&mut self, to: NodeState) -> Result<(), InvariantViolation> {
        let allowed = match (self.state, to) {
            (from, to) if from == to => true,
            (NodeState::Unbound, NodeState::Bound) => true,
            (NodeState::Bound, NodeState::Wired) => true,
            (NodeState::Wired, NodeState::Finalized) => true,
            _ => false,
        };
        if !allowed {
            return Err(InvariantViolation::IllegalTransition { node: self.id, from: self.state, to });
        }
        self.state = to;
        Ok(())
    }

    // --- Accessors ---

    pub fn id(&self) -> NodeId { self.id }
    pub fn target(&self) -> &ComputationTarget { &self.target }
    pub fn function(&self) -> Option<&FunctionRef> { self.function.as_ref() }
    pub fn function_id(&self) -> Option<&str> { self.function.as_ref().map(|f| f.unique_id()) }
    pub fn state(&self) -> NodeState { self.state }
    pub fn input_values(&self) -> &BTreeSet<ValueSpecification> { &self.input_values }
    pub fn output_values(&self) -> &BTreeSet<ValueSpecification> { &self.output_values }
    pub fn terminal_outputs(&self) -> &BTreeSet<ValueSpecification> { &self.terminal_outputs }
    pub fn input_nodes(&self) -> &[NodeId] { &self.input_nodes }
    pub fn dependent_nodes(&self) -> &[NodeId] { &self.dependent_nodes }
    pub fn input_requirements(&self) -> &[(ValueRequirement, ValueSpecification)] { &self.input_mapping }

    pub fn is_live_data_source(&self) -> bool {
        self.function.as_ref().is_some_and(|f| f.is_live_data_sourcing())
    }

    pub fn resolve_input(&self, requirement: &ValueRequirement) -> Option<&ValueSpecification> {
        self.input_values.iter().find(|spec| requirement.is_satisfied_by(spec))
    }

    pub fn resolve_output(&self, requirement: &ValueRequirement) -> Option<&ValueSpecification> {
        self.output_values.iter().find(|spec| requirement.is_satisfied_by(spec))
    }

    /// Feed values the bound function reads directly. Distinct from the node
    /// itself being a live-data leaf.
    pub fn required_live_data(&self) -> Vec<ValueRequirement> {
        self.function.as_ref()
            .map(|f| f.required_live_data(&self.target))
            .unwrap_or_default()
    }
}
