//! The node store for one build: an arena of `DependencyNode`s in insertion
//! order plus an index of every specification any node produces.

use super::node::{DependencyNode, InvariantViolation, NodeState};
use super::types::{ComputationTarget, NodeId, TargetSpecification, TargetType};
use super::value::{ValueRequirement, ValueSpecification};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    calculation_configuration: String,
    nodes: Vec<DependencyNode>,
    output_index: BTreeSet<ValueSpecification>,
    // Lookup acceleration for the memo check; ids kept in insertion order.
    producers_by_name: HashMap<String, SmallVec<[NodeId; 2]>>,
}

impl DependencyGraph {
    pub fn new(calculation_configuration: impl Into<String>) -> Self {
        Self {
            calculation_configuration: calculation_configuration.into(),
            ..Default::default()
        }
    }

    pub fn calculation_configuration(&self) -> &str { &self.calculation_configuration }

    // --- Construction (builder only) ---

    /// An unbound node whose id is the next arena slot.
    pub(crate) fn new_node(&self, target: ComputationTarget) -> DependencyNode {
        DependencyNode::new(NodeId::new(self.nodes.len()), target)
    }

    /// Appends `node` and unions its outputs into the output index.
    pub(crate) fn add_node(&mut self, node: DependencyNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        debug_assert_eq!(node.id(), id, "node must be created by new_node on this graph");
        self.nodes.push(node);
        self.index_outputs(id);
        id
    }

    /// Re-indexes a node's outputs after they changed.
    pub(crate) fn index_outputs(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        for spec in node.output_values() {
            self.output_index.insert(spec.clone());
            let producers = self.producers_by_name.entry(spec.value_name.clone()).or_default();
            if !producers.contains(&id) {
                producers.push(id);
            }
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut DependencyNode, InvariantViolation> {
        self.nodes.get_mut(id.index()).ok_or(InvariantViolation::UnknownNode(id))
    }

    /// Attaches `producer` as an input of `consumer` and registers `consumer`
    /// as a dependent of `producer`. Either both sides change or neither does.
    pub(crate) fn add_input_edge(
        &mut self,
        consumer: NodeId,
        producer: NodeId,
        requirement: ValueRequirement,
        spec: ValueSpecification,
    ) -> Result<(), InvariantViolation> {
        if producer.index() >= self.nodes.len() {
            return Err(InvariantViolation::UnknownNode(producer));
        }
        self.node_mut(consumer)?.record_input(producer, requirement, spec)?;
        self.nodes[producer.index()].add_dependent(consumer);
        Ok(())
    }

    pub(crate) fn mark_terminal(&mut self, id: NodeId, spec: &ValueSpecification) -> Result<(), InvariantViolation> {
        self.node_mut(id)?.mark_terminal(spec)
    }

    /// Moves every node to `Finalized`.
    pub(crate) fn finalize(&mut self) -> Result<(), InvariantViolation> {
        for node in &mut self.nodes {
            if node.state() != NodeState::Finalized {
                node.finalize()?;
            }
        }
        Ok(())
    }

    // --- Queries ---

    /// First node, in insertion order, with an output satisfying `requirement`.
    pub fn get_node_producing(&self, requirement: &ValueRequirement) -> Option<(NodeId, &ValueSpecification)> {
        let candidates = self.producers_by_name.get(&requirement.value_name)?;
        candidates.iter().find_map(|&id| {
            self.nodes[id.index()].resolve_output(requirement).map(|spec| (id, spec))
        })
    }

    /// Every node with an output satisfying `requirement`, in insertion order.
    pub fn nodes_producing<'g>(
        &'g self,
        requirement: &'g ValueRequirement,
    ) -> impl Iterator<Item = (NodeId, &'g ValueSpecification)> + 'g {
        self.producers_by_name
            .get(&requirement.value_name)
            .into_iter()
            .flatten()
            .filter_map(move |&id| {
                self.nodes[id.index()].resolve_output(requirement).map(|spec| (id, spec))
            })
    }

    /// Drops every non-terminal output that no dependent consumes.
    /// Returns the number of outputs removed.
    pub fn prune_unused_outputs(&mut self) -> usize {
        let mut removals: Vec<(NodeId, ValueSpecification)> = Vec::new();
        for node in &self.nodes {
            for spec in node.output_values() {
                if node.terminal_outputs().contains(spec) {
                    continue;
                }
                let consumed = node.dependent_nodes().iter()
                    .any(|d| self.nodes[d.index()].input_values().contains(spec));
                if !consumed {
                    removals.push((node.id(), spec.clone()));
                }
            }
        }

        for (id, spec) in &removals {
            self.nodes[id.index()].remove_output(spec);
        }
        if !removals.is_empty() {
            self.rebuild_index();
        }
        tracing::debug!(removed = removals.len(), "pruned unused outputs");
        removals.len()
    }

    fn rebuild_index(&mut self) {
        self.output_index.clear();
        self.producers_by_name.clear();
        for i in 0..self.nodes.len() {
            self.index_outputs(NodeId::new(i));
        }
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    pub fn nodes(&self) -> &[DependencyNode] { &self.nodes }
    pub fn node(&self, id: NodeId) -> Option<&DependencyNode> { self.nodes.get(id.index()) }

    pub fn nodes_for_target_type(&self, target_type: TargetType) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.iter().filter(move |n| n.target().target_type() == target_type)
    }

    pub fn output_values(&self) -> &BTreeSet<ValueSpecification> { &self.output_index }

    pub fn terminal_output_values(&self) -> BTreeSet<ValueSpecification> {
        self.nodes.iter().flat_map(|n| n.terminal_outputs().iter().cloned()).collect()
    }

    /// Everything this graph needs from external feeds: the outputs of live-data
    /// leaves plus the raw inputs computed nodes read directly.
    pub fn all_required_live_data(&self) -> BTreeSet<ValueRequirement> {
        let mut out = BTreeSet::new();
        for node in &self.nodes {
            if node.is_live_data_source() {
                out.extend(node.output_values().iter().map(|s| s.to_requirement()));
            } else {
                out.extend(node.required_live_data());
            }
        }
        out
    }

    /// Nodes nothing else consumes.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.dependent_nodes().is_empty()).map(|n| n.id()).collect()
    }

    /// Nodes with no inputs.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.input_nodes().is_empty()).map(|n| n.id()).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.input_nodes().len()).sum()
    }

    // --- Diagnostics ---

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            calculation_configuration: self.calculation_configuration.clone(),
            nodes: self.nodes.iter().map(|n| NodeSnapshot {
                id: n.id(),
                target: n.target().specification(),
                function: n.function_id().map(str::to_string),
                state: n.state(),
                input_nodes: n.input_nodes().to_vec(),
                input_values: n.input_values().iter().cloned().collect(),
                output_values: n.output_values().iter().cloned().collect(),
                terminal_outputs: n.terminal_outputs().iter().cloned().collect(),
            }).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

/// Serializable view of a finished graph, for dumps and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub calculation_configuration: String,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub target: TargetSpecification,
    pub function: Option<String>,
    pub state: NodeState,
    pub input_nodes: Vec<NodeId>,
    pub input_values: Vec<ValueSpecification>,
    pub output_values: Vec<ValueSpecification>,
    pub terminal_outputs: Vec<ValueSpecification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{DeclaredFunction, FunctionRef, InputTarget, LiveDataSourcingFunction};
    use std::sync::Arc;

    fn req(name: &str) -> ValueRequirement {
        ValueRequirement::new(name, TargetSpecification::primitive("P"))
    }

    fn add_bound(graph: &mut DependencyGraph, function: FunctionRef) -> NodeId {
        let mut node = graph.new_node(ComputationTarget::primitive("P"));
        node.bind_function(function).unwrap();
        graph.add_node(node)
    }

    /// Builds: leaf(A, B) <- consumer(C) with consumer reading only A.
    fn two_level() -> (DependencyGraph, NodeId, NodeId) {
        let mut graph = DependencyGraph::new("Default");
        let leaf = add_bound(&mut graph, Arc::new(
            DeclaredFunction::new("leaf", TargetType::Primitive).producing("A").producing("B"),
        ));
        let consumer = add_bound(&mut graph, Arc::new(
            DeclaredFunction::new("consumer", TargetType::Primitive)
                .producing("C")
                .requiring("A", InputTarget::SameTarget),
        ));
        let spec_a = graph.node(leaf).unwrap().resolve_output(&req("A")).cloned().unwrap();
        graph.node_mut(leaf).unwrap().mark_wired().unwrap();
        graph.add_input_edge(consumer, leaf, req("A"), spec_a).unwrap();
        (graph, leaf, consumer)
    }

    #[test]
    fn test_edges_are_paired() {
        let (graph, leaf, consumer) = two_level();
        assert_eq!(graph.node(consumer).unwrap().input_nodes(), &[leaf]);
        assert_eq!(graph.node(leaf).unwrap().dependent_nodes(), &[consumer]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.root_nodes(), vec![consumer]);
        assert_eq!(graph.leaf_nodes(), vec![leaf]);
    }

    #[test]
    fn test_edge_to_unknown_node_leaves_graph_untouched() {
        let (mut graph, leaf, _) = two_level();
        let spec = ValueSpecification::new("A", TargetSpecification::primitive("P"), "leaf");
        let err = graph.add_input_edge(NodeId(99), leaf, req("A"), spec).unwrap_err();
        assert_eq!(err, InvariantViolation::UnknownNode(NodeId(99)));
        assert_eq!(graph.node(leaf).unwrap().dependent_nodes().len(), 1);
    }

    #[test]
    fn test_get_node_producing_respects_insertion_order() {
        let (graph, leaf, consumer) = two_level();
        assert_eq!(graph.get_node_producing(&req("A")).map(|(id, _)| id), Some(leaf));
        assert_eq!(graph.get_node_producing(&req("C")).map(|(id, _)| id), Some(consumer));
        assert!(graph.get_node_producing(&req("Z")).is_none());
        assert_eq!(graph.output_values().len(), 3);
    }

    #[test]
    fn test_prune_keeps_terminal_and_consumed_outputs() {
        let (mut graph, leaf, consumer) = two_level();
        graph.node_mut(consumer).unwrap().mark_wired().unwrap();
        let spec_c = graph.node(consumer).unwrap().resolve_output(&req("C")).cloned().unwrap();
        graph.mark_terminal(consumer, &spec_c).unwrap();
        graph.finalize().unwrap();

        assert_eq!(graph.prune_unused_outputs(), 1);

        let leaf_node = graph.node(leaf).unwrap();
        assert!(leaf_node.resolve_output(&req("A")).is_some());
        assert!(leaf_node.resolve_output(&req("B")).is_none());
        assert!(graph.node(consumer).unwrap().output_values().contains(&spec_c));
        assert!(graph.get_node_producing(&req("B")).is_none());
        assert_eq!(graph.output_values().len(), 2);

        // A second pass has nothing left to remove.
        assert_eq!(graph.prune_unused_outputs(), 0);
    }

    #[test]
    fn test_required_live_data_collects_leaves_and_direct_reads() {
        let mut graph = DependencyGraph::new("Default");
        let curve = ValueRequirement::new("DiscountCurve", TargetSpecification::primitive("P"));
        add_bound(&mut graph, Arc::new(LiveDataSourcingFunction::new(&curve)));
        add_bound(&mut graph, Arc::new(
            DeclaredFunction::new("pv", TargetType::Primitive)
                .producing("PresentValue")
                .requiring_live_data("Spot", InputTarget::SameTarget),
        ));
        let live = graph.all_required_live_data();
        assert_eq!(live.len(), 2);
        assert!(live.contains(&curve));
        assert!(live.contains(&req("Spot")));
    }

    #[test]
    fn test_snapshot_serializes() {
        let (graph, _, _) = two_level();
        let json = graph.to_json().unwrap();
        let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, graph.snapshot());
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.nodes[1].function.as_deref(), Some("consumer"));
    }
}
