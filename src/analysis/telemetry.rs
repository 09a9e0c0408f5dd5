use super::topology;
use crate::store::{DependencyGraph, TargetType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Shape statistics for a built graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub live_data_leaves: usize,
    /// Nodes read by more than one consumer.
    pub shared_nodes: usize,
    pub output_values: usize,
    pub terminal_outputs: usize,
    /// Longest producer-to-consumer chain, counted in nodes.
    pub depth: usize,
    pub nodes_by_target_type: BTreeMap<TargetType, usize>,
    pub nodes_by_function: BTreeMap<String, usize>,
}

impl GraphReport {
    pub fn analyze(graph: &DependencyGraph) -> Result<Self, String> {
        let order = topology::sort(graph)?;

        // Depth per node, filled in producer-first order.
        let mut depth = vec![0usize; graph.node_count()];
        for id in &order {
            let Some(node) = graph.node(*id) else { continue };
            let deepest_input = node.input_nodes().iter().map(|i| depth[i.index()]).max().unwrap_or(0);
            depth[id.index()] = deepest_input + 1;
        }

        let mut report = Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            output_values: graph.output_values().len(),
            terminal_outputs: graph.terminal_output_values().len(),
            depth: depth.into_iter().max().unwrap_or(0),
            ..Default::default()
        };

        for node in graph.nodes() {
            if node.is_live_data_source() {
                report.live_data_leaves += 1;
            }
            if node.dependent_nodes().len() > 1 {
                report.shared_nodes += 1;
            }
            *report.nodes_by_target_type.entry(node.target().target_type()).or_insert(0) += 1;
            if let Some(function) = node.function_id() {
                *report.nodes_by_function.entry(function.to_string()).or_insert(0) += 1;
            }
        }

        Ok(report)
    }
}
