use crate::store::{DependencyGraph, NodeId, ValueSpecification};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashSet, VecDeque};

/// Orders the graph so every producer appears before its consumers.
///
/// DFS post-order over input edges. Disconnected nodes are visited too, in
/// insertion order. A cycle is reported as an error naming one node on it.
pub fn sort(graph: &DependencyGraph) -> Result<Vec<NodeId>, String> {
    let count = graph.node_count();
    let mut order = Vec::with_capacity(count);
    let mut state = vec![VisitState::None; count];

    for i in 0..count {
        if state[i] == VisitState::None {
            visit(NodeId::new(i), graph, &mut state, &mut order)?;
        }
    }

    Ok(order)
}

#[derive(Clone, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting,
    Visited,
}

fn visit(
    node: NodeId,
    graph: &DependencyGraph,
    state: &mut Vec<VisitState>,
    order: &mut Vec<NodeId>,
) -> Result<(), String> {
    let idx = node.index();

    match state[idx] {
        VisitState::Visited => return Ok(()),
        VisitState::Visiting => return Err(format!("Cycle detected involving node {}", node)),
        VisitState::None => state[idx] = VisitState::Visiting,
    }

    if let Some(n) = graph.node(node) {
        for &input in n.input_nodes() {
            visit(input, graph, state, order)?;
        }
    }

    state[idx] = VisitState::Visited;
    order.push(node);
    Ok(())
}

/// Every node that transitively consumes an output of `start_nodes`,
/// the start nodes included.
pub fn downstream_from(graph: &DependencyGraph, start_nodes: &[NodeId]) -> HashSet<NodeId> {
    walk(start_nodes, |id| graph.node(id).map(|n| n.dependent_nodes()).unwrap_or(&[]))
}

/// Every node `start_nodes` transitively read from, the start nodes included.
pub fn upstream_from(graph: &DependencyGraph, start_nodes: &[NodeId]) -> HashSet<NodeId> {
    walk(start_nodes, |id| graph.node(id).map(|n| n.input_nodes()).unwrap_or(&[]))
}

fn walk<'g>(start_nodes: &[NodeId], next: impl Fn(NodeId) -> &'g [NodeId]) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_nodes.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.insert(node) {
            queue.extend(next(node).iter().copied());
        }
    }
    visited
}

/// Copies the graph into petgraph, edges running producer -> consumer and
/// weighted with the specification carried. `NodeIndex(i)` is `NodeId(i)`.
///
/// One edge per consumed specification, so a producer feeding two values to
/// the same consumer yields two parallel edges where
/// `DependencyGraph::edge_count` counts one.
pub fn to_petgraph(graph: &DependencyGraph) -> DiGraph<NodeId, ValueSpecification> {
    let spec_edges = graph.nodes().iter().map(|n| n.input_values().len()).sum();
    let mut out = DiGraph::with_capacity(graph.node_count(), spec_edges);
    for node in graph.nodes() {
        out.add_node(node.id());
    }
    for consumer in graph.nodes() {
        for spec in consumer.input_values() {
            let producer = consumer.input_nodes().iter().copied().find(|&p| {
                graph.node(p).is_some_and(|n| n.output_values().contains(spec))
            });
            if let Some(producer) = producer {
                out.add_edge(NodeIndex::new(producer.index()), NodeIndex::new(consumer.id().index()), spec.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::builder::tests::{builder_with, curve, market, needs_curve, req, security};
    use crate::compute::BuilderConfig;
    use rstest::rstest;

    /// PV and Delta on X, both reading one live curve leaf.
    fn diamond() -> DependencyGraph {
        let x = security("X");
        builder_with(vec![needs_curve("F1", "PresentValue"), needs_curve("F3", "Delta")], vec![curve()], BuilderConfig::default())
            .add_target(&x, &[req("PresentValue", &x), req("Delta", &x)])
            .unwrap()
    }

    #[test]
    fn test_sort_puts_producers_first() {
        let graph = diamond();
        let order = sort(&graph).expect("Sort failed");
        assert_eq!(order.len(), 3);

        let pos = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        for node in graph.nodes() {
            for &input in node.input_nodes() {
                assert!(pos(input) < pos(node.id()));
            }
        }
    }

    #[rstest]
    #[case::from_leaf(1, 3)]
    #[case::from_root(0, 1)]
    fn test_downstream_from(#[case] start: usize, #[case] expected: usize) {
        let graph = diamond();
        let leaf = graph.leaf_nodes()[0];
        assert_eq!(leaf, NodeId(1));
        assert_eq!(downstream_from(&graph, &[NodeId::new(start)]).len(), expected);
    }

    #[test]
    fn test_upstream_from_root() {
        let graph = diamond();
        let root = graph.root_nodes()[0];
        let upstream = upstream_from(&graph, &[root]);
        assert_eq!(upstream.len(), 2);
        assert!(upstream.contains(&NodeId(1)));
    }

    #[test]
    fn test_petgraph_copy_matches_edges() {
        let graph = diamond();
        let pg = to_petgraph(&graph);
        assert_eq!(pg.node_count(), 3);
        assert_eq!(pg.edge_count(), graph.edge_count());
        assert!(!petgraph::algo::is_cyclic_directed(&pg));
        assert!(pg.edge_weights().all(|spec| spec.value_name == "DiscountCurve"));
    }

    #[test]
    fn test_two_values_from_one_producer_become_parallel_edges() {
        use crate::function::{DeclaredFunction, FunctionRef, InputTarget};
        use crate::store::TargetType;
        use std::sync::Arc;

        let x = security("X");
        let curves: FunctionRef = Arc::new(
            DeclaredFunction::new("Curves", TargetType::Primitive).producing("DiscountCurve").producing("ForwardCurve"),
        );
        let pv: FunctionRef = Arc::new(
            DeclaredFunction::new("F1", TargetType::Security)
                .producing("PresentValue")
                .requiring("DiscountCurve", InputTarget::Fixed(market()))
                .requiring("ForwardCurve", InputTarget::Fixed(market())),
        );
        let graph = builder_with(vec![pv, curves], vec![], BuilderConfig::default())
            .add_target(&x, &[req("PresentValue", &x)])
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let pg = to_petgraph(&graph);
        assert_eq!(pg.edge_count(), 2);
        assert!(pg.edge_weights().all(|spec| spec.function_id == "Curves"));
    }
}
