use crate::analysis::topology;
use crate::store::DependencyGraph;
use petgraph::dot::Dot;

/// Graphviz rendering. Nodes are labelled with function and target, edges
/// with the value name they carry.
pub fn to_dot(graph: &DependencyGraph) -> String {
    let labelled = topology::to_petgraph(graph).map(
        |_, id| match graph.node(*id) {
            Some(node) => format!(
                "{} {} on {}",
                id,
                node.function_id().unwrap_or("<unbound>"),
                node.target().specification()
            ),
            None => id.to_string(),
        },
        |_, spec| spec.value_name.clone(),
    );
    format!("{}", Dot::with_config(&labelled, &[]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::builder::tests::{builder_with, curve, needs_curve, req, security};
    use crate::compute::BuilderConfig;

    #[test]
    fn test_dot_lists_nodes_and_edges() {
        let x = security("X");
        let graph = builder_with(vec![needs_curve("F1", "PresentValue")], vec![curve()], BuilderConfig::default())
            .add_target(&x, &[req("PresentValue", &x)])
            .unwrap();
        let dot = to_dot(&graph);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("F1"));
        assert!(dot.contains("LiveDataSourcingFunction"));
        assert!(dot.contains("1 -> 0"));
        assert!(dot.contains("DiscountCurve"));
    }
}
