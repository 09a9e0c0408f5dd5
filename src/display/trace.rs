use crate::store::{DependencyGraph, DependencyNode, NodeId};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the inputs of `target` as an indented tree, producers below
/// consumers. Nodes reached a second time are printed as a back-reference.
pub fn format_trace(graph: &DependencyGraph, target: NodeId) -> String {
    let mut tracer = Tracer {
        graph,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    match graph.node(target) {
        Some(node) => {
            let _ = writeln!(tracer.output, "DEPENDENCY TRACE for node {} on {}:", target, node.target().specification());
            let _ = writeln!(tracer.output, "--------------------------------------------------");
            tracer.trace_node(target, 1, "");
        }
        None => {
            let _ = writeln!(tracer.output, "Error: Invalid Node ID {}", target);
        }
    }
    tracer.output
}

struct Tracer<'a> {
    graph: &'a DependencyGraph,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, node_id: NodeId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&node_id) {
            let _ = writeln!(self.output, "{}-> (Ref to L{}) {}", prefix, first_seen, node_id);
            return;
        }
        self.visited_at_level.insert(node_id, level);

        let Some(node) = self.graph.node(node_id) else {
            let _ = writeln!(self.output, "{}[L{}] <missing {}>", prefix, level, node_id);
            return;
        };
        let _ = writeln!(self.output, "{}[L{}] {}", prefix, level, describe(node));
        self.recurse_children(prefix, node.input_nodes(), level);
    }

    fn recurse_children(&mut self, prefix: &str, children: &[NodeId], level: usize) {
        let stem = self.build_child_stem(prefix);
        for (i, &child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(child, level + 1, &full_prefix);
        }
    }

    fn build_child_stem(&self, current_prefix: &str) -> String {
        current_prefix.replace("`--", "   ").replace("|--", "|  ")
    }
}

// "F1 on SECURITY~X => Delta, PresentValue*"; `*` marks terminal outputs.
fn describe(node: &DependencyNode) -> String {
    let outputs = node.output_values().iter()
        .map(|spec| {
            let mark = if node.terminal_outputs().contains(spec) { "*" } else { "" };
            format!("{}{}", spec.value_name, mark)
        })
        .collect::<Vec<_>>()
        .join(", ");
    let live = if node.is_live_data_source() { " [LIVE]" } else { "" };
    format!(
        "{} on {} => {}{}",
        node.function_id().unwrap_or("<unbound>"),
        node.target().specification(),
        outputs,
        live
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::builder::tests::{builder_with, curve, needs_curve, req, security};
    use crate::compute::BuilderConfig;
    use crate::function::{DeclaredFunction, FunctionRef, InputTarget};
    use crate::store::TargetType;
    use std::sync::Arc;

    #[test]
    fn test_trace_single_level() {
        let x = security("X");
        let graph = builder_with(vec![needs_curve("F1", "PresentValue")], vec![curve()], BuilderConfig::default())
            .add_target(&x, &[req("PresentValue", &x)])
            .unwrap();

        let expected = "\
DEPENDENCY TRACE for node #0 on SECURITY~X:
--------------------------------------------------
[L1] F1 on SECURITY~X => PresentValue*
`--[L2] LiveDataSourcingFunction on PRIMITIVE~USD => DiscountCurve [LIVE]
";
        assert_eq!(format_trace(&graph, NodeId(0)), expected);
    }

    #[test]
    fn test_shared_input_printed_once() {
        let x = security("X");
        let summary: FunctionRef = Arc::new(
            DeclaredFunction::new("Top", TargetType::Security)
                .producing("Summary")
                .requiring("PresentValue", InputTarget::SameTarget)
                .requiring("Delta", InputTarget::SameTarget),
        );
        let graph = builder_with(
            vec![summary, needs_curve("F1", "PresentValue"), needs_curve("F3", "Delta")],
            vec![curve()],
            BuilderConfig::default(),
        )
        .add_target(&x, &[req("Summary", &x)])
        .unwrap();

        let expected = "\
DEPENDENCY TRACE for node #0 on SECURITY~X:
--------------------------------------------------
[L1] Top on SECURITY~X => Summary*
|--[L2] F1 on SECURITY~X => PresentValue
|  `--[L3] LiveDataSourcingFunction on PRIMITIVE~USD => DiscountCurve [LIVE]
`--[L2] F3 on SECURITY~X => Delta
   `---> (Ref to L3) #2
";
        assert_eq!(format_trace(&graph, NodeId(0)), expected);
    }

    #[test]
    fn test_invalid_node() {
        let graph = DependencyGraph::new("Default");
        assert_eq!(format_trace(&graph, NodeId(9)), "Error: Invalid Node ID #9\n");
    }
}
