//! The graph builder: resolves requested values into a DAG of bound nodes.
//!
//! Resolution is an ordinary synchronous recursion. For each requirement it
//! 1. reuses a node that already produces a satisfying output,
//! 2. otherwise creates a live-data leaf if the feed can supply it,
//! 3. otherwise asks the function resolver, failing the build on a miss,
//! 4. registers the new node before resolving its inputs,
//! 5. resolves and wires every input the bound function declares.

use super::config::BuilderConfig;
use super::error::{BuildError, UnsatisfiableReason};
use crate::display::trace;
use crate::function::{
    FunctionRef, FunctionResolver, LiveDataAvailabilityProvider, LiveDataSourcingFunction, ResolutionContext,
    TargetResolver,
};
use crate::store::{ComputationTarget, DependencyGraph, InvariantViolation, NodeId, ValueRequirement, ValueSpecification};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Builds dependency graphs against a fixed set of collaborators.
///
/// The builder holds no per-build state: every call to `add_target` or
/// `extend` works on its own graph, so one builder can serve many builds,
/// including concurrently (see `add_targets`).
#[derive(Clone)]
pub struct GraphBuilder {
    config: BuilderConfig,
    function_resolver: Arc<dyn FunctionResolver>,
    target_resolver: Arc<dyn TargetResolver>,
    live_data: Arc<dyn LiveDataAvailabilityProvider>,
}

impl GraphBuilder {
    pub fn new(
        config: BuilderConfig,
        function_resolver: impl FunctionResolver + 'static,
        target_resolver: impl TargetResolver + 'static,
        live_data: impl LiveDataAvailabilityProvider + 'static,
    ) -> Self {
        Self {
            config,
            function_resolver: Arc::new(function_resolver),
            target_resolver: Arc::new(target_resolver),
            live_data: Arc::new(live_data),
        }
    }

    pub fn config(&self) -> &BuilderConfig { &self.config }

    /// Resolves `requirements` on `target` into a fresh graph.
    ///
    /// Fails on the first requirement that cannot be satisfied; no partial
    /// graph is returned.
    pub fn add_target(
        &self,
        target: &ComputationTarget,
        requirements: &[ValueRequirement],
    ) -> Result<DependencyGraph, BuildError> {
        let graph = DependencyGraph::new(self.config.calculation_configuration.clone());
        self.build(graph, target, requirements)
    }

    /// Resolves further requirements on top of a previously built graph,
    /// reusing its nodes. `graph` itself is never modified.
    pub fn extend(
        &self,
        graph: &DependencyGraph,
        target: &ComputationTarget,
        requirements: &[ValueRequirement],
    ) -> Result<DependencyGraph, BuildError> {
        self.build(graph.clone(), target, requirements)
    }

    fn build(
        &self,
        graph: DependencyGraph,
        target: &ComputationTarget,
        requirements: &[ValueRequirement],
    ) -> Result<DependencyGraph, BuildError> {
        let target_spec = target.specification();
        let _span = tracing::debug_span!(
            "add_target",
            build_target = %target_spec,
            config = %self.config.calculation_configuration
        ).entered();

        if let Some(stray) = requirements.iter().find(|r| r.target != target_spec) {
            return Err(InvariantViolation::RequirementTargetMismatch {
                requirement: stray.clone(),
                target: target_spec,
            }.into());
        }

        let mut resolution = Resolution::new(self, graph);
        let mut terminals: Vec<(NodeId, ValueSpecification)> = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            terminals.push(resolution.resolve_requirement(target, requirement)?);
        }

        let mut graph = resolution.into_graph();
        for (node, spec) in &terminals {
            graph.mark_terminal(*node, spec)?;
        }
        graph.finalize()?;

        if self.config.prune_unused_outputs {
            graph.prune_unused_outputs();
        }
        if self.config.log_graph_trace {
            for (node, _) in &terminals {
                debug!("\n{}", trace::format_trace(&graph, *node));
            }
        }

        info!(nodes = graph.node_count(), requirements = requirements.len(), "dependency graph built");
        Ok(graph)
    }
}

/// Mutable state of one build. Dropped wholesale on failure.
struct Resolution<'b> {
    builder: &'b GraphBuilder,
    graph: DependencyGraph,
    // Requirements whose producing node is still having its inputs wired.
    stack: Vec<ValueRequirement>,
    stack_nodes: HashSet<NodeId>,
}

impl<'b> Resolution<'b> {
    fn new(builder: &'b GraphBuilder, graph: DependencyGraph) -> Self {
        Self { builder, graph, stack: Vec::new(), stack_nodes: HashSet::new() }
    }

    fn into_graph(self) -> DependencyGraph {
        self.graph
    }

    fn resolve_requirement(
        &mut self,
        target: &ComputationTarget,
        requirement: &ValueRequirement,
    ) -> Result<(NodeId, ValueSpecification), BuildError> {
        if self.stack.contains(requirement) {
            return Err(self.cycle(requirement));
        }

        // 1. Memo check. Nodes still wiring their inputs cannot be reused.
        let mut blocked = false;
        let mut reusable = None;
        for (id, spec) in self.graph.nodes_producing(requirement) {
            if self.stack_nodes.contains(&id) {
                blocked = true;
            } else {
                reusable = Some((id, spec.clone()));
                break;
            }
        }
        if let Some((id, spec)) = reusable {
            trace!(%requirement, node = %id, "reusing existing node");
            return Ok((id, spec));
        }
        if blocked {
            return Err(self.cycle(requirement));
        }

        // 2. Live-data shortcut.
        if self.builder.live_data.is_available(requirement) {
            let function = Arc::new(LiveDataSourcingFunction::new(requirement));
            let spec = function.output().clone();
            let mut node = self.graph.new_node(target.clone());
            node.bind_function(function)?;
            node.mark_wired()?;
            let id = self.graph.add_node(node);
            debug!(%requirement, node = %id, "sourced from live data");
            return Ok((id, spec));
        }

        // 3. Function resolution.
        let context = ResolutionContext { calculation_configuration: self.graph.calculation_configuration() };
        let Some((function, spec)) = self.builder.function_resolver.resolve(&context, target, requirement) else {
            debug!(%requirement, "no function can satisfy requirement");
            return Err(BuildError::unsatisfiable(requirement, UnsatisfiableReason::NoFunction));
        };

        // 4. Register before recursing so the node is visible to the memo check.
        let mut node = self.graph.new_node(target.clone());
        node.bind_function(function.clone())?;
        node.ensure_output(spec.clone());
        let id = self.graph.add_node(node);
        debug!(%requirement, node = %id, function = function.unique_id(), "bound function");

        // 5. Input wiring.
        self.stack.push(requirement.clone());
        self.stack_nodes.insert(id);
        let wired = self.wire_inputs(id, &function, target);
        self.stack.pop();
        self.stack_nodes.remove(&id);
        wired?;

        Ok((id, spec))
    }

    fn wire_inputs(
        &mut self,
        id: NodeId,
        function: &FunctionRef,
        target: &ComputationTarget,
    ) -> Result<(), BuildError> {
        for input in function.requirements(target) {
            let Some(input_target) = self.builder.target_resolver.resolve(&input.target) else {
                warn!(requirement = %input, "couldn't resolve target {}", input.target);
                return Err(BuildError::unsatisfiable(&input, UnsatisfiableReason::UnresolvedTarget));
            };
            let (producer, spec) = self.resolve_requirement(&input_target, &input)?;
            self.graph.add_input_edge(id, producer, input, spec)?;
        }
        self.graph.node_mut(id)?.mark_wired()?;
        Ok(())
    }

    fn cycle(&self, requirement: &ValueRequirement) -> BuildError {
        let mut path = self.stack.clone();
        path.push(requirement.clone());
        BuildError::Cycle { requirement: requirement.clone(), path }
    }
}
