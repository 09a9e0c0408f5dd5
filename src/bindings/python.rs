use crate::analysis::topology;
use crate::compute::{BuildError, BuilderConfig, GraphBuilder};
use crate::display::{dot, trace};
use crate::function::{
    DeclaredFunction, DefaultFunctionResolver, FixedLiveDataAvailabilityProvider, FunctionRepository, InputTarget,
    MapTargetResolver, TargetResolver,
};
use crate::store::{
    ComputationTarget, DependencyGraph, NodeId, Position, Security, TargetSpecification, TargetType, UniqueId,
    ValueRequirement,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::sync::Arc;

fn parse_target(spec: &str) -> PyResult<TargetSpecification> {
    spec.parse().map_err(PyValueError::new_err)
}

fn to_node_id(raw: usize) -> PyResult<NodeId> {
    NodeId::try_from(raw).map_err(|_| PyValueError::new_err("Invalid Node ID"))
}

fn build_error(err: BuildError) -> PyErr {
    if err.is_unsatisfiable() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

#[pyclass(name = "_FunctionRepository")]
#[derive(Debug, Clone, Default)]
pub struct PyFunctionRepository {
    inner: FunctionRepository,
}

#[pymethods]
impl PyFunctionRepository {
    #[new]
    pub fn new() -> Self { Self::default() }

    /// `inputs` pairs a value name with an optional `TYPE~id` target; `None`
    /// means the function's own target.
    #[pyo3(signature = (unique_id, target_type, outputs, inputs=Vec::new(), live_inputs=Vec::new(), priority=0))]
    pub fn add_function(
        &mut self,
        unique_id: String,
        target_type: &str,
        outputs: Vec<String>,
        inputs: Vec<(String, Option<String>)>,
        live_inputs: Vec<String>,
        priority: i32,
    ) -> PyResult<()> {
        let target_type: TargetType = target_type.parse().map_err(PyValueError::new_err)?;
        let mut function = DeclaredFunction::new(unique_id, target_type);
        for output in outputs {
            function = function.producing(output);
        }
        for (value_name, target) in inputs {
            let target = match target {
                Some(spec) => InputTarget::Fixed(parse_target(&spec)?),
                None => InputTarget::SameTarget,
            };
            function = function.requiring(value_name, target);
        }
        for value_name in live_inputs {
            function = function.requiring_live_data(value_name, InputTarget::SameTarget);
        }
        self.inner.add_function_with_priority(Arc::new(function), priority);
        Ok(())
    }

    pub fn __len__(&self) -> usize { self.inner.len() }
}

#[pyclass(name = "_GraphBuilder")]
#[derive(Debug, Clone)]
pub struct PyGraphBuilder {
    config: BuilderConfig,
    repository: FunctionRepository,
    targets: MapTargetResolver,
    live_data: FixedLiveDataAvailabilityProvider,
}

#[pymethods]
impl PyGraphBuilder {
    #[new]
    #[pyo3(signature = (repository, calculation_configuration="Default".to_string(), prune_unused_outputs=false))]
    pub fn new(repository: &PyFunctionRepository, calculation_configuration: String, prune_unused_outputs: bool) -> Self {
        Self {
            config: BuilderConfig::new(calculation_configuration).with_pruning(prune_unused_outputs),
            repository: repository.inner.clone(),
            targets: MapTargetResolver::new(),
            live_data: FixedLiveDataAvailabilityProvider::new(),
        }
    }

    pub fn load_config(&mut self, path: &str) -> PyResult<()> {
        self.config = BuilderConfig::from_path(path).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(())
    }

    pub fn add_primitive(&mut self, id: String) {
        self.targets.add_target(ComputationTarget::primitive(id));
    }

    pub fn add_security(&mut self, id: String, security_type: String, name: String) {
        self.targets.add_target(ComputationTarget::Security(Arc::new(Security {
            id: UniqueId::new(id),
            security_type,
            name,
        })));
    }

    pub fn add_position(&mut self, id: String, security_id: String, quantity: f64) {
        self.targets.add_target(ComputationTarget::Position(Arc::new(Position {
            id: UniqueId::new(id),
            security: UniqueId::new(security_id),
            quantity,
        })));
    }

    pub fn add_live_data(&mut self, value_name: String, target: &str) -> PyResult<()> {
        self.live_data.add(ValueRequirement::new(value_name, parse_target(target)?));
        Ok(())
    }

    pub fn build(&self, target: &str, value_names: Vec<String>) -> PyResult<PyDependencyGraph> {
        let spec = parse_target(target)?;
        let resolved = self.targets.resolve(&spec)
            .ok_or_else(|| PyValueError::new_err(format!("Unknown target {}", spec)))?;
        let requirements: Vec<ValueRequirement> = value_names.into_iter()
            .map(|name| ValueRequirement::new(name, spec.clone()))
            .collect();

        let builder = GraphBuilder::new(
            self.config.clone(),
            DefaultFunctionResolver::new(self.repository.clone()),
            self.targets.clone(),
            self.live_data.clone(),
        );
        builder.add_target(&resolved, &requirements)
            .map(|inner| PyDependencyGraph { inner })
            .map_err(build_error)
    }
}

#[pyclass(name = "_DependencyGraph")]
#[derive(Debug, Clone)]
pub struct PyDependencyGraph {
    inner: DependencyGraph,
}

impl PyDependencyGraph {
    fn checked(&self, node_id: usize) -> PyResult<&crate::store::DependencyNode> {
        self.inner.node(to_node_id(node_id)?)
            .ok_or_else(|| PyValueError::new_err("Invalid Node ID"))
    }
}

#[pymethods]
impl PyDependencyGraph {
    pub fn node_count(&self) -> usize { self.inner.node_count() }

    pub fn calculation_configuration(&self) -> String {
        self.inner.calculation_configuration().to_string()
    }

    pub fn node_function(&self, node_id: usize) -> PyResult<Option<String>> {
        Ok(self.checked(node_id)?.function_id().map(str::to_string))
    }

    pub fn node_inputs(&self, node_id: usize) -> PyResult<Vec<usize>> {
        Ok(self.checked(node_id)?.input_nodes().iter().map(|id| id.index()).collect())
    }

    pub fn terminal_outputs(&self) -> Vec<String> {
        self.inner.terminal_output_values().iter().map(|s| s.to_string()).collect()
    }

    pub fn required_live_data(&self) -> Vec<String> {
        self.inner.all_required_live_data().iter().map(|r| r.to_string()).collect()
    }

    pub fn prune_unused_outputs(&mut self) -> usize {
        self.inner.prune_unused_outputs()
    }

    pub fn topological_order(&self) -> PyResult<Vec<usize>> {
        topology::sort(&self.inner)
            .map(|v| v.into_iter().map(|id| id.index()).collect())
            .map_err(PyRuntimeError::new_err)
    }

    pub fn trace_node(&self, node_id: usize) -> PyResult<String> {
        Ok(trace::format_trace(&self.inner, to_node_id(node_id)?))
    }

    pub fn to_dot(&self) -> String { dot::to_dot(&self.inner) }

    pub fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}
