//! Dependency graph construction for a financial analytics engine.
//!
//! Given a target and the values wanted on it, `GraphBuilder` resolves each
//! value to a producing function or a live-data feed, recursively, and
//! returns a `DependencyGraph`: an acyclic arena of bound nodes that share
//! any node able to satisfy more than one requirement.

pub mod analysis;
pub mod compute;
pub mod display;
pub mod function;
pub mod store;

#[cfg(feature = "python")]
pub mod bindings;
#[cfg(feature = "logging")]
pub mod logging;

pub use compute::{BuildError, BuilderConfig, ConfigError, GraphBuilder, TargetRequest, UnsatisfiableReason};
pub use function::{
    DeclaredFunction, DefaultFunctionResolver, FixedLiveDataAvailabilityProvider, FunctionDefinition, FunctionRef,
    FunctionRepository, FunctionResolver, InputTarget, LiveDataAvailabilityProvider, LiveDataSourcingFunction,
    MapTargetResolver, ResolutionContext, TargetResolver,
};
pub use store::{
    ComputationTarget, DependencyGraph, DependencyNode, InvariantViolation, NodeId, NodeState, TargetSpecification,
    TargetType, UniqueId, ValueProperties, ValueRequirement, ValueSpecification,
};

// --- Python Module Definition ---
/// Defines the `_core` extension module. The leading underscore marks it as
/// the compiled half of a Python package.
#[cfg(feature = "python")]
#[pyo3::pymodule]
fn _core(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::types::PyModuleMethods;
    m.add_class::<bindings::python::PyFunctionRepository>()?;
    m.add_class::<bindings::python::PyGraphBuilder>()?;
    m.add_class::<bindings::python::PyDependencyGraph>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
