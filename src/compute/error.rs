use crate::store::{InvariantViolation, TargetSpecification, ValueRequirement};
use std::fmt;
use thiserror::Error;

/// Why a requirement could not be satisfied. Both causes are domain-level
/// and are reported through the same `BuildError::Unsatisfiable` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsatisfiableReason {
    /// Neither live data nor any registered function can produce the value.
    NoFunction,
    /// The requirement's target reference could not be resolved.
    UnresolvedTarget,
}

impl fmt::Display for UnsatisfiableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsatisfiableReason::NoFunction => f.write_str("no function or live data produces it"),
            UnsatisfiableReason::UnresolvedTarget => f.write_str("target could not be resolved"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Unsatisfiable requirement '{requirement}' on {target}: {reason}")]
    Unsatisfiable {
        requirement: ValueRequirement,
        target: TargetSpecification,
        reason: UnsatisfiableReason,
    },

    /// A requirement was re-entered while its own resolution was in progress.
    #[error("Dependency cycle on '{requirement}' (path: {})", format_path(.path))]
    Cycle {
        requirement: ValueRequirement,
        path: Vec<ValueRequirement>,
    },

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl BuildError {
    pub(crate) fn unsatisfiable(requirement: &ValueRequirement, reason: UnsatisfiableReason) -> Self {
        BuildError::Unsatisfiable {
            requirement: requirement.clone(),
            target: requirement.target.clone(),
            reason,
        }
    }

    /// True when the function library, feeds or targets cannot support the
    /// request. False for defects in the builder or a resolver.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, BuildError::Unsatisfiable { .. } | BuildError::Cycle { .. })
    }
}

fn format_path(path: &[ValueRequirement]) -> String {
    path.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(" -> ")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}
