//! The vocabulary nodes communicate in: what is wanted (`ValueRequirement`)
//! and what will actually be produced (`ValueSpecification`).

use super::types::TargetSpecification;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Ordered property bag: property name to the set of permitted values.
///
/// On a requirement this acts as a constraint; an empty value set means
/// "any value, but the property must be present". On a specification the
/// sets are the concrete values the producer promises.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueProperties(BTreeMap<String, BTreeSet<String>>);

impl ValueProperties {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(name.into()).or_default().insert(value.into());
        self
    }

    pub fn with_any(mut self, name: impl Into<String>) -> Self {
        self.0.entry(name.into()).or_default();
        self
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> { self.0.get(name) }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    /// True when `properties` meets every constraint held in `self`.
    pub fn is_satisfied_by(&self, properties: &ValueProperties) -> bool {
        self.0.iter().all(|(name, wanted)| match properties.0.get(name) {
            None => false,
            Some(_) if wanted.is_empty() => true,
            Some(offered) => offered.iter().any(|v| wanted.contains(v)),
        })
    }

    /// Merges `other` into `self`, unioning value sets per property.
    pub fn union(&mut self, other: &ValueProperties) {
        for (name, values) in &other.0 {
            self.0.entry(name.clone()).or_default().extend(values.iter().cloned());
        }
    }
}

impl fmt::Display for ValueProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        let parts: Vec<String> = self.0.iter()
            .map(|(k, v)| {
                if v.is_empty() { k.clone() } else { format!("{}={}", k, v.iter().cloned().collect::<Vec<_>>().join("|")) }
            })
            .collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}

/// An abstract request for a named value on a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueRequirement {
    pub value_name: String,
    pub target: TargetSpecification,
    pub constraints: ValueProperties,
}

impl ValueRequirement {
    pub fn new(value_name: impl Into<String>, target: TargetSpecification) -> Self {
        Self { value_name: value_name.into(), target, constraints: ValueProperties::default() }
    }

    pub fn with_constraints(mut self, constraints: ValueProperties) -> Self {
        self.constraints = constraints;
        self
    }

    /// Whether `spec` names the same value on the same target and carries
    /// properties meeting this requirement's constraints.
    pub fn is_satisfied_by(&self, spec: &ValueSpecification) -> bool {
        self.value_name == spec.value_name
            && self.target == spec.target
            && self.constraints.is_satisfied_by(&spec.properties)
    }
}

impl fmt::Display for ValueRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} on {}", self.value_name, self.constraints, self.target)
    }
}

/// A concrete, resolved promise of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueSpecification {
    pub value_name: String,
    pub target: TargetSpecification,
    pub function_id: String,
    pub properties: ValueProperties,
}

impl ValueSpecification {
    pub fn new(value_name: impl Into<String>, target: TargetSpecification, function_id: impl Into<String>) -> Self {
        Self {
            value_name: value_name.into(),
            target,
            function_id: function_id.into(),
            properties: ValueProperties::default(),
        }
    }

    /// A specification echoing `requirement`, promising exactly its constraints.
    pub fn from_requirement(requirement: &ValueRequirement, function_id: impl Into<String>) -> Self {
        Self {
            value_name: requirement.value_name.clone(),
            target: requirement.target.clone(),
            function_id: function_id.into(),
            properties: requirement.constraints.clone(),
        }
    }

    pub fn with_properties(mut self, properties: ValueProperties) -> Self {
        self.properties = properties;
        self
    }

    /// The bare requirement this specification answers.
    pub fn to_requirement(&self) -> ValueRequirement {
        ValueRequirement::new(self.value_name.clone(), self.target.clone())
    }
}

impl fmt::Display for ValueSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} on {} via {}", self.value_name, self.properties, self.target, self.function_id)
    }
}
