//! A data-driven `FunctionDefinition`: outputs and inputs are declared up
//! front instead of being computed from the target. Used by the Python
//! facade and by configuration-driven function libraries.

use super::definition::FunctionDefinition;
use crate::store::{ComputationTarget, TargetSpecification, TargetType, ValueProperties, ValueRequirement, ValueSpecification};

/// Where a declared input lives relative to the target the function runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    /// The function's own target.
    SameTarget,
    /// A fixed target, e.g. a market-wide curve.
    Fixed(TargetSpecification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeclaration {
    pub value_name: String,
    pub target: InputTarget,
    pub constraints: ValueProperties,
}

impl InputDeclaration {
    fn to_requirement(&self, target: &ComputationTarget) -> ValueRequirement {
        let spec = match &self.target {
            InputTarget::SameTarget => target.specification(),
            InputTarget::Fixed(spec) => spec.clone(),
        };
        ValueRequirement::new(self.value_name.clone(), spec).with_constraints(self.constraints.clone())
    }
}

#[derive(Debug, Clone)]
pub struct DeclaredFunction {
    id: String,
    target_type: TargetType,
    outputs: Vec<(String, ValueProperties)>,
    inputs: Vec<InputDeclaration>,
    live_data: Vec<InputDeclaration>,
}

impl DeclaredFunction {
    pub fn new(id: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            id: id.into(),
            target_type,
            outputs: Vec::new(),
            inputs: Vec::new(),
            live_data: Vec::new(),
        }
    }

    pub fn producing(self, value_name: impl Into<String>) -> Self {
        self.producing_with(value_name, ValueProperties::default())
    }

    pub fn producing_with(mut self, value_name: impl Into<String>, properties: ValueProperties) -> Self {
        self.outputs.push((value_name.into(), properties));
        self
    }

    pub fn requiring(self, value_name: impl Into<String>, target: InputTarget) -> Self {
        self.requiring_with(value_name, target, ValueProperties::default())
    }

    pub fn requiring_with(mut self, value_name: impl Into<String>, target: InputTarget, constraints: ValueProperties) -> Self {
        self.inputs.push(InputDeclaration { value_name: value_name.into(), target, constraints });
        self
    }

    pub fn requiring_live_data(mut self, value_name: impl Into<String>, target: InputTarget) -> Self {
        self.live_data.push(InputDeclaration {
            value_name: value_name.into(),
            target,
            constraints: ValueProperties::default(),
        });
        self
    }
}

impl FunctionDefinition for DeclaredFunction {
    fn unique_id(&self) -> &str { &self.id }

    fn target_type(&self) -> TargetType { self.target_type }

    fn results(&self, target: &ComputationTarget) -> Vec<ValueSpecification> {
        let spec = target.specification();
        self.outputs.iter()
            .map(|(name, props)| {
                ValueSpecification::new(name.clone(), spec.clone(), self.id.clone()).with_properties(props.clone())
            })
            .collect()
    }

    fn requirements(&self, target: &ComputationTarget) -> Vec<ValueRequirement> {
        self.inputs.iter().map(|i| i.to_requirement(target)).collect()
    }

    fn required_live_data(&self, target: &ComputationTarget) -> Vec<ValueRequirement> {
        self.live_data.iter().map(|i| i.to_requirement(target)).collect()
    }
}
