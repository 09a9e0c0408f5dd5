//! Independent builds for many targets at once.

use super::builder::GraphBuilder;
use super::error::BuildError;
use crate::store::{ComputationTarget, DependencyGraph, TargetSpecification, ValueRequirement};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// The values wanted on one target.
#[derive(Debug, Clone)]
pub struct TargetRequest {
    pub target: ComputationTarget,
    pub requirements: Vec<ValueRequirement>,
}

impl TargetRequest {
    pub fn new(target: ComputationTarget, requirements: Vec<ValueRequirement>) -> Self {
        Self { target, requirements }
    }
}

impl GraphBuilder {
    /// Builds one graph per distinct target, in parallel.
    ///
    /// Requests naming the same target are merged. Graphs come back ordered
    /// by target specification. The first failure fails the whole batch.
    pub fn add_targets(&self, requests: Vec<TargetRequest>) -> Result<Vec<DependencyGraph>, BuildError> {
        let mut grouped: BTreeMap<TargetSpecification, TargetRequest> = BTreeMap::new();
        for request in requests {
            match grouped.get_mut(&request.target.specification()) {
                Some(existing) => existing.requirements.extend(request.requirements),
                None => {
                    grouped.insert(request.target.specification(), request);
                }
            }
        }

        let batch: Vec<TargetRequest> = grouped.into_values().collect();
        tracing::debug!(targets = batch.len(), "building graphs in parallel");
        batch
            .par_iter()
            .map(|request| self.add_target(&request.target, &request.requirements))
            .collect()
    }
}
