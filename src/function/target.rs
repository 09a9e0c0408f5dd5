use crate::store::{ComputationTarget, TargetSpecification};
use std::collections::HashMap;

/// Maps a target reference carried by a requirement to the target itself.
pub trait TargetResolver: Send + Sync {
    fn resolve(&self, specification: &TargetSpecification) -> Option<ComputationTarget>;
}

#[derive(Debug, Clone, Default)]
pub struct MapTargetResolver {
    targets: HashMap<TargetSpecification, ComputationTarget>,
}

impl MapTargetResolver {
    pub fn new() -> Self { Self::default() }

    pub fn add_target(&mut self, target: ComputationTarget) {
        self.targets.insert(target.specification(), target);
    }

    pub fn len(&self) -> usize { self.targets.len() }

    pub fn is_empty(&self) -> bool { self.targets.is_empty() }
}

impl FromIterator<ComputationTarget> for MapTargetResolver {
    fn from_iter<I: IntoIterator<Item = ComputationTarget>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for target in iter {
            resolver.add_target(target);
        }
        resolver
    }
}

impl TargetResolver for MapTargetResolver {
    fn resolve(&self, specification: &TargetSpecification) -> Option<ComputationTarget> {
        self.targets.get(specification).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_resolver_lookup() {
        let resolver: MapTargetResolver = [ComputationTarget::primitive("USD")].into_iter().collect();
        assert_eq!(resolver.resolve(&TargetSpecification::primitive("USD")), Some(ComputationTarget::primitive("USD")));
        assert!(resolver.resolve(&TargetSpecification::security("USD")).is_none());
    }
}
