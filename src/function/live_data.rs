use crate::store::ValueRequirement;
use std::collections::HashSet;

/// Answers whether a requirement can be sourced from an external feed.
pub trait LiveDataAvailabilityProvider: Send + Sync {
    fn is_available(&self, requirement: &ValueRequirement) -> bool;
}

impl<F> LiveDataAvailabilityProvider for F
where
    F: Fn(&ValueRequirement) -> bool + Send + Sync,
{
    fn is_available(&self, requirement: &ValueRequirement) -> bool {
        self(requirement)
    }
}

/// A fixed set of requirements known to be on the feed.
#[derive(Debug, Clone, Default)]
pub struct FixedLiveDataAvailabilityProvider {
    available: HashSet<ValueRequirement>,
}

impl FixedLiveDataAvailabilityProvider {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, requirement: ValueRequirement) {
        self.available.insert(requirement);
    }

    pub fn len(&self) -> usize { self.available.len() }

    pub fn is_empty(&self) -> bool { self.available.is_empty() }
}

impl FromIterator<ValueRequirement> for FixedLiveDataAvailabilityProvider {
    fn from_iter<I: IntoIterator<Item = ValueRequirement>>(iter: I) -> Self {
        Self { available: iter.into_iter().collect() }
    }
}

impl LiveDataAvailabilityProvider for FixedLiveDataAvailabilityProvider {
    fn is_available(&self, requirement: &ValueRequirement) -> bool {
        self.available.contains(requirement)
    }
}
