//! Function resolution: mapping a (target, requirement) pair to the function
//! that produces it and the exact specification it promises.

use super::definition::FunctionRef;
use crate::store::{ComputationTarget, ValueRequirement, ValueSpecification};
use std::sync::Arc;

/// Per-build context handed to the resolver.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub calculation_configuration: &'a str,
}

pub trait FunctionResolver: Send + Sync {
    /// Returns `None` when nothing can produce `requirement` on `target`.
    /// That is an expected outcome, not an error.
    fn resolve(
        &self,
        context: &ResolutionContext<'_>,
        target: &ComputationTarget,
        requirement: &ValueRequirement,
    ) -> Option<(FunctionRef, ValueSpecification)>;
}

impl<R: FunctionResolver + ?Sized> FunctionResolver for Arc<R> {
    fn resolve(
        &self,
        context: &ResolutionContext<'_>,
        target: &ComputationTarget,
        requirement: &ValueRequirement,
    ) -> Option<(FunctionRef, ValueSpecification)> {
        (**self).resolve(context, target, requirement)
    }
}

#[derive(Debug, Clone)]
struct RepositoryEntry {
    function: FunctionRef,
    priority: i32,
}

/// The registry of functions available to a resolver.
#[derive(Debug, Clone, Default)]
pub struct FunctionRepository {
    entries: Vec<RepositoryEntry>,
}

impl FunctionRepository {
    pub fn new() -> Self { Self::default() }

    pub fn add_function(&mut self, function: FunctionRef) {
        self.add_function_with_priority(function, 0);
    }

    /// Higher priorities win when several functions can satisfy a requirement.
    pub fn add_function_with_priority(&mut self, function: FunctionRef, priority: i32) {
        self.entries.push(RepositoryEntry { function, priority });
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, unique_id: &str) -> Option<&FunctionRef> {
        self.entries.iter().map(|e| &e.function).find(|f| f.unique_id() == unique_id)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionRef> {
        self.entries.iter().map(|e| &e.function)
    }
}

/// Scans a `FunctionRepository` for the highest-priority function whose
/// results satisfy the requirement. Ties go to the earliest registration.
#[derive(Debug, Clone, Default)]
pub struct DefaultFunctionResolver {
    repository: FunctionRepository,
}

impl DefaultFunctionResolver {
    pub fn new(repository: FunctionRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &FunctionRepository { &self.repository }
}

impl FunctionResolver for DefaultFunctionResolver {
    fn resolve(
        &self,
        _context: &ResolutionContext<'_>,
        target: &ComputationTarget,
        requirement: &ValueRequirement,
    ) -> Option<(FunctionRef, ValueSpecification)> {
        let mut best: Option<(i32, &FunctionRef, ValueSpecification)> = None;

        for entry in &self.repository.entries {
            if !entry.function.can_apply_to(target) {
                continue;
            }
            if let Some((priority, _, _)) = &best {
                if entry.priority <= *priority {
                    continue;
                }
            }
            let satisfying = entry.function.results(target)
                .into_iter()
                .find(|spec| requirement.is_satisfied_by(spec));
            if let Some(spec) = satisfying {
                best = Some((entry.priority, &entry.function, spec));
            }
        }

        best.map(|(_, function, spec)| (function.clone(), spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::declared::DeclaredFunction;
    use crate::store::{TargetSpecification, TargetType, ValueProperties};
    use rstest::rstest;

    const CTX: ResolutionContext<'static> = ResolutionContext { calculation_configuration: "Default" };

    fn repo_with_priorities(alpha: i32, beta: i32) -> FunctionRepository {
        let mut repo = FunctionRepository::new();
        repo.add_function_with_priority(Arc::new(DeclaredFunction::new("alpha", TargetType::Primitive).producing("Value")), alpha);
        repo.add_function_with_priority(Arc::new(DeclaredFunction::new("beta", TargetType::Primitive).producing("Value")), beta);
        repo
    }

    #[rstest]
    #[case(0, 0, "alpha")]
    #[case(0, 1, "beta")]
    #[case(0, -1, "alpha")]
    #[case(-5, -1, "beta")]
    fn test_priority_selection(#[case] alpha: i32, #[case] beta: i32, #[case] expected: &str) {
        let resolver = DefaultFunctionResolver::new(repo_with_priorities(alpha, beta));
        let req = ValueRequirement::new("Value", TargetSpecification::primitive("P"));
        let (f, spec) = resolver.resolve(&CTX, &ComputationTarget::primitive("P"), &req).unwrap();
        assert_eq!(f.unique_id(), expected);
        assert_eq!(spec.function_id, expected);
    }

    #[test]
    fn test_target_type_filters_candidates() {
        let mut repo = FunctionRepository::new();
        repo.add_function(Arc::new(DeclaredFunction::new("sec", TargetType::Security).producing("Value")));
        let resolver = DefaultFunctionResolver::new(repo);
        let req = ValueRequirement::new("Value", TargetSpecification::primitive("P"));
        assert!(resolver.resolve(&CTX, &ComputationTarget::primitive("P"), &req).is_none());
    }

    #[test]
    fn test_constraints_select_matching_result() {
        let mut repo = FunctionRepository::new();
        repo.add_function(Arc::new(
            DeclaredFunction::new("usd", TargetType::Primitive)
                .producing_with("Value", ValueProperties::new().with("Currency", "USD")),
        ));
        repo.add_function(Arc::new(
            DeclaredFunction::new("eur", TargetType::Primitive)
                .producing_with("Value", ValueProperties::new().with("Currency", "EUR")),
        ));
        let resolver = DefaultFunctionResolver::new(repo);
        let req = ValueRequirement::new("Value", TargetSpecification::primitive("P"))
            .with_constraints(ValueProperties::new().with("Currency", "EUR"));
        let (f, _) = resolver.resolve(&CTX, &ComputationTarget::primitive("P"), &req).unwrap();
        assert_eq!(f.unique_id(), "eur");

        let missing = ValueRequirement::new("Value", TargetSpecification::primitive("P"))
            .with_constraints(ValueProperties::new().with("Currency", "JPY"));
        assert!(resolver.resolve(&CTX, &ComputationTarget::primitive("P"), &missing).is_none());
    }
}
