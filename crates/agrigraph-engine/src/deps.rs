//! Dependency Checker: does anything still reference a deletion candidate?

use crate::repo::{DependencyQueryService, RepoError};
use agrigraph_model::{Dependency, Entity};

/// Run the batched dependency query for a candidate-for-deletion set.
pub async fn check_dependencies(
    candidates: &[Entity],
    service: &dyn DependencyQueryService,
) -> Result<Vec<Dependency>, RepoError> {
    let dependencies = service.batch_check_dependencies(candidates).await?;
    tracing::debug!(
        candidates = candidates.len(),
        dependency_rows = dependencies.len(),
        "dependency check complete"
    );
    Ok(dependencies)
}

/// Blocking policy: deletion is blocked iff at least one record has a
/// nonzero dependent count. All dependent types are treated uniformly.
pub fn should_block_deletion(dependencies: &[Dependency]) -> bool {
    dependencies.iter().any(|dep| dep.dependent_count > 0)
}

/// The records a blocked-deletion message must show: only the nonzero
/// triples, so the user sees exactly what to resolve first.
pub fn blocking_dependencies(dependencies: &[Dependency]) -> Vec<Dependency> {
    dependencies
        .iter()
        .filter(|dep| dep.dependent_count > 0)
        .cloned()
        .collect()
}
