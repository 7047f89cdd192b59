//! Collaborator ports.
//!
//! The engine performs no I/O of its own. These traits are the seams the
//! console wires a backend into; `agrigraph-ngsi` provides the Orion-LD
//! implementation and tests provide in-memory fakes.

use crate::relation::RelationshipPatch;
use agrigraph_model::{Dependency, Entity, EntityId, EntityType};
use async_trait::async_trait;
use thiserror::Error;

/// Failures crossing the collaborator boundary.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("transport: {0}")]
    Transport(String),
    /// The backend refused a patch or delete.
    #[error("mutation rejected: {0}")]
    Rejected(String),
    /// The dependency check did not produce a definitive result. Callers
    /// must treat the dependency state as unknown, never as unblocked.
    #[error("dependency check failed: {0}")]
    DependencyCheck(String),
}

/// Flat entity store. Patch and delete are atomic per entity on the far
/// side; the engine issues at most one in-flight mutation per user action.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn list_entities(&self) -> Result<Vec<Entity>, RepoError>;

    /// Apply one relationship patch as a single PATCH.
    async fn patch_entity(&self, patch: &RelationshipPatch) -> Result<(), RepoError>;

    async fn delete_entity(
        &self,
        entity_type: &EntityType,
        id: &EntityId,
    ) -> Result<(), RepoError>;
}

/// Batched dependency lookup: one logical call regardless of candidate-set
/// size. Fan-out on the far side is an implementation detail.
#[async_trait]
pub trait DependencyQueryService: Send + Sync {
    async fn batch_check_dependencies(
        &self,
        candidates: &[Entity],
    ) -> Result<Vec<Dependency>, RepoError>;
}
