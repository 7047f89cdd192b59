//! Mutation entry points: plan, apply, notify.
//!
//! These helpers are the only places the engine touches a repository. Each
//! one is a single user-initiated action; the UI layer is responsible for
//! disabling controls while a call is in flight, so no queueing happens
//! here.

use crate::deps::{blocking_dependencies, check_dependencies, should_block_deletion};
use crate::relation::{plan_relationship_change, RelationError, RelationshipPlan};
use crate::repo::{DependencyQueryService, EntityRepository, RepoError};
use crate::{EngineEvent, EventHandler};
use agrigraph_model::{Catalog, Dependency, Entity, EntityId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Relation(#[from] RelationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Outcome of a deletion action.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    /// Everything deleted; the ids are in deletion order.
    Deleted(Vec<EntityId>),
    /// Refused; the nonzero triples explain why.
    Blocked(Vec<Dependency>),
}

/// Plan and, unless it is a no-op, apply a relationship change.
///
/// Returns `true` when a patch was actually sent. The handler fires only
/// after the repository accepted the patch.
pub async fn apply_relationship_change(
    child: &Entity,
    new_parent: Option<&EntityId>,
    catalog: &Catalog,
    repository: &dyn EntityRepository,
    on_event: Option<&EventHandler>,
) -> Result<bool, ActionError> {
    match plan_relationship_change(child, new_parent, catalog)? {
        RelationshipPlan::NoOp => Ok(false),
        RelationshipPlan::Patch(patch) => {
            repository.patch_entity(&patch).await?;
            tracing::info!(entity = %patch.entity_id, "relationship patch applied");
            if let Some(handler) = on_event {
                handler(EngineEvent::RelationshipChanged {
                    entity_id: patch.entity_id.clone(),
                });
            }
            Ok(true)
        }
    }
}

/// Check dependencies for the candidates and, when nothing blocks, delete
/// them one by one.
///
/// The check-then-delete sequence is not atomic against concurrent
/// external mutation; that gap is accepted under the single-writer
/// assumption. A mid-sequence delete failure surfaces the error; entities
/// already deleted stay deleted and show up on the next re-fetch.
pub async fn delete_with_dependency_check(
    candidates: &[Entity],
    repository: &dyn EntityRepository,
    dependencies: &dyn DependencyQueryService,
    on_event: Option<&EventHandler>,
) -> Result<DeletionOutcome, ActionError> {
    let records = check_dependencies(candidates, dependencies).await?;

    if should_block_deletion(&records) {
        let blocking = blocking_dependencies(&records);
        tracing::info!(rows = blocking.len(), "deletion blocked by dependents");
        if let Some(handler) = on_event {
            handler(EngineEvent::DeletionBlocked {
                dependencies: blocking.clone(),
            });
        }
        return Ok(DeletionOutcome::Blocked(blocking));
    }

    let mut deleted = Vec::with_capacity(candidates.len());
    for entity in candidates {
        repository
            .delete_entity(&entity.entity_type, &entity.id)
            .await?;
        deleted.push(entity.id.clone());
    }

    tracing::info!(count = deleted.len(), "deletion completed");
    if let Some(handler) = on_event {
        handler(EngineEvent::DeletionCompleted {
            deleted_ids: deleted.clone(),
        });
    }
    Ok(DeletionOutcome::Deleted(deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationshipPatch;
    use agrigraph_model::{EntityStatus, EntityType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn entity(id: &str, ty: EntityType, parent: Option<&str>) -> Entity {
        Entity {
            id: EntityId::new(id),
            entity_type: ty,
            name: id.to_string(),
            parent_id: parent.map(EntityId::new),
            municipality: None,
            status: EntityStatus::Active,
            has_location: false,
        }
    }

    #[derive(Default)]
    struct FakeRepo {
        patches: Mutex<Vec<RelationshipPatch>>,
        deletes: Mutex<Vec<EntityId>>,
        fail_deletes: bool,
    }

    #[async_trait]
    impl EntityRepository for FakeRepo {
        async fn list_entities(&self) -> Result<Vec<Entity>, RepoError> {
            Ok(vec![])
        }

        async fn patch_entity(&self, patch: &RelationshipPatch) -> Result<(), RepoError> {
            self.patches.lock().unwrap().push(patch.clone());
            Ok(())
        }

        async fn delete_entity(
            &self,
            _entity_type: &EntityType,
            id: &EntityId,
        ) -> Result<(), RepoError> {
            if self.fail_deletes {
                return Err(RepoError::Rejected("broker said no".to_string()));
            }
            self.deletes.lock().unwrap().push(id.clone());
            Ok(())
        }
    }

    struct FakeDeps(Vec<Dependency>);

    #[async_trait]
    impl DependencyQueryService for FakeDeps {
        async fn batch_check_dependencies(
            &self,
            _candidates: &[Entity],
        ) -> Result<Vec<Dependency>, RepoError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn noop_sends_nothing() {
        let catalog = Catalog::new(vec![
            entity("P1", EntityType::AgriParcel, None),
            entity("S1", EntityType::AgriSensor, Some("P1")),
        ]);
        let repo = FakeRepo::default();
        let child = catalog.get(&EntityId::new("S1")).unwrap();

        let sent = apply_relationship_change(
            child,
            Some(&EntityId::new("P1")),
            &catalog,
            &repo,
            None,
        )
        .await
        .unwrap();

        assert!(!sent);
        assert!(repo.patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn applied_patch_fires_event() {
        let catalog = Catalog::new(vec![
            entity("F1", EntityType::AgriFarm, None),
            entity("S1", EntityType::AgriSensor, None),
        ]);
        let repo = FakeRepo::default();
        let child = catalog.get(&EntityId::new("S1")).unwrap();

        static FIRED: AtomicUsize = AtomicUsize::new(0);
        let handler: EventHandler = Box::new(|event| {
            if matches!(event, EngineEvent::RelationshipChanged { .. }) {
                FIRED.fetch_add(1, Ordering::SeqCst);
            }
        });

        let sent = apply_relationship_change(
            child,
            Some(&EntityId::new("F1")),
            &catalog,
            &repo,
            Some(&handler),
        )
        .await
        .unwrap();

        assert!(sent);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
        assert_eq!(repo.patches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blocked_deletion_reports_triples_and_deletes_nothing() {
        let repo = FakeRepo::default();
        let deps = FakeDeps(vec![Dependency {
            entity_name: "North Field".to_string(),
            dependent_type: EntityType::AgriSensor,
            dependent_count: 3,
        }]);
        let candidates = vec![entity("P1", EntityType::AgriParcel, None)];

        let outcome = delete_with_dependency_check(&candidates, &repo, &deps, None)
            .await
            .unwrap();

        match outcome {
            DeletionOutcome::Blocked(rows) => {
                assert_eq!(rows[0].entity_name, "North Field");
                assert_eq!(rows[0].dependent_count, 3);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(repo.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unblocked_deletion_deletes_all_candidates() {
        let repo = FakeRepo::default();
        let deps = FakeDeps(vec![]);
        let candidates = vec![
            entity("S1", EntityType::AgriSensor, None),
            entity("S2", EntityType::AgriSensor, None),
        ];

        let outcome = delete_with_dependency_check(&candidates, &repo, &deps, None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DeletionOutcome::Deleted(vec![EntityId::new("S1"), EntityId::new("S2")])
        );
        assert_eq!(repo.deletes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_failure_surfaces_as_error() {
        let repo = FakeRepo {
            fail_deletes: true,
            ..FakeRepo::default()
        };
        let deps = FakeDeps(vec![]);
        let candidates = vec![entity("S1", EntityType::AgriSensor, None)];

        let err = delete_with_dependency_check(&candidates, &repo, &deps, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Repo(RepoError::Rejected(_))));
    }
}
