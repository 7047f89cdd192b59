//! Relationship Mutator: plan a parent change as a minimal patch.
//!
//! The planner picks the located-at attribute from the new parent's type,
//! then emits a patch that sets that attribute and clears the other two.
//! The clears are unconditional: the backend may hold leftover state in an
//! attribute the console never displayed, and a patch that only sets the
//! new link would leave the entity with two parents on the wire.

use agrigraph_model::{Catalog, Entity, EntityId, EntityType, RefAttribute};
use serde::Serialize;
use thiserror::Error;

/// Outcome of planning a relationship change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RelationshipPlan {
    /// The requested parent is already the current parent. Repeated
    /// application must never generate traffic.
    NoOp,
    Patch(RelationshipPatch),
}

/// A minimal, single-entity patch. Applying it is one atomic PATCH on the
/// repository side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipPatch {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    /// Attribute to set, with the parent it points at. `None` removes the
    /// relationship entirely.
    pub set: Option<(RefAttribute, EntityId)>,
    /// Attributes to clear. Always the rest of the mutual-exclusivity set.
    pub clear: Vec<RefAttribute>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RelationError {
    /// A non-null target parent was not found in the snapshot.
    #[error("parent {0} not present in catalog")]
    UnknownParent(EntityId),
}

/// Plan the patch that moves `child` under `new_parent`.
///
/// `new_parent = None` means "remove relationship". The planner does no
/// I/O; callers apply the returned patch through the entity repository.
pub fn plan_relationship_change(
    child: &Entity,
    new_parent: Option<&EntityId>,
    catalog: &Catalog,
) -> Result<RelationshipPlan, RelationError> {
    if new_parent == child.parent_id.as_ref() {
        tracing::debug!(entity = %child.id, "relationship unchanged, no-op");
        return Ok(RelationshipPlan::NoOp);
    }

    let patch = match new_parent {
        Some(parent_id) => {
            let parent = catalog
                .get(parent_id)
                .ok_or_else(|| RelationError::UnknownParent(parent_id.clone()))?;
            let selected = RefAttribute::for_parent_type(&parent.entity_type);
            RelationshipPatch {
                entity_id: child.id.clone(),
                entity_type: child.entity_type.clone(),
                set: Some((selected, parent_id.clone())),
                clear: selected.competitors().collect(),
            }
        }
        None => RelationshipPatch {
            entity_id: child.id.clone(),
            entity_type: child.entity_type.clone(),
            set: None,
            clear: RefAttribute::ALL.to_vec(),
        },
    };

    tracing::debug!(
        entity = %patch.entity_id,
        set = ?patch.set,
        cleared = patch.clear.len(),
        "relationship patch planned"
    );
    Ok(RelationshipPlan::Patch(patch))
}
