//! Agrigraph Entity Hierarchy & Relationship Engine
//!
//! The engine turns one flat catalog snapshot into everything the console
//! renders, and plans every mutation the console is allowed to make:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Catalog snapshot ──► Filter/Sort ──► Tree Builder ──► forest    │
//! │                                                                  │
//! │  user action ──► Relationship Mutator ──► patch ──► repository   │
//! │                                                                  │
//! │  delete request ──► Dependency Checker ──► Deletion Gate ──►     │
//! │                     repository delete ──► re-fetch               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Derive passes (`view`, `tree`) are pure: they never mutate the snapshot
//! and never fail. Mutations (`relation`, `actions`) produce patch values
//! that the repository collaborator applies as one atomic call per entity.
//! Destructive deletion is double-gated: a dependency check that blocks on
//! any referencing entity, and a typed-confirmation state machine.

pub mod actions;
pub mod deps;
pub mod gate;
pub mod relation;
pub mod repo;
pub mod tree;
pub mod view;

use agrigraph_model::{Dependency, EntityId};

// ============================================================================
// Engine Events
// ============================================================================

/// Events emitted toward the presentation layer.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A relationship patch was applied for this entity.
    RelationshipChanged { entity_id: EntityId },
    /// A gated deletion ran to completion.
    DeletionCompleted { deleted_ids: Vec<EntityId> },
    /// A deletion was refused; the triples name what must be resolved first.
    DeletionBlocked { dependencies: Vec<Dependency> },
}

/// Callback for engine events.
pub type EventHandler = Box<dyn Fn(EngineEvent) + Send + Sync>;
