//! Deletion Gate: typed-confirmation state machine for destructive deletes.
//!
//! One gate instance tracks one deletion attempt. Arming requires an exact
//! match of the confirmation phrase and an unblocked dependency check; a
//! failed or still-pending check keeps the gate non-confirmable. Execution
//! failure keeps the typed confirmation so the user can retry without
//! retyping, and the dialog cannot be dismissed while a delete is in
//! flight.

use crate::deps::{blocking_dependencies, should_block_deletion};
use agrigraph_model::{Dependency, EntityId};
use uuid::Uuid;

/// Exact, case-sensitive phrase the user must type to arm a deletion.
pub const DELETE_CONFIRMATION_PHRASE: &str = "DELETE";

#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    /// No deletion attempt in progress.
    Idle,
    /// Dependency check pending (or failed; the gate stays here until a
    /// definitive result arrives).
    Checking,
    /// Deletion refused; the triples name every referencing entity group.
    Blocked(Vec<Dependency>),
    /// Check passed, confirmation phrase not yet (or no longer) matching.
    Confirmable,
    /// Phrase matches and nothing blocks; confirm will execute.
    Armed,
    /// Delete request in flight.
    Executing,
    /// All candidates deleted.
    Done(Vec<EntityId>),
    /// Execution failed. Retryable; the confirmation text is preserved.
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum GateEvent {
    /// Start a new attempt (opens the dialog).
    Open,
    /// Definitive dependency-check result arrived.
    DependenciesResolved(Vec<Dependency>),
    /// The check errored. The dependency state is unknown; the gate must
    /// not silently treat that as blocked or unblocked.
    DependencyCheckFailed,
    /// The user edited the confirmation field.
    ConfirmationInput(String),
    /// The user pressed the destructive action.
    Confirm,
    ExecutionSucceeded(Vec<EntityId>),
    ExecutionFailed(String),
    /// Close the dialog. Suppressed while executing.
    Dismiss,
}

#[derive(Debug)]
pub struct DeletionGate {
    attempt_id: Uuid,
    state: GateState,
    confirmation: String,
}

impl DeletionGate {
    pub fn new() -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            state: GateState::Idle,
            confirmation: String::new(),
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// The text currently in the confirmation field.
    pub fn confirmation(&self) -> &str {
        &self.confirmation
    }

    pub fn is_armed(&self) -> bool {
        self.state == GateState::Armed
    }

    /// Whether a dismiss would be honored right now.
    pub fn can_dismiss(&self) -> bool {
        self.state != GateState::Executing
    }

    /// Apply one event. Unexpected events for the current state are
    /// ignored; a confirmation mismatch is a refused transition, not an
    /// error.
    pub fn apply(&mut self, event: GateEvent) -> &GateState {
        self.state = match (std::mem::replace(&mut self.state, GateState::Idle), event) {
            (GateState::Idle, GateEvent::Open) => {
                self.attempt_id = Uuid::new_v4();
                self.confirmation.clear();
                GateState::Checking
            }

            (GateState::Checking, GateEvent::DependenciesResolved(deps)) => {
                if should_block_deletion(&deps) {
                    GateState::Blocked(blocking_dependencies(&deps))
                } else {
                    self.confirmable_state()
                }
            }
            (GateState::Checking, GateEvent::DependencyCheckFailed) => {
                tracing::warn!(
                    attempt = %self.attempt_id,
                    "dependency check failed, gate stays non-confirmable"
                );
                GateState::Checking
            }

            (GateState::Confirmable | GateState::Armed, GateEvent::ConfirmationInput(text)) => {
                self.confirmation = text;
                self.confirmable_state()
            }
            // Typing while blocked or checking is recorded but changes
            // nothing until the check clears.
            (state @ (GateState::Blocked(_) | GateState::Checking), GateEvent::ConfirmationInput(text)) => {
                self.confirmation = text;
                state
            }

            (GateState::Armed, GateEvent::Confirm) => GateState::Executing,
            // Retry after failure: the preserved confirmation still counts.
            (GateState::Failed(_), GateEvent::Confirm)
                if self.confirmation == DELETE_CONFIRMATION_PHRASE =>
            {
                GateState::Executing
            }

            (GateState::Executing, GateEvent::ExecutionSucceeded(ids)) => GateState::Done(ids),
            (GateState::Executing, GateEvent::ExecutionFailed(detail)) => {
                GateState::Failed(detail)
            }

            (GateState::Executing, GateEvent::Dismiss) => {
                tracing::debug!(attempt = %self.attempt_id, "dismiss suppressed mid-execution");
                GateState::Executing
            }
            (_, GateEvent::Dismiss) => {
                self.confirmation.clear();
                GateState::Idle
            }

            // Everything else is a refused transition.
            (state, _) => state,
        };
        &self.state
    }

    fn confirmable_state(&self) -> GateState {
        if self.confirmation == DELETE_CONFIRMATION_PHRASE {
            GateState::Armed
        } else {
            GateState::Confirmable
        }
    }
}

impl Default for DeletionGate {
    fn default() -> Self {
        Self::new()
    }
}
