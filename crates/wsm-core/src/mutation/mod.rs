//! Optimistic mutations.
//!
//! A local change is applied before the request goes out and is either
//! confirmed by the response or undone:
//!
//! ```text
//!            ┌──────────┐  2xx   ┌───────────┐
//!  apply ──▶ │ Pending  │ ─────▶ │ Committed │
//!            └──────────┘        └───────────┘
//!                 │  error       ┌────────────┐
//!                 └────────────▶ │ RolledBack │
//!                                └────────────┘
//! ```
//!
//! A second mutation of an entity that is still pending is `Skipped`.

use crate::error::Result;
use crate::state::AppState;
use std::sync::Arc;
use tracing::debug;

/// How an optimistic mutation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The server accepted the change; carries its canonical record.
    Committed(T),
    /// The request failed and the local change was undone.
    RolledBack { message: String },
    /// Another mutation of the same entity was still in flight.
    Skipped,
}

impl<T> MutationOutcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The committed record, if any.
    pub fn committed(&self) -> Option<&T> {
        match self {
            Self::Committed(value) => Some(value),
            _ => None,
        }
    }
}

/// A change applied locally and not yet confirmed.
///
/// Holds what is needed to undo it. Consumed by exactly one of
/// [`Pending::commit`] or [`Pending::roll_back`].
#[derive(Debug)]
#[must_use = "a pending mutation must be committed or rolled back"]
pub struct Pending<P> {
    previous: P,
}

impl<P> Pending<P> {
    pub fn new(previous: P) -> Self {
        Self { previous }
    }

    pub fn previous(&self) -> &P {
        &self.previous
    }

    pub fn commit<T>(self, value: T) -> MutationOutcome<T> {
        MutationOutcome::Committed(value)
    }

    /// Give back the value to restore along with the outcome.
    pub fn roll_back<T>(self, message: impl Into<String>) -> (P, MutationOutcome<T>) {
        (
            self.previous,
            MutationOutcome::RolledBack {
                message: message.into(),
            },
        )
    }
}

/// In-flight marker for one task. Removed when dropped.
pub struct InFlight {
    state: Arc<AppState>,
    task_id: String,
}

impl InFlight {
    /// Mark `task_id` as saving, or return `None` if it already is.
    pub fn acquire(state: &Arc<AppState>, task_id: &str) -> Result<Option<Self>> {
        let inserted = state.update(|c| c.saving_tasks.insert(task_id.to_string()))?;
        if !inserted {
            debug!("Task {} already has an update in flight", task_id);
            return Ok(None);
        }
        Ok(Some(Self {
            state: Arc::clone(state),
            task_id: task_id.to_string(),
        }))
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let task_id = &self.task_id;
        if self
            .state
            .update(|c| c.saving_tasks.remove(task_id))
            .is_err()
        {
            debug!("Could not clear in-flight marker for task {}", task_id);
        }
    }
}
