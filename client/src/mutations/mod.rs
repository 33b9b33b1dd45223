//! Mutation controller
//!
//! Every mutation is an optimistic local transition, a remote call, and a
//! reconciliation step. The state machine per mutation instance is
//! `Idle -> Pending -> {Succeeded, Failed}`; terminal states are never
//! retried automatically, a new user action starts a new instance.
//!
//! Optimistic values are applied into the cache entry under the cache lock,
//! so rapid repeated mutations on one post serialize against the latest
//! local state rather than a captured snapshot. On remote acknowledgement
//! the controller invalidates the affected keys before its completion is
//! observable; on remote failure it rolls back its own optimistic delta,
//! leaves the cache un-invalidated, and reports the failure together with
//! the optimistic value that was shown.

pub mod interactions;
pub mod posts;
pub mod share;

pub use interactions::LikeDelta;

use crate::error::AppError;

/// Lifecycle of one mutation instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Terminal report of one mutation: the (optimistic or reconciled) value,
/// the terminal state reached, and the failure when one occurred
#[derive(Debug)]
pub struct MutationOutcome<T> {
    pub value: T,
    pub state: MutationState,
    pub error: Option<AppError>,
}

impl<T> MutationOutcome<T> {
    pub(crate) fn succeeded(value: T) -> Self {
        Self {
            value,
            state: MutationState::Succeeded,
            error: None,
        }
    }

    pub(crate) fn failed(value: T, error: AppError) -> Self {
        Self {
            value,
            state: MutationState::Failed,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == MutationState::Succeeded
    }
}
