use thiserror::Error;

use crate::domain::{DomainError, TaskId};

pub type SyncResult<T> = Result<T, SyncError>;

/// Outcome of a rejected or failed list operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Title was empty after trimming; nothing was sent
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("task {0} is not in this list")]
    UnknownTask(TaskId),
    /// The task is still waiting for its backend identity
    #[error("task {0} has not been saved yet")]
    Unconfirmed(TaskId),
    /// The request failed and the optimistic change was reverted
    #[error(transparent)]
    Backend(#[from] DomainError),
}
