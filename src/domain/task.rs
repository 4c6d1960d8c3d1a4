//! Task Entity
//!
//! A to-do item belonging to exactly one list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::{ListId, TaskId, UserId};

/// A to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Owning list, fixed for the task's lifetime
    pub list_id: ListId,
    pub title: String,
    /// Completion status
    pub is_done: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Unsaved task as shown before the backend confirms it
    pub fn draft(id: TaskId, list_id: ListId, title: String, created_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            list_id,
            title,
            is_done: false,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the task carries a backend-assigned identity
    pub fn is_saved(&self) -> bool {
        !self.id.is_temporary()
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Partial update of a task's mutable fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl TaskPatch {
    pub fn completion(is_done: bool) -> Self {
        Self {
            is_done: Some(is_done),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_done.is_none()
    }

    /// Apply the patch in place, stamping `updated_at`
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(is_done) = self.is_done {
            task.is_done = is_done;
        }
        task.updated_at = now;
    }
}
