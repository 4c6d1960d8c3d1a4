//! List Synchronizer
//!
//! Owns the task view of one list. Local edits are applied to the view
//! immediately and recorded as pending operations; the backend response either
//! confirms them or triggers the compensating change. Remote change events are
//! merged with insert-if-absent / update-if-present / delete-if-present rules so
//! they commute with local completions.
//!
//! The state lock is never held across a request, so further operations can
//! run while one is outstanding.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use super::error::{SyncError, SyncResult};
use super::pending::{PendingOp, PendingOps};
use super::view::TaskView;
use crate::domain::{validation, ListId, Task, TaskId, TaskPatch, UserId};
use crate::realtime::ChangeEvent;
use crate::repository::TaskRepository;

#[derive(Default)]
struct SyncState {
    view: TaskView,
    pending: PendingOps,
    /// Ids known to be deleted; never shown again. Kept for the life of the
    /// synchronizer since a replayed insert can arrive at any time, so it grows
    /// by one id per delete seen in this session.
    tombstones: HashSet<TaskId>,
    next_temporary: u64,
}

impl SyncState {
    fn next_temporary_id(&mut self) -> TaskId {
        self.next_temporary += 1;
        TaskId::temporary(self.next_temporary)
    }

    /// Fails unless `id` is in the view with a backend identity
    fn require_saved(&self, id: &TaskId) -> SyncResult<()> {
        match self.view.get(id).map(Task::is_saved) {
            None => Err(SyncError::UnknownTask(id.clone())),
            Some(false) => Err(SyncError::Unconfirmed(id.clone())),
            Some(true) => Ok(()),
        }
    }

    fn confirm_created(&mut self, temporary: &TaskId, task: Task) {
        if self.tombstones.contains(&task.id) || self.view.contains(&task.id) {
            // A remote insert (or delete) for the real id got here first.
            self.view.remove(temporary);
        } else if !self.view.replace_id(temporary, task.clone()) {
            self.view.append(task);
        }
    }
}

pub struct ListSynchronizer<R: ?Sized> {
    list_id: ListId,
    author: UserId,
    repo: Arc<R>,
    state: Mutex<SyncState>,
    changes: watch::Sender<u64>,
}

impl<R: TaskRepository + ?Sized> ListSynchronizer<R> {
    /// Start from `initial`, ordered by creation time
    pub fn new(list_id: ListId, author: UserId, repo: Arc<R>, mut initial: Vec<Task>) -> Self {
        initial.sort_by_key(|task| task.created_at);
        let (changes, _) = watch::channel(0);
        Self {
            list_id,
            author,
            repo,
            state: Mutex::new(SyncState {
                view: TaskView::new(initial),
                ..Default::default()
            }),
            changes,
        }
    }

    pub fn list_id(&self) -> &ListId {
        &self.list_id
    }

    /// "View changed" notifications. The value is a version counter; read
    /// `snapshot` after it moves.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Current tasks in display order
    pub async fn snapshot(&self) -> Vec<Task> {
        self.state.lock().await.view.items().to_vec()
    }

    /// Busy indicator: true while any add is waiting for the backend
    pub async fn is_adding(&self) -> bool {
        self.state.lock().await.pending.creates() > 0
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    /// Add a task with `title` (trimmed).
    ///
    /// The draft is shown right away under a temporary id and swapped in
    /// place for the stored task once the backend answers.
    pub async fn add_task(&self, title: &str) -> SyncResult<Task> {
        let title = validation::task_title(title).map_err(|_| SyncError::EmptyTitle)?;

        let (op, temporary) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let temporary = state.next_temporary_id();
            let draft = Task::draft(
                temporary.clone(),
                self.list_id.clone(),
                title.clone(),
                self.author.clone(),
                Utc::now(),
            );
            state.view.append(draft.clone());
            (state.pending.record(PendingOp::Create { draft }), temporary)
        };
        self.notify();

        let result = self.repo.create_task(&self.list_id, &title).await;

        let mut state = self.state.lock().await;
        state.pending.take(op);
        match result {
            Ok(task) => {
                log::debug!("List {}: {} saved as {}", self.list_id, temporary, task.id);
                state.confirm_created(&temporary, task.clone());
                drop(state);
                self.notify();
                Ok(task)
            }
            Err(e) => {
                log::warn!("List {}: create failed, dropping {}: {}", self.list_id, temporary, e);
                state.view.remove(&temporary);
                drop(state);
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Flip completion of a saved task; returns the new value
    pub async fn toggle_task(&self, task_id: &TaskId) -> SyncResult<bool> {
        let (op, is_done) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            state.require_saved(task_id)?;
            let task = state
                .view
                .get_mut(task_id)
                .ok_or_else(|| SyncError::UnknownTask(task_id.clone()))?;
            let previous = task.is_done;
            task.is_done = !previous;
            let op = state.pending.record(PendingOp::Toggle {
                task_id: task_id.clone(),
                previous,
            });
            (op, !previous)
        };
        self.notify();

        let result = self.repo.update_task(task_id, &TaskPatch::completion(is_done)).await;

        let mut state = self.state.lock().await;
        let pending = state.pending.take(op);
        match result {
            Ok(()) => Ok(is_done),
            Err(e) => {
                log::warn!("List {}: toggle of {} failed, reverting: {}", self.list_id, task_id, e);
                // Only the latest pending toggle of a task writes the view.
                if let Some(PendingOp::Toggle { previous, .. }) = pending {
                    if let Some(later) = state.pending.next_toggle_mut(op, task_id) {
                        *later = previous;
                    } else if let Some(task) = state.view.get_mut(task_id) {
                        task.is_done = previous;
                    }
                }
                drop(state);
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Remove a saved task
    pub async fn delete_task(&self, task_id: &TaskId) -> SyncResult<()> {
        let op = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            state.require_saved(task_id)?;
            let snapshot = state
                .view
                .remove(task_id)
                .ok_or_else(|| SyncError::UnknownTask(task_id.clone()))?;
            state.pending.record(PendingOp::Delete { snapshot })
        };
        self.notify();

        let result = self.repo.delete_task(task_id).await;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let pending = state.pending.take(op);
        match result {
            Ok(()) => {
                state.tombstones.insert(task_id.clone());
                if state.view.remove(task_id).is_some() {
                    drop(guard);
                    self.notify();
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("List {}: delete of {} failed, restoring: {}", self.list_id, task_id, e);
                if let Some(PendingOp::Delete { snapshot }) = pending {
                    if !state.tombstones.contains(task_id) && !state.view.contains(task_id) {
                        state.view.append(snapshot);
                    }
                }
                drop(guard);
                self.notify();
                Err(e.into())
            }
        }
    }

    /// Merge a remote change; returns whether the view changed
    pub async fn apply_remote(&self, event: ChangeEvent) -> bool {
        if let Some(list_id) = event.list_id() {
            if list_id != &self.list_id {
                log::debug!("List {}: ignoring change for list {}", self.list_id, list_id);
                return false;
            }
        }

        let changed = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match event {
                ChangeEvent::Inserted(task) => {
                    !state.tombstones.contains(&task.id)
                        && !state.pending.deleting(&task.id)
                        && state.view.insert_if_absent(task)
                }
                ChangeEvent::Updated(task) => state.view.replace(task),
                ChangeEvent::Deleted(id) => {
                    let removed = state.view.remove(&id).is_some();
                    state.tombstones.insert(id);
                    removed
                }
            }
        };

        if changed {
            self.notify();
        }
        changed
    }

    /// Parse and merge a raw change payload. Malformed payloads are logged and
    /// dropped.
    pub async fn apply_payload(&self, payload: &Value) -> bool {
        match ChangeEvent::from_payload(payload) {
            Ok(event) => self.apply_remote(event).await,
            Err(e) => {
                log::warn!("List {}: ignoring malformed change: {}", self.list_id, e);
                false
            }
        }
    }
}
