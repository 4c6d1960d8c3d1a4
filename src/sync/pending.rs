//! Ledger of local mutations awaiting a backend response.

use std::collections::HashMap;

use crate::domain::{Task, TaskId};

/// Handle for one recorded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(u64);

/// What is needed to undo an optimistic change
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    /// Draft shown under a temporary id
    Create { draft: Task },
    /// Completion flag before the toggle
    Toggle { task_id: TaskId, previous: bool },
    /// Record removed from the view
    Delete { snapshot: Task },
}

#[derive(Debug, Default)]
pub struct PendingOps {
    next: u64,
    ops: HashMap<OpId, PendingOp>,
}

impl PendingOps {
    pub fn record(&mut self, op: PendingOp) -> OpId {
        self.next += 1;
        let id = OpId(self.next);
        self.ops.insert(id, op);
        id
    }

    /// Resolve an operation, handing back its undo data
    pub fn take(&mut self, id: OpId) -> Option<PendingOp> {
        self.ops.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of creates still in flight
    pub fn creates(&self) -> usize {
        self.ops
            .values()
            .filter(|op| matches!(op, PendingOp::Create { .. }))
            .count()
    }

    /// Whether a delete of `task_id` is in flight
    pub fn deleting(&self, task_id: &TaskId) -> bool {
        self.ops
            .values()
            .any(|op| matches!(op, PendingOp::Delete { snapshot } if &snapshot.id == task_id))
    }

    /// Rollback value of the next toggle of `task_id` recorded after `op`
    pub fn next_toggle_mut(&mut self, op: OpId, task_id: &TaskId) -> Option<&mut bool> {
        self.ops
            .iter_mut()
            .filter(|(id, _)| **id > op)
            .filter_map(|(id, pending)| match pending {
                PendingOp::Toggle { task_id: toggled, previous } if toggled == task_id => Some((*id, previous)),
                _ => None,
            })
            .min_by_key(|(id, _)| *id)
            .map(|(_, previous)| previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ListId, UserId};
    use chrono::Utc;

    #[test]
    fn test_record_and_take() {
        let mut ops = PendingOps::default();
        let toggle = ops.record(PendingOp::Toggle {
            task_id: TaskId::from("t1"),
            previous: false,
        });
        assert_eq!(ops.len(), 1);
        assert_eq!(ops.creates(), 0);

        assert_eq!(
            ops.take(toggle),
            Some(PendingOp::Toggle {
                task_id: TaskId::from("t1"),
                previous: false
            })
        );
        assert!(ops.take(toggle).is_none());
        assert!(ops.is_empty());
    }

    #[test]
    fn test_next_toggle_skips_other_tasks_and_earlier_ops() {
        let mut ops = PendingOps::default();
        let a = TaskId::from("a");
        let first = ops.record(PendingOp::Toggle {
            task_id: a.clone(),
            previous: false,
        });
        let middle = ops.record(PendingOp::Toggle {
            task_id: a.clone(),
            previous: true,
        });
        ops.record(PendingOp::Toggle {
            task_id: TaskId::from("b"),
            previous: true,
        });
        let last = ops.record(PendingOp::Toggle {
            task_id: a.clone(),
            previous: false,
        });

        // the closest later toggle takes over the rollback value
        if let Some(previous) = ops.next_toggle_mut(first, &a) {
            *previous = false;
        }
        assert_eq!(
            ops.take(middle),
            Some(PendingOp::Toggle {
                task_id: a.clone(),
                previous: false
            })
        );
        assert!(ops.next_toggle_mut(last, &a).is_none());
        assert!(ops.next_toggle_mut(first, &TaskId::from("c")).is_none());
    }

    #[test]
    fn test_deleting_tracks_in_flight_deletes() {
        let mut ops = PendingOps::default();
        let snapshot = Task::draft(
            TaskId::from("t1"),
            ListId::from("l1"),
            "Gone".to_string(),
            UserId::from("u1"),
            Utc::now(),
        );
        let delete = ops.record(PendingOp::Delete { snapshot });

        assert!(ops.deleting(&TaskId::from("t1")));
        assert!(!ops.deleting(&TaskId::from("t2")));
        ops.take(delete);
        assert!(!ops.deleting(&TaskId::from("t1")));
    }
}
