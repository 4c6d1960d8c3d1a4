//! Change events and their wire payload.
//!
//! Payload shape:
//! `{"eventType": "INSERT" | "UPDATE" | "DELETE", "new": {..}, "old": {..}}`.
//! Inserts and updates carry the full row in `new`; deletes carry at least the
//! primary key in `old`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::{ListId, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A parsed change notification for one task
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Inserted(Task),
    Updated(Task),
    Deleted(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("payload is not a change event: {0}")]
    Shape(String),
    #[error("{0:?} event has no usable record: {1}")]
    Record(ChangeKind, String),
}

#[derive(Deserialize)]
struct RawChange {
    #[serde(rename = "eventType")]
    event_type: ChangeKind,
    #[serde(default)]
    new: Option<Value>,
    #[serde(default)]
    old: Option<Value>,
}

#[derive(Deserialize)]
struct RecordKey {
    id: TaskId,
}

impl ChangeEvent {
    pub fn from_payload(payload: &Value) -> Result<Self, EventError> {
        let raw = RawChange::deserialize(payload).map_err(|e| EventError::Shape(e.to_string()))?;
        let kind = raw.event_type;

        match kind {
            ChangeKind::Insert => record::<Task>(kind, raw.new).map(ChangeEvent::Inserted),
            ChangeKind::Update => record::<Task>(kind, raw.new).map(ChangeEvent::Updated),
            ChangeKind::Delete => record::<RecordKey>(kind, raw.old).map(|key| ChangeEvent::Deleted(key.id)),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Inserted(_) => ChangeKind::Insert,
            ChangeEvent::Updated(_) => ChangeKind::Update,
            ChangeEvent::Deleted(_) => ChangeKind::Delete,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        match self {
            ChangeEvent::Inserted(task) | ChangeEvent::Updated(task) => &task.id,
            ChangeEvent::Deleted(id) => id,
        }
    }

    /// List the record belongs to, when the event carries it
    pub fn list_id(&self) -> Option<&ListId> {
        match self {
            ChangeEvent::Inserted(task) | ChangeEvent::Updated(task) => Some(&task.list_id),
            ChangeEvent::Deleted(_) => None,
        }
    }
}

fn record<T: for<'de> Deserialize<'de>>(kind: ChangeKind, value: Option<Value>) -> Result<T, EventError> {
    let value = value.ok_or_else(|| EventError::Record(kind, "missing".to_string()))?;
    serde_json::from_value(value).map_err(|e| EventError::Record(kind, e.to_string()))
}

/// Payload announcing `kind` for `task` (the prior row, for deletes)
pub fn payload_for(kind: ChangeKind, task: &Task) -> Value {
    match kind {
        ChangeKind::Insert | ChangeKind::Update => json!({
            "eventType": kind,
            "new": task,
            "old": {},
        }),
        ChangeKind::Delete => json!({
            "eventType": kind,
            "new": {},
            "old": task,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::UserId;

    fn task() -> Task {
        Task::draft(TaskId::from("t1"), ListId::from("l1"), "Buy milk".to_string(), UserId::from("u1"), Utc::now())
    }

    #[test]
    fn test_parses_platform_insert() {
        let payload = json!({
            "schema": "public",
            "table": "todos",
            "eventType": "INSERT",
            "new": {
                "id": "t1", "list_id": "l1", "title": "Buy milk", "is_done": false,
                "created_by": "u1",
                "created_at": "2024-05-01T10:00:00+00:00",
                "updated_at": "2024-05-01T10:00:00+00:00"
            },
            "old": {}
        });
        let event = ChangeEvent::from_payload(&payload).unwrap();
        assert_eq!(event.kind(), ChangeKind::Insert);
        assert_eq!(event.task_id(), &TaskId::from("t1"));
        assert_eq!(event.list_id(), Some(&ListId::from("l1")));
    }

    #[test]
    fn test_delete_needs_only_the_key() {
        let payload = json!({"eventType": "DELETE", "new": {}, "old": {"id": "t1"}});
        assert_eq!(
            ChangeEvent::from_payload(&payload).unwrap(),
            ChangeEvent::Deleted(TaskId::from("t1"))
        );
    }

    #[test]
    fn test_published_payloads_parse_back() {
        let task = task();
        let updated = ChangeEvent::from_payload(&payload_for(ChangeKind::Update, &task)).unwrap();
        assert_eq!(updated, ChangeEvent::Updated(task.clone()));
        let deleted = ChangeEvent::from_payload(&payload_for(ChangeKind::Delete, &task)).unwrap();
        assert_eq!(deleted, ChangeEvent::Deleted(task.id));
    }

    #[test]
    fn test_malformed_payloads_are_errors() {
        let unknown_kind = json!({"eventType": "TRUNCATE"});
        assert!(matches!(ChangeEvent::from_payload(&unknown_kind), Err(EventError::Shape(_))));

        let not_an_object = json!("INSERT");
        assert!(matches!(ChangeEvent::from_payload(&not_an_object), Err(EventError::Shape(_))));

        let partial_insert = json!({"eventType": "INSERT", "new": {"id": "t1"}});
        assert!(matches!(
            ChangeEvent::from_payload(&partial_insert),
            Err(EventError::Record(ChangeKind::Insert, _))
        ));

        let keyless_delete = json!({"eventType": "DELETE", "old": {}});
        assert!(matches!(
            ChangeEvent::from_payload(&keyless_delete),
            Err(EventError::Record(ChangeKind::Delete, _))
        ));
    }
}
