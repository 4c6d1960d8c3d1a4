//! Local Backend
//!
//! Embedded SQLite implementation of every repository trait plus a realtime
//! feed. Access rules mirror the hosted platform's row policies closely enough
//! for development and tests: task access needs list membership, list deletion
//! and sharing need ownership.

mod auth;
mod connection_repo;
mod db;
mod list_repo;
mod profile_repo;
mod task_repo;

use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, ListId, MemberRole, Session, UserId};
use crate::realtime::{ChangeEventSource, ChangeHub, Subscription};

/// A client of the embedded store
pub struct LocalBackend {
    conn: Arc<Mutex<Connection>>,
    hub: ChangeHub,
    session: Mutex<Option<Session>>,
}

impl LocalBackend {
    /// Open the store at `path`
    pub fn open(path: &Path) -> DomainResult<Self> {
        log::info!("Opening local store at {}", path.display());
        Ok(Self::from_connection(db::open_connection(Some(path))?))
    }

    pub fn in_memory() -> DomainResult<Self> {
        Ok(Self::from_connection(db::open_connection(None)?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            hub: ChangeHub::new(),
            session: Mutex::new(None),
        }
    }

    /// Another signed-out client over the same store and change feed
    pub fn client(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            hub: self.hub.clone(),
            session: Mutex::new(None),
        }
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    async fn require_user(&self) -> DomainResult<UserId> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.user_id.clone())
            .ok_or_else(|| DomainError::Unauthorized("not signed in".to_string()))
    }

    async fn set_session(&self, session: Option<Session>) {
        *self.session.lock().await = session;
    }

    fn publish(&self, list_id: &ListId, payload: Value) {
        let delivered = self.hub.publish(list_id, &payload);
        log::debug!("Change on list {} delivered to {} subscribers", list_id, delivered);
    }
}

impl ChangeEventSource for LocalBackend {
    fn subscribe(&self, list_id: &ListId) -> DomainResult<Subscription> {
        self.hub.subscribe(list_id)
    }
}

/// Role of `user` on `list_id`; `NotFound` when the list doesn't exist
fn role_on_list(conn: &Connection, list_id: &ListId, user: &UserId) -> DomainResult<Option<MemberRole>> {
    let exists = conn
        .query_row("SELECT 1 FROM todo_lists WHERE id = ?1", [list_id.as_str()], |_| Ok(()))
        .optional()?
        .is_some();
    if !exists {
        return Err(DomainError::NotFound(format!("List {} not found", list_id)));
    }

    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM list_members WHERE list_id = ?1 AND user_id = ?2",
            [list_id.as_str(), user.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(role.as_deref().and_then(MemberRole::parse))
}

fn require_member(conn: &Connection, list_id: &ListId, user: &UserId) -> DomainResult<MemberRole> {
    role_on_list(conn, list_id, user)?
        .ok_or_else(|| DomainError::Unauthorized(format!("not a member of list {}", list_id)))
}

fn require_owner(conn: &Connection, list_id: &ListId, user: &UserId) -> DomainResult<()> {
    match require_member(conn, list_id, user)? {
        MemberRole::Owner => Ok(()),
        _ => Err(DomainError::Unauthorized(format!("only the owner can manage list {}", list_id))),
    }
}
