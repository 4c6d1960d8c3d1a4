//! Domain Layer
//!
//! Entities, identifiers and input rules shared by every other layer.
//! This layer has no I/O.

mod connection;
mod entity;
mod ids;
mod list;
mod profile;
mod task;
pub mod validation;

pub use connection::{AcceptedConnection, Connection, ConnectionStatus, IncomingRequest};
pub use entity::{DomainError, DomainResult, Entity};
pub use ids::{ConnectionId, ListId, TaskId, UserId};
pub use list::{ListWithMembers, Member, MemberRole, Membership, TodoList};
pub use profile::{Profile, Session};
pub use task::{Task, TaskPatch};
