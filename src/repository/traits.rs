//! Repository Layer - Core Traits
//!
//! Abstract interfaces for the data the application reads and writes. The
//! backing store and its access policies belong to the platform; a client
//! carries its signed-in session, so operations act as that user.

use async_trait::async_trait;

use crate::domain::{
    AcceptedConnection, Connection, ConnectionId, ConnectionStatus, DomainResult, IncomingRequest, ListId,
    ListWithMembers, Member, MemberRole, Membership, Profile, Session, Task, TaskId, TaskPatch, TodoList, UserId,
};

/// Tasks of a list
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a task; the store assigns id, creator and timestamps
    async fn create_task(&self, list_id: &ListId, title: &str) -> DomainResult<Task>;

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> DomainResult<()>;

    async fn delete_task(&self, id: &TaskId) -> DomainResult<()>;

    /// All tasks of a list, oldest first
    async fn list_tasks(&self, list_id: &ListId) -> DomainResult<Vec<Task>>;
}

#[async_trait]
pub trait ListRepository: Send + Sync {
    async fn create_list(&self, owner: &UserId, title: &str) -> DomainResult<TodoList>;

    async fn find_list(&self, id: &ListId) -> DomainResult<Option<TodoList>>;

    /// Lists the session can see with their memberships, newest first
    async fn visible_lists(&self) -> DomainResult<Vec<ListWithMembers>>;

    async fn delete_list(&self, id: &ListId) -> DomainResult<()>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Members of a list, with usernames where readable
    async fn members(&self, list_id: &ListId) -> DomainResult<Vec<Member>>;

    async fn add_member(&self, list_id: &ListId, user_id: &UserId, role: MemberRole) -> DomainResult<Membership>;
}

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn request_connection(&self, requester: &UserId, addressee: &UserId) -> DomainResult<Connection>;

    async fn set_connection_status(&self, id: &ConnectionId, status: ConnectionStatus) -> DomainResult<()>;

    /// Pending requests addressed to `user`
    async fn incoming_requests(&self, user: &UserId) -> DomainResult<Vec<IncomingRequest>>;

    /// Accepted connections in either direction
    async fn accepted_connections(&self, user: &UserId) -> DomainResult<Vec<AcceptedConnection>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_profile(&self, id: &UserId) -> DomainResult<Option<Profile>>;

    /// Case-insensitive username substring match, excluding `exclude`
    async fn search_profiles(&self, query: &str, exclude: &UserId, limit: usize) -> DomainResult<Vec<Profile>>;
}

/// Account and session management
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> DomainResult<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session>;

    async fn sign_out(&self) -> DomainResult<()>;

    async fn update_password(&self, new_password: &str) -> DomainResult<()>;

    async fn current_session(&self) -> Option<Session>;
}

/// Everything a client of the platform provides
pub trait Backend:
    TaskRepository + ListRepository + MembershipRepository + ConnectionRepository + ProfileRepository + AuthGateway
{
}

impl<T> Backend for T where
    T: TaskRepository + ListRepository + MembershipRepository + ConnectionRepository + ProfileRepository + AuthGateway
{
}
