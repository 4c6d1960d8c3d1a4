//! Table access over PostgREST

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{Query, RestBackend};
use crate::domain::{
    AcceptedConnection, Connection, ConnectionId, ConnectionStatus, DomainError, DomainResult, IncomingRequest,
    ListId, ListWithMembers, Member, MemberRole, Membership, Profile, Task, TaskId, TaskPatch, TodoList, UserId,
};
use crate::repository::{
    ConnectionRepository, ListRepository, MembershipRepository, ProfileRepository, TaskRepository,
};

#[derive(Deserialize)]
struct Username {
    username: String,
}

#[derive(Deserialize)]
struct MemberRow {
    user_id: UserId,
    #[serde(default)]
    role: MemberRole,
    profiles: Option<Username>,
}

#[derive(Deserialize)]
struct IncomingRow {
    id: ConnectionId,
    requester_profile: Option<Profile>,
}

#[derive(Deserialize)]
struct AcceptedRow {
    id: ConnectionId,
    requester_profile: Option<Profile>,
    addressee_profile: Option<Profile>,
}

fn not_found_unless_changed(changed: usize, what: String) -> DomainResult<()> {
    if changed == 0 {
        return Err(DomainError::NotFound(what));
    }
    Ok(())
}

#[async_trait]
impl TaskRepository for RestBackend {
    async fn create_task(&self, list_id: &ListId, title: &str) -> DomainResult<Task> {
        self.insert("todos", &json!({ "list_id": list_id, "title": title })).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> DomainResult<()> {
        let body = serde_json::to_value(patch)?;
        let changed = self
            .modify(Method::PATCH, "todos", &Query::new().eq("id", id), Some(&body))
            .await?;
        not_found_unless_changed(changed, format!("Task {} not found", id))
    }

    async fn delete_task(&self, id: &TaskId) -> DomainResult<()> {
        let changed = self
            .modify(Method::DELETE, "todos", &Query::new().eq("id", id), None)
            .await?;
        not_found_unless_changed(changed, format!("Task {} not found", id))
    }

    async fn list_tasks(&self, list_id: &ListId) -> DomainResult<Vec<Task>> {
        let query = Query::new()
            .select("*")
            .eq("list_id", list_id)
            .order("created_at", true);
        self.fetch("todos", &query).await
    }
}

#[async_trait]
impl ListRepository for RestBackend {
    async fn create_list(&self, owner: &UserId, title: &str) -> DomainResult<TodoList> {
        let list: TodoList = self
            .insert("todo_lists", &json!({ "title": title, "owner": owner }))
            .await?;
        log::info!("Created list {}", list.id);
        Ok(list)
    }

    async fn find_list(&self, id: &ListId) -> DomainResult<Option<TodoList>> {
        let query = Query::new().select("id, title, owner, created_at").eq("id", id);
        let mut lists: Vec<TodoList> = self.fetch("todo_lists", &query).await?;
        Ok(lists.pop())
    }

    async fn visible_lists(&self) -> DomainResult<Vec<ListWithMembers>> {
        let query = Query::new()
            .select("id, title, owner, created_at, list_members(list_id, user_id, role)")
            .order("created_at", false);
        self.fetch("todo_lists", &query).await
    }

    async fn delete_list(&self, id: &ListId) -> DomainResult<()> {
        let changed = self
            .modify(Method::DELETE, "todo_lists", &Query::new().eq("id", id), None)
            .await?;
        not_found_unless_changed(changed, format!("List {} not found", id))
    }
}

#[async_trait]
impl MembershipRepository for RestBackend {
    async fn members(&self, list_id: &ListId) -> DomainResult<Vec<Member>> {
        let query = Query::new()
            .select("user_id, role, profiles(username)")
            .eq("list_id", list_id);
        let rows: Vec<MemberRow> = self.fetch("list_members", &query).await?;
        Ok(rows
            .into_iter()
            .map(|row| Member {
                user_id: row.user_id,
                role: row.role,
                username: row.profiles.map(|p| p.username),
            })
            .collect())
    }

    async fn add_member(&self, list_id: &ListId, user_id: &UserId, role: MemberRole) -> DomainResult<Membership> {
        self.insert(
            "list_members",
            &json!({ "list_id": list_id, "user_id": user_id, "role": role }),
        )
        .await
    }
}

#[async_trait]
impl ConnectionRepository for RestBackend {
    async fn request_connection(&self, requester: &UserId, addressee: &UserId) -> DomainResult<Connection> {
        if requester == addressee {
            return Err(DomainError::InvalidInput("You cannot connect with yourself".to_string()));
        }
        self.insert("connections", &json!({ "requester": requester, "addressee": addressee }))
            .await
    }

    async fn set_connection_status(&self, id: &ConnectionId, status: ConnectionStatus) -> DomainResult<()> {
        let changed = self
            .modify(
                Method::PATCH,
                "connections",
                &Query::new().eq("id", id),
                Some(&json!({ "status": status })),
            )
            .await?;
        not_found_unless_changed(changed, format!("Connection {} not found", id))
    }

    async fn incoming_requests(&self, user: &UserId) -> DomainResult<Vec<IncomingRequest>> {
        let query = Query::new()
            .select("id, requester_profile:profiles!connections_requester_fkey(id, username)")
            .eq("addressee", user)
            .eq("status", ConnectionStatus::Pending.as_str());
        let rows: Vec<IncomingRow> = self.fetch("connections", &query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(IncomingRequest {
                    id: row.id,
                    requester: row.requester_profile?,
                })
            })
            .collect())
    }

    async fn accepted_connections(&self, user: &UserId) -> DomainResult<Vec<AcceptedConnection>> {
        let query = Query::new()
            .select(
                "id, requester_profile:profiles!connections_requester_fkey(id, username), \
                 addressee_profile:profiles!connections_addressee_fkey(id, username)",
            )
            .eq("status", ConnectionStatus::Accepted.as_str())
            .or(&format!("requester.eq.{},addressee.eq.{}", user, user));
        let rows: Vec<AcceptedRow> = self.fetch("connections", &query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(AcceptedConnection {
                    id: row.id,
                    requester: row.requester_profile?,
                    addressee: row.addressee_profile?,
                })
            })
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for RestBackend {
    async fn find_profile(&self, id: &UserId) -> DomainResult<Option<Profile>> {
        let query = Query::new().select("id, username").eq("id", id);
        let mut profiles: Vec<Profile> = self.fetch("profiles", &query).await?;
        Ok(profiles.pop())
    }

    async fn search_profiles(&self, query: &str, exclude: &UserId, limit: usize) -> DomainResult<Vec<Profile>> {
        let query = Query::new()
            .select("id, username")
            .ilike("username", &format!("%{}%", query))
            .neq("id", exclude)
            .limit(limit);
        self.fetch("profiles", &query).await
    }
}
