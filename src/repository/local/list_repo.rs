//! List and Membership Repository Implementation

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::db::{new_id, now, read_timestamp, timestamp};
use super::task_repo::tasks_of_list;
use super::{require_owner, role_on_list, LocalBackend};
use crate::domain::{
    ConnectionStatus, DomainError, DomainResult, ListId, ListWithMembers, Member, MemberRole, Membership, TodoList,
    UserId,
};
use crate::realtime::{payload_for, ChangeKind};
use crate::repository::{ListRepository, MembershipRepository};

fn row_to_list(row: &Row<'_>) -> rusqlite::Result<TodoList> {
    Ok(TodoList {
        id: ListId::new(row.get::<_, String>(0)?),
        title: row.get(1)?,
        owner: row.get::<_, String>(2)?.into(),
        created_at: read_timestamp(row, 3)?,
    })
}

fn row_to_membership(row: &Row<'_>) -> rusqlite::Result<Membership> {
    let role: String = row.get(2)?;
    Ok(Membership {
        list_id: ListId::new(row.get::<_, String>(0)?),
        user_id: row.get::<_, String>(1)?.into(),
        role: MemberRole::parse(&role).unwrap_or_default(),
    })
}

fn memberships_of(conn: &Connection, list_id: &ListId) -> DomainResult<Vec<Membership>> {
    let mut stmt = conn.prepare("SELECT list_id, user_id, role FROM list_members WHERE list_id = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map([list_id.as_str()], row_to_membership)?;
    let members = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(members)
}

fn connected(conn: &Connection, a: &UserId, b: &UserId) -> DomainResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM connections
             WHERE status = ?3
               AND ((requester = ?1 AND addressee = ?2) OR (requester = ?2 AND addressee = ?1))",
            params![a.as_str(), b.as_str(), ConnectionStatus::Accepted.as_str()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

#[async_trait]
impl ListRepository for LocalBackend {
    async fn create_list(&self, owner: &UserId, title: &str) -> DomainResult<TodoList> {
        let user = self.require_user().await?;
        if &user != owner {
            return Err(DomainError::Unauthorized("lists can only be created for yourself".to_string()));
        }

        let list = TodoList {
            id: ListId::new(new_id()),
            title: title.to_string(),
            owner: owner.clone(),
            created_at: now(),
        };

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO todo_lists (id, title, owner, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![list.id.as_str(), list.title, list.owner.as_str(), timestamp(&list.created_at)],
        )?;
        tx.execute(
            "INSERT INTO list_members (list_id, user_id, role) VALUES (?1, ?2, ?3)",
            params![list.id.as_str(), list.owner.as_str(), MemberRole::Owner.as_str()],
        )?;
        tx.commit()?;

        log::info!("Created list {} for {}", list.id, list.owner);
        Ok(list)
    }

    async fn find_list(&self, id: &ListId) -> DomainResult<Option<TodoList>> {
        let user = self.require_user().await?;
        let conn = self.conn.lock().await;
        let list = conn
            .query_row(
                "SELECT l.id, l.title, l.owner, l.created_at
                 FROM todo_lists l
                 JOIN list_members m ON m.list_id = l.id
                 WHERE l.id = ?1 AND m.user_id = ?2",
                [id.as_str(), user.as_str()],
                row_to_list,
            )
            .optional()?;
        Ok(list)
    }

    async fn visible_lists(&self) -> DomainResult<Vec<ListWithMembers>> {
        let user = self.require_user().await?;
        let conn = self.conn.lock().await;
        let lists = {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.title, l.owner, l.created_at
                 FROM todo_lists l
                 JOIN list_members m ON m.list_id = l.id
                 WHERE m.user_id = ?1
                 ORDER BY l.created_at DESC, l.rowid DESC",
            )?;
            let rows = stmt.query_map([user.as_str()], row_to_list)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        lists
            .into_iter()
            .map(|list| -> DomainResult<ListWithMembers> {
                let members = memberships_of(&conn, &list.id)?;
                Ok(ListWithMembers { list, members })
            })
            .collect()
    }

    async fn delete_list(&self, id: &ListId) -> DomainResult<()> {
        let user = self.require_user().await?;
        let removed = {
            let conn = self.conn.lock().await;
            require_owner(&conn, id, &user)?;
            let tasks = tasks_of_list(&conn, id)?;
            conn.execute("DELETE FROM todo_lists WHERE id = ?1", [id.as_str()])?;
            tasks
        };

        log::info!("Deleted list {} with {} tasks", id, removed.len());
        for task in &removed {
            self.publish(id, payload_for(ChangeKind::Delete, task));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for LocalBackend {
    async fn members(&self, list_id: &ListId) -> DomainResult<Vec<Member>> {
        let user = self.require_user().await?;
        let conn = self.conn.lock().await;
        if role_on_list(&conn, list_id, &user)?.is_none() {
            return Err(DomainError::Unauthorized(format!("not a member of list {}", list_id)));
        }

        let mut stmt = conn.prepare(
            "SELECT m.user_id, m.role, p.username
             FROM list_members m
             LEFT JOIN profiles p ON p.id = m.user_id
             WHERE m.list_id = ?1
             ORDER BY m.rowid",
        )?;
        let rows = stmt.query_map([list_id.as_str()], |row| {
            let role: String = row.get(1)?;
            Ok(Member {
                user_id: row.get::<_, String>(0)?.into(),
                role: MemberRole::parse(&role).unwrap_or_default(),
                username: row.get(2)?,
            })
        })?;
        let members = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    async fn add_member(&self, list_id: &ListId, user_id: &UserId, role: MemberRole) -> DomainResult<Membership> {
        let user = self.require_user().await?;
        let conn = self.conn.lock().await;
        require_owner(&conn, list_id, &user)?;

        if role_on_list(&conn, list_id, user_id)?.is_some() {
            return Err(DomainError::Conflict(format!("{} is already a member", user_id)));
        }
        if !connected(&conn, &user, user_id)? {
            return Err(DomainError::Unauthorized(format!("{} is not one of your connections", user_id)));
        }

        conn.execute(
            "INSERT INTO list_members (list_id, user_id, role) VALUES (?1, ?2, ?3)",
            params![list_id.as_str(), user_id.as_str(), role.as_str()],
        )?;
        log::info!("Shared list {} with {} as {}", list_id, user_id, role.as_str());

        Ok(Membership {
            list_id: list_id.clone(),
            user_id: user_id.clone(),
            role,
        })
    }
}
