//! Task Repository Implementation

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::db::{new_id, now, read_timestamp, timestamp};
use super::{require_member, LocalBackend};
use crate::domain::{DomainError, DomainResult, ListId, Task, TaskId, TaskPatch};
use crate::realtime::{payload_for, ChangeKind};
use crate::repository::TaskRepository;

const TASK_COLUMNS: &str = "id, list_id, title, is_done, created_by, created_at, updated_at";

/// Convert a database row to Task
pub(super) fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId::new(row.get::<_, String>(0)?),
        list_id: ListId::new(row.get::<_, String>(1)?),
        title: row.get(2)?,
        is_done: row.get(3)?,
        created_by: row.get::<_, String>(4)?.into(),
        created_at: read_timestamp(row, 5)?,
        updated_at: read_timestamp(row, 6)?,
    })
}

fn find_task(conn: &Connection, id: &TaskId) -> DomainResult<Task> {
    conn.query_row(
        &format!("SELECT {} FROM todos WHERE id = ?1", TASK_COLUMNS),
        [id.as_str()],
        row_to_task,
    )
    .optional()?
    .ok_or_else(|| DomainError::NotFound(format!("Task {} not found", id)))
}

pub(super) fn tasks_of_list(conn: &Connection, list_id: &ListId) -> DomainResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM todos WHERE list_id = ?1 ORDER BY created_at ASC, rowid ASC",
        TASK_COLUMNS
    ))?;
    let rows = stmt.query_map([list_id.as_str()], row_to_task)?;
    let tasks = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

#[async_trait]
impl TaskRepository for LocalBackend {
    async fn create_task(&self, list_id: &ListId, title: &str) -> DomainResult<Task> {
        let user = self.require_user().await?;
        let task = {
            let conn = self.conn.lock().await;
            require_member(&conn, list_id, &user)?;

            let created = now();
            let task = Task {
                id: TaskId::new(new_id()),
                list_id: list_id.clone(),
                title: title.to_string(),
                is_done: false,
                created_by: user,
                created_at: created,
                updated_at: created,
            };
            conn.execute(
                "INSERT INTO todos (id, list_id, title, is_done, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.id.as_str(),
                    task.list_id.as_str(),
                    task.title,
                    task.is_done,
                    task.created_by.as_str(),
                    timestamp(&task.created_at),
                    timestamp(&task.updated_at),
                ],
            )?;
            task
        };

        self.publish(list_id, payload_for(ChangeKind::Insert, &task));
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> DomainResult<()> {
        let user = self.require_user().await?;
        let task = {
            let conn = self.conn.lock().await;
            let mut task = find_task(&conn, id)?;
            require_member(&conn, &task.list_id, &user)?;

            patch.apply(&mut task, now());
            conn.execute(
                "UPDATE todos SET title = ?1, is_done = ?2, updated_at = ?3 WHERE id = ?4",
                params![task.title, task.is_done, timestamp(&task.updated_at), task.id.as_str()],
            )?;
            task
        };

        self.publish(&task.list_id, payload_for(ChangeKind::Update, &task));
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> DomainResult<()> {
        let user = self.require_user().await?;
        let task = {
            let conn = self.conn.lock().await;
            let task = find_task(&conn, id)?;
            require_member(&conn, &task.list_id, &user)?;
            conn.execute("DELETE FROM todos WHERE id = ?1", [id.as_str()])?;
            task
        };

        self.publish(&task.list_id, payload_for(ChangeKind::Delete, &task));
        Ok(())
    }

    async fn list_tasks(&self, list_id: &ListId) -> DomainResult<Vec<Task>> {
        let user = self.require_user().await?;
        let conn = self.conn.lock().await;
        require_member(&conn, list_id, &user)?;
        tasks_of_list(&conn, list_id)
    }
}
