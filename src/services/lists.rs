//! List overview and detail

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::current_user;
use crate::domain::{validation, DomainError, DomainResult, ListId, Member, Task, TodoList};
use crate::repository::{AuthGateway, ListRepository, MembershipRepository, TaskRepository};

/// One row of the lists overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSummary {
    pub list: TodoList,
    pub member_count: usize,
    pub is_owner: bool,
}

impl ListSummary {
    pub fn label(&self) -> &'static str {
        if self.is_owner {
            "Owner"
        } else {
            "Shared with you"
        }
    }
}

/// Everything the list page shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDetail {
    pub list: TodoList,
    pub members: Vec<Member>,
    pub tasks: Vec<Task>,
    pub is_owner: bool,
}

pub struct ListService<B: ?Sized> {
    backend: Arc<B>,
}

impl<B> ListService<B>
where
    B: ListRepository + MembershipRepository + TaskRepository + AuthGateway + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn create(&self, title: &str) -> DomainResult<TodoList> {
        let title = validation::list_title(title)?;
        let owner = current_user(&*self.backend).await?;
        self.backend.create_list(&owner, &title).await
    }

    pub async fn delete(&self, id: &ListId) -> DomainResult<()> {
        self.backend.delete_list(id).await
    }

    /// Visible lists, newest first
    pub async fn overview(&self) -> DomainResult<Vec<ListSummary>> {
        let user = current_user(&*self.backend).await?;
        let lists = self.backend.visible_lists().await?;
        Ok(lists
            .into_iter()
            .map(|entry| ListSummary {
                is_owner: entry.list.is_owned_by(&user),
                member_count: entry.members.len(),
                list: entry.list,
            })
            .collect())
    }

    pub async fn detail(&self, id: &ListId) -> DomainResult<ListDetail> {
        let user = current_user(&*self.backend).await?;
        let list = self
            .backend
            .find_list(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("List {} not found", id)))?;
        let tasks = self.backend.list_tasks(id).await?;
        let members = self.backend.members(id).await?;

        Ok(ListDetail {
            is_owner: list.is_owned_by(&user),
            list,
            members,
            tasks,
        })
    }
}
