//! Sharing a list with connections

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::current_user;
use crate::domain::{ConnectionId, DomainError, DomainResult, ListId, MemberRole, Membership, UserId};
use crate::repository::{AuthGateway, ConnectionRepository, MembershipRepository};

/// A connection who isn't on the list yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareCandidate {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub username: String,
}

pub struct SharingService<B: ?Sized> {
    backend: Arc<B>,
}

impl<B> SharingService<B>
where
    B: ConnectionRepository + MembershipRepository + AuthGateway + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn candidates(&self, list_id: &ListId) -> DomainResult<Vec<ShareCandidate>> {
        let user = current_user(&*self.backend).await?;
        let members: HashSet<UserId> = self
            .backend
            .members(list_id)
            .await?
            .into_iter()
            .map(|member| member.user_id)
            .collect();

        let connections = self.backend.accepted_connections(&user).await?;
        Ok(connections
            .iter()
            .map(|connection| {
                let other = connection.other_party(&user);
                ShareCandidate {
                    connection_id: connection.id.clone(),
                    user_id: other.id.clone(),
                    username: other.username.clone(),
                }
            })
            .filter(|candidate| !members.contains(&candidate.user_id))
            .collect())
    }

    /// Add `user_id` to the list as an editor
    pub async fn share(&self, list_id: &ListId, user_id: &UserId) -> DomainResult<Membership> {
        if user_id.as_str().trim().is_empty() {
            return Err(DomainError::InvalidInput("Select a connection to share with".to_string()));
        }
        self.backend.add_member(list_id, user_id, MemberRole::Editor).await
    }
}
