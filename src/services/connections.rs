//! Finding people and managing connection requests

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::current_user;
use crate::domain::validation::{self, SEARCH_LIMIT};
use crate::domain::{Connection, ConnectionId, ConnectionStatus, DomainResult, IncomingRequest, Profile, UserId};
use crate::repository::{AuthGateway, ConnectionRepository, ProfileRepository};

/// An accepted connection seen from the signed-in user's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub connection_id: ConnectionId,
    pub profile: Profile,
}

pub struct ConnectionService<B: ?Sized> {
    backend: Arc<B>,
}

impl<B> ConnectionService<B>
where
    B: ConnectionRepository + ProfileRepository + AuthGateway + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Users whose name contains `query`; a blank query finds nobody
    pub async fn search(&self, query: &str) -> DomainResult<Vec<Profile>> {
        let Some(query) = validation::search_query(query) else {
            return Ok(Vec::new());
        };
        let user = current_user(&*self.backend).await?;
        self.backend.search_profiles(&query, &user, SEARCH_LIMIT).await
    }

    pub async fn invite(&self, addressee: &UserId) -> DomainResult<Connection> {
        let user = current_user(&*self.backend).await?;
        self.backend.request_connection(&user, addressee).await
    }

    pub async fn respond(&self, id: &ConnectionId, accept: bool) -> DomainResult<()> {
        let status = if accept {
            ConnectionStatus::Accepted
        } else {
            ConnectionStatus::Rejected
        };
        log::debug!("Answering connection {} with {}", id, status.as_str());
        self.backend.set_connection_status(id, status).await
    }

    pub async fn incoming(&self) -> DomainResult<Vec<IncomingRequest>> {
        let user = current_user(&*self.backend).await?;
        self.backend.incoming_requests(&user).await
    }

    pub async fn contacts(&self) -> DomainResult<Vec<Contact>> {
        let user = current_user(&*self.backend).await?;
        let accepted = self.backend.accepted_connections(&user).await?;
        Ok(accepted
            .iter()
            .map(|connection| Contact {
                connection_id: connection.id.clone(),
                profile: connection.other_party(&user).clone(),
            })
            .collect())
    }
}
