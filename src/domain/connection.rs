//! Connection Entity
//!
//! A request/accept relationship between two users. Lists can only be shared
//! with accepted connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::{ConnectionId, UserId};
use super::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ConnectionStatus::Pending),
            "accepted" => Some(ConnectionStatus::Accepted),
            "rejected" => Some(ConnectionStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub requester: UserId,
    pub addressee: UserId,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn involves(&self, user: &UserId) -> bool {
        &self.requester == user || &self.addressee == user
    }
}

impl Entity for Connection {
    type Id = ConnectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Pending request addressed to the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRequest {
    pub id: ConnectionId,
    pub requester: Profile,
}

/// Accepted connection with both parties resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedConnection {
    pub id: ConnectionId,
    pub requester: Profile,
    pub addressee: Profile,
}

impl AcceptedConnection {
    /// The party that isn't `viewer`
    pub fn other_party(&self, viewer: &UserId) -> &Profile {
        if &self.requester.id == viewer {
            &self.addressee
        } else {
            &self.requester
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str) -> Profile {
        Profile {
            id: UserId::from(id),
            username: name.to_string(),
        }
    }

    #[test]
    fn test_other_party_either_direction() {
        let conn = AcceptedConnection {
            id: ConnectionId::from("c1"),
            requester: profile("u1", "alice"),
            addressee: profile("u2", "bob"),
        };
        assert_eq!(conn.other_party(&UserId::from("u1")).username, "bob");
        assert_eq!(conn.other_party(&UserId::from("u2")).username, "alice");
    }

    #[test]
    fn test_status_names() {
        assert_eq!(ConnectionStatus::parse("accepted"), Some(ConnectionStatus::Accepted));
        assert_eq!(ConnectionStatus::Rejected.as_str(), "rejected");
        assert_eq!(ConnectionStatus::parse("blocked"), None);
    }
}
