//! List and Membership Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::{ListId, UserId};

/// A named collection of tasks owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: ListId,
    pub title: String,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
}

impl TodoList {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }
}

impl Entity for TodoList {
    type Id = ListId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Role granted by a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    #[default]
    Editor,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Editor => "editor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MemberRole::Owner),
            "editor" => Some(MemberRole::Editor),
            _ => None,
        }
    }
}

/// Grants a user a role on a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub list_id: ListId,
    pub user_id: UserId,
    pub role: MemberRole,
}

/// A list member as displayed, with the username when the profile is readable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub role: MemberRole,
    pub username: Option<String>,
}

impl Member {
    /// "alice (editor)", or "Unknown (editor)" without a profile
    pub fn label(&self) -> String {
        format!("{} ({})", self.username.as_deref().unwrap_or("Unknown"), self.role.as_str())
    }
}

/// A visible list together with its membership rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListWithMembers {
    #[serde(flatten)]
    pub list: TodoList,
    #[serde(rename = "list_members", default)]
    pub members: Vec<Membership>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_label() {
        let mut member = Member {
            user_id: UserId::from("u2"),
            role: MemberRole::Editor,
            username: Some("bob".to_string()),
        };
        assert_eq!(member.label(), "bob (editor)");
        member.username = None;
        assert_eq!(member.label(), "Unknown (editor)");
    }

    #[test]
    fn test_role_round_trip_names() {
        assert_eq!(MemberRole::parse(MemberRole::Owner.as_str()), Some(MemberRole::Owner));
        assert_eq!(MemberRole::parse("viewer"), None);
    }

    #[test]
    fn test_list_with_embedded_members() {
        let row = r#"{
            "id": "l1", "title": "Groceries", "owner": "u1",
            "created_at": "2024-05-01T10:00:00Z",
            "list_members": [{"list_id": "l1", "user_id": "u1", "role": "owner"}]
        }"#;
        let parsed: ListWithMembers = serde_json::from_str(row).unwrap();
        assert_eq!(parsed.list.title, "Groceries");
        assert_eq!(parsed.members.len(), 1);
        assert!(parsed.list.is_owned_by(&UserId::from("u1")));
    }
}
