//! Typed identifiers
//!
//! The backing platform hands out opaque string ids; each entity gets its own
//! newtype so a list id can't be passed where a task id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identity of a to-do item
    TaskId
);
string_id!(
    /// Identity of a to-do list
    ListId
);
string_id!(
    /// Identity of a user (same value as their profile id)
    UserId
);
string_id!(ConnectionId);

const TEMPORARY_PREFIX: &str = "temp-";

impl TaskId {
    /// Local placeholder used until the backend assigns the real id
    pub fn temporary(seq: u64) -> Self {
        Self(format!("{}{}", TEMPORARY_PREFIX, seq))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_ids() {
        let id = TaskId::temporary(7);
        assert_eq!(id.as_str(), "temp-7");
        assert!(id.is_temporary());
        assert!(!TaskId::from("3f2a").is_temporary());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&ListId::new("l1")).unwrap();
        assert_eq!(json, r#""l1""#);
        let back: UserId = serde_json::from_str(r#""u9""#).unwrap();
        assert_eq!(back, UserId::from("u9"));
    }
}
