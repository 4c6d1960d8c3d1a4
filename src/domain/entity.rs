//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Display + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> &Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
///
/// Cloneable and serializable so a failure can be handed to the presentation
/// layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Message without the category prefix, for user-facing alerts
    pub fn message(&self) -> &str {
        match self {
            DomainError::NotFound(msg)
            | DomainError::InvalidInput(msg)
            | DomainError::Unauthorized(msg)
            | DomainError::Conflict(msg)
            | DomainError::Network(msg)
            | DomainError::Internal(msg) => msg,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("JSON: {}", e))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Internal(format!("I/O: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_message() {
        let err = DomainError::Unauthorized("not a member of this list".to_string());
        assert_eq!(err.to_string(), "Unauthorized: not a member of this list");
        assert_eq!(err.message(), "not a member of this list");
    }

    #[test]
    fn test_error_serializes_for_presentation() {
        let err = DomainError::Conflict("duplicate".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"Conflict":"duplicate"}"#);
    }
}
