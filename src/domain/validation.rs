//! Input rules applied before any request is issued.

use regex::Regex;
use std::sync::OnceLock;

use super::entity::{DomainError, DomainResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const SEARCH_LIMIT: usize = 10;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Trimmed task title; empty is rejected
pub fn task_title(raw: &str) -> DomainResult<String> {
    non_empty(raw, "Task title")
}

/// Trimmed list title; empty is rejected
pub fn list_title(raw: &str) -> DomainResult<String> {
    non_empty(raw, "List title")
}

/// Trimmed search text, `None` when there is nothing to search for
pub fn search_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn password(new_password: &str) -> DomainResult<()> {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::InvalidInput(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn password_change(new_password: &str, confirmation: &str) -> DomainResult<()> {
    password(new_password)?;
    if new_password != confirmation {
        return Err(DomainError::InvalidInput("Passwords do not match.".to_string()));
    }
    Ok(())
}

pub fn email(raw: &str) -> DomainResult<String> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();

    let trimmed = raw.trim();
    let valid = EMAIL
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(trimmed));
    if !valid {
        return Err(DomainError::InvalidInput(format!("'{}' is not a valid email address", trimmed)));
    }
    Ok(trimmed.to_string())
}

pub fn username(raw: &str) -> DomainResult<String> {
    non_empty(raw, "Username")
}

fn non_empty(raw: &str, what: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles_are_trimmed() {
        assert_eq!(task_title("  Buy milk \n").unwrap(), "Buy milk");
        assert!(task_title(" \t ").is_err());
        assert!(list_title("").is_err());
    }

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("  bo "), Some("bo".to_string()));
        assert_eq!(search_query("   "), None);
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(
            password_change("abc", "abc").unwrap_err().message(),
            "Password must be at least 6 characters."
        );
        assert_eq!(
            password_change("abcdef", "abcdeg").unwrap_err().message(),
            "Passwords do not match."
        );
        assert!(password_change("abcdef", "abcdef").is_ok());
    }

    #[test]
    fn test_email_shape() {
        assert_eq!(email(" alice@example.com ").unwrap(), "alice@example.com");
        assert!(email("alice").is_err());
        assert!(email("alice@localhost").is_err());
    }
}
