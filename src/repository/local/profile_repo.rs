//! Profile Repository Implementation

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::LocalBackend;
use crate::domain::{DomainResult, Profile, UserId};
use crate::repository::ProfileRepository;

/// Escape LIKE wildcards so the query matches literally
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ProfileRepository for LocalBackend {
    async fn find_profile(&self, id: &UserId) -> DomainResult<Option<Profile>> {
        let conn = self.conn.lock().await;
        let profile = conn
            .query_row("SELECT id, username FROM profiles WHERE id = ?1", [id.as_str()], |row| {
                Ok(Profile {
                    id: row.get::<_, String>(0)?.into(),
                    username: row.get(1)?,
                })
            })
            .optional()?;
        Ok(profile)
    }

    async fn search_profiles(&self, query: &str, exclude: &UserId, limit: usize) -> DomainResult<Vec<Profile>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, username FROM profiles
             WHERE username LIKE ?1 ESCAPE '\\' AND id <> ?2
             ORDER BY username
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![like_pattern(query), exclude.as_str(), limit as i64], |row| {
            Ok(Profile {
                id: row.get::<_, String>(0)?.into(),
                username: row.get(1)?,
            })
        })?;
        let profiles = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }
}
