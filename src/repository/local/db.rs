//! Database Connection and Setup
//!
//! Opens the SQLite store and runs migrations.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, Row};
use std::path::Path;

use crate::domain::{DomainError, DomainResult};

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => DomainError::NotFound("no matching row".to_string()),
            rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
                DomainError::Conflict(msg.unwrap_or_else(|| err.to_string()))
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

/// Open (or create) the database at `path`, in memory when `None`
pub fn open_connection(path: Option<&Path>) -> DomainResult<Connection> {
    let conn = match path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            Connection::open(path)?
        }
        None => Connection::open_in_memory()?,
    };

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            salt TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS todo_lists (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            owner TEXT NOT NULL REFERENCES profiles(id),
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS list_members (
            list_id TEXT NOT NULL REFERENCES todo_lists(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES profiles(id),
            role TEXT NOT NULL DEFAULT 'editor',
            PRIMARY KEY (list_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS connections (
            id TEXT PRIMARY KEY,
            requester TEXT NOT NULL REFERENCES profiles(id),
            addressee TEXT NOT NULL REFERENCES profiles(id),
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            UNIQUE (requester, addressee),
            CHECK (requester <> addressee)
        );

        CREATE TABLE IF NOT EXISTS todos (
            id TEXT PRIMARY KEY,
            list_id TEXT NOT NULL REFERENCES todo_lists(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            is_done INTEGER NOT NULL DEFAULT 0,
            created_by TEXT NOT NULL REFERENCES profiles(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )?;

    // Indexes for the per-list and per-user lookups
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_todos_list ON todos(list_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_members_user ON list_members(user_id);
        CREATE INDEX IF NOT EXISTS idx_connections_addressee ON connections(addressee, status);",
    )?;

    Ok(())
}

/// Current time at the precision the store keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width text form, so string order matches time order
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn read_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
