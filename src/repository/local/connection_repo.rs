//! Connection Repository Implementation

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::db::{new_id, now, timestamp};
use super::LocalBackend;
use crate::domain::{
    AcceptedConnection, Connection, ConnectionId, ConnectionStatus, DomainError, DomainResult, IncomingRequest,
    Profile, UserId,
};
use crate::repository::ConnectionRepository;

fn profile_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get::<_, String>(idx)?.into(),
        username: row.get(idx + 1)?,
    })
}

#[async_trait]
impl ConnectionRepository for LocalBackend {
    async fn request_connection(&self, requester: &UserId, addressee: &UserId) -> DomainResult<Connection> {
        let user = self.require_user().await?;
        if &user != requester {
            return Err(DomainError::Unauthorized("requests can only be sent as yourself".to_string()));
        }
        if requester == addressee {
            return Err(DomainError::InvalidInput("You cannot connect with yourself".to_string()));
        }

        let conn = self.conn.lock().await;
        let addressee_exists = conn
            .query_row("SELECT 1 FROM profiles WHERE id = ?1", [addressee.as_str()], |_| Ok(()))
            .optional()?
            .is_some();
        if !addressee_exists {
            return Err(DomainError::NotFound(format!("User {} not found", addressee)));
        }

        let existing = conn
            .query_row(
                "SELECT status FROM connections
                 WHERE (requester = ?1 AND addressee = ?2) OR (requester = ?2 AND addressee = ?1)",
                [requester.as_str(), addressee.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if let Some(status) = existing {
            return Err(DomainError::Conflict(format!("A connection already exists ({})", status)));
        }

        let connection = Connection {
            id: ConnectionId::new(new_id()),
            requester: requester.clone(),
            addressee: addressee.clone(),
            status: ConnectionStatus::Pending,
            created_at: now(),
        };
        conn.execute(
            "INSERT INTO connections (id, requester, addressee, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                connection.id.as_str(),
                connection.requester.as_str(),
                connection.addressee.as_str(),
                connection.status.as_str(),
                timestamp(&connection.created_at),
            ],
        )?;
        log::info!("Connection request {} -> {}", requester, addressee);
        Ok(connection)
    }

    async fn set_connection_status(&self, id: &ConnectionId, status: ConnectionStatus) -> DomainResult<()> {
        let user = self.require_user().await?;
        let conn = self.conn.lock().await;
        let addressee: String = conn
            .query_row("SELECT addressee FROM connections WHERE id = ?1", [id.as_str()], |row| row.get(0))
            .optional()?
            .ok_or_else(|| DomainError::NotFound(format!("Connection {} not found", id)))?;
        if addressee != user.as_str() {
            return Err(DomainError::Unauthorized("only the addressee can answer a request".to_string()));
        }

        conn.execute(
            "UPDATE connections SET status = ?1 WHERE id = ?2",
            [status.as_str(), id.as_str()],
        )?;
        Ok(())
    }

    async fn incoming_requests(&self, user: &UserId) -> DomainResult<Vec<IncomingRequest>> {
        self.require_user().await?;
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT c.id, p.id, p.username
             FROM connections c
             JOIN profiles p ON p.id = c.requester
             WHERE c.addressee = ?1 AND c.status = ?2
             ORDER BY c.created_at DESC, c.rowid DESC",
        )?;
        let rows = stmt.query_map([user.as_str(), ConnectionStatus::Pending.as_str()], |row| {
            Ok(IncomingRequest {
                id: ConnectionId::new(row.get::<_, String>(0)?),
                requester: profile_at(row, 1)?,
            })
        })?;
        let requests = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    async fn accepted_connections(&self, user: &UserId) -> DomainResult<Vec<AcceptedConnection>> {
        self.require_user().await?;
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT c.id, r.id, r.username, a.id, a.username
             FROM connections c
             JOIN profiles r ON r.id = c.requester
             JOIN profiles a ON a.id = c.addressee
             WHERE c.status = ?2 AND (c.requester = ?1 OR c.addressee = ?1)
             ORDER BY c.created_at, c.rowid",
        )?;
        let rows = stmt.query_map([user.as_str(), ConnectionStatus::Accepted.as_str()], |row| {
            Ok(AcceptedConnection {
                id: ConnectionId::new(row.get::<_, String>(0)?),
                requester: profile_at(row, 1)?,
                addressee: profile_at(row, 3)?,
            })
        })?;
        let connections = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(connections)
    }
}
