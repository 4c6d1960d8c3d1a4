//! Account storage and sign-in

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::db::{new_id, now, timestamp};
use super::LocalBackend;
use crate::domain::{validation, DomainError, DomainResult, Session, UserId};
use crate::repository::AuthGateway;

const PASSWORD_CONTEXT: &str = "collab-todos 2024-05 local password";

fn hash_password(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn password_matches(salt: &str, password: &str, stored: &str) -> bool {
    match blake3::Hash::from_hex(stored) {
        Ok(expected) => hash_password(salt, password) == expected,
        Err(_) => false,
    }
}

fn invalid_credentials() -> DomainError {
    DomainError::Unauthorized("Invalid login credentials".to_string())
}

#[async_trait]
impl AuthGateway for LocalBackend {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> DomainResult<Session> {
        let email = validation::email(email)?.to_lowercase();
        let username = validation::username(username)?;
        validation::password(password)?;

        let session = {
            let conn = self.conn.lock().await;
            let email_taken = conn
                .query_row("SELECT 1 FROM profiles WHERE email = ?1", [&email], |_| Ok(()))
                .optional()?
                .is_some();
            if email_taken {
                return Err(DomainError::Conflict("User already registered".to_string()));
            }
            let username_taken = conn
                .query_row("SELECT 1 FROM profiles WHERE username = ?1", [&username], |_| Ok(()))
                .optional()?
                .is_some();
            if username_taken {
                return Err(DomainError::Conflict(format!("Username {} is already taken", username)));
            }

            let id = new_id();
            let salt = uuid::Uuid::new_v4().simple().to_string();
            let hash = hash_password(&salt, password);
            conn.execute(
                "INSERT INTO profiles (id, username, email, password_hash, salt, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, username, email, hash.to_hex().as_str(), salt, timestamp(&now())],
            )?;
            log::info!("Registered user {} ({})", username, id);

            Session {
                user_id: UserId::new(id),
                email,
                access_token: None,
            }
        };

        self.set_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let email = email.trim().to_lowercase();
        let account = {
            let conn = self.conn.lock().await;
            conn.query_row(
                "SELECT id, password_hash, salt FROM profiles WHERE email = ?1",
                [&email],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
            )
            .optional()?
        };

        let (id, stored, salt) = account.ok_or_else(invalid_credentials)?;
        if !password_matches(&salt, password, &stored) {
            log::warn!("Failed sign-in for {}", email);
            return Err(invalid_credentials());
        }

        let session = Session {
            user_id: UserId::new(id),
            email,
            access_token: None,
        };
        self.set_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        self.set_session(None).await;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> DomainResult<()> {
        validation::password(new_password)?;
        let user = self.require_user().await?;

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let hash = hash_password(&salt, new_password);
        let conn = self.conn.lock().await;
        let updated = conn.execute(
            "UPDATE profiles SET password_hash = ?1, salt = ?2 WHERE id = ?3",
            params![hash.to_hex().as_str(), salt, user.as_str()],
        )?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("User {} not found", user)));
        }
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_salted() {
        let a = hash_password("salt-a", "secret1");
        let b = hash_password("salt-b", "secret1");
        assert_ne!(a, b);
        assert!(password_matches("salt-a", "secret1", a.to_hex().as_str()));
        assert!(!password_matches("salt-a", "secret2", a.to_hex().as_str()));
        assert!(!password_matches("salt-a", "secret1", "not-hex"));
    }
}
