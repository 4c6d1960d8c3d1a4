//! GoTrue auth endpoints

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{check, RestBackend};
use crate::domain::{validation, DomainError, DomainResult, Session, UserId};
use crate::repository::AuthGateway;

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Token grant, or a bare user when sign-up awaits email confirmation
#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl AuthResponse {
    fn into_session(self, fallback_email: &str) -> DomainResult<Session> {
        let (id, email) = match self.user {
            Some(user) => (user.id, user.email),
            None => (
                self.id.ok_or_else(|| DomainError::Internal("auth response without a user".to_string()))?,
                self.email,
            ),
        };
        Ok(Session {
            user_id: UserId::new(id),
            email: email.unwrap_or_else(|| fallback_email.to_string()),
            access_token: self.access_token,
        })
    }
}

impl RestBackend {
    async fn authenticate(&self, path: &str, body: serde_json::Value, email: &str) -> DomainResult<Session> {
        let response = self.request(Method::POST, path).await.json(&body).send().await?;
        let auth: AuthResponse = check(response).await?.json().await?;
        let session = auth.into_session(email)?;
        if session.access_token.is_some() {
            *self.session.lock().await = Some(session.clone());
        } else {
            log::info!("Account {} awaits email confirmation", session.user_id);
        }
        Ok(session)
    }
}

#[async_trait]
impl AuthGateway for RestBackend {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> DomainResult<Session> {
        let email = validation::email(email)?;
        let username = validation::username(username)?;
        validation::password(password)?;

        let body = json!({ "email": email, "password": password, "data": { "username": username } });
        self.authenticate("/auth/v1/signup", body, &email).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let email = email.trim();
        let body = json!({ "email": email, "password": password });
        self.authenticate("/auth/v1/token?grant_type=password", body, email)
            .await
    }

    async fn sign_out(&self) -> DomainResult<()> {
        let signed_in = self
            .session
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| session.access_token.is_some());
        if signed_in {
            match self.request(Method::POST, "/auth/v1/logout").await.send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => log::warn!("Sign-out returned {}, clearing local session", response.status()),
                Err(e) => log::warn!("Sign-out request failed, clearing local session: {}", e),
            }
        }
        *self.session.lock().await = None;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> DomainResult<()> {
        validation::password(new_password)?;
        self.require_user().await?;
        let response = self
            .request(Method::PUT, "/auth/v1/user")
            .await
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        check(response).await?;
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
    fn test_token_grant_into_session() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"bearer","user":{"id":"u1","email":"a@b.io"}}"#,
        )
        .unwrap();
        let session = auth.into_session("fallback@b.io").unwrap();
        assert_eq!(session.user_id, UserId::from("u1"));
        assert_eq!(session.email, "a@b.io");
        assert_eq!(session.access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_unconfirmed_signup_has_no_token() {
        let auth: AuthResponse = serde_json::from_str(r#"{"id":"u2","email":"c@d.io","confirmation_sent_at":"x"}"#).unwrap();
        let session = auth.into_session("c@d.io").unwrap();
        assert_eq!(session.user_id, UserId::from("u2"));
        assert!(session.access_token.is_none());

        let empty: AuthResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_session("x@y.io").is_err());
    }
}
