//! Sign up, sign in and profile

use std::sync::Arc;

use super::current_user;
use crate::domain::{validation, DomainResult, Profile, Session};
use crate::repository::{AuthGateway, ProfileRepository};

pub struct AccountService<B: ?Sized> {
    backend: Arc<B>,
}

impl<B> AccountService<B>
where
    B: AuthGateway + ProfileRepository + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn sign_up(&self, email: &str, password: &str, username: &str) -> DomainResult<Session> {
        let username = validation::username(username)?;
        let email = validation::email(email)?;
        validation::password(password)?;
        self.backend.sign_up(&email, password, &username).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let session = self.backend.sign_in(email.trim(), password).await?;
        log::info!("Signed in as {}", session.user_id);
        Ok(session)
    }

    pub async fn sign_out(&self) -> DomainResult<()> {
        self.backend.sign_out().await
    }

    pub async fn session(&self) -> Option<Session> {
        self.backend.current_session().await
    }

    /// Profile of the signed-in user
    pub async fn profile(&self) -> DomainResult<Option<Profile>> {
        let user = current_user(&*self.backend).await?;
        self.backend.find_profile(&user).await
    }

    pub async fn change_password(&self, new_password: &str, confirmation: &str) -> DomainResult<()> {
        validation::password_change(new_password, confirmation)?;
        self.backend.update_password(new_password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::repository::LocalBackend;

    fn service() -> AccountService<LocalBackend> {
        AccountService::new(Arc::new(LocalBackend::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let accounts = service();

        assert!(matches!(
            accounts.sign_up("a@b.io", "secret1", "  ").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            accounts.sign_up("nope", "secret1", "al").await,
            Err(DomainError::InvalidInput(_))
        ));
        assert_eq!(
            accounts.sign_up("a@b.io", "12345", "al").await,
            Err(DomainError::InvalidInput("Password must be at least 6 characters.".to_string()))
        );
        assert!(accounts.session().await.is_none());
    }

    #[tokio::test]
    async fn test_profile_and_password_change() {
        let accounts = service();
        accounts.sign_up(" al@b.io ", "secret1", " al ").await.unwrap();

        let profile = accounts.profile().await.unwrap().unwrap();
        assert_eq!(profile.username, "al");
        assert_eq!(profile.initial(), Some('A'));

        assert_eq!(
            accounts.change_password("secret2", "secret3").await,
            Err(DomainError::InvalidInput("Passwords do not match.".to_string()))
        );
        accounts.change_password("secret2", "secret2").await.unwrap();

        accounts.sign_out().await.unwrap();
        assert!(matches!(accounts.profile().await, Err(DomainError::Unauthorized(_))));
        assert!(accounts.sign_in("al@b.io", "secret1").await.is_err());
        accounts.sign_in(" al@b.io", "secret2").await.unwrap();
    }
}
