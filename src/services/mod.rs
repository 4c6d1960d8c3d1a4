//! Application Services
//!
//! Request/response glue over the repositories: each service validates input,
//! resolves the signed-in user and shapes results for presentation.

mod accounts;
mod connections;
mod lists;
mod sharing;

pub use accounts::AccountService;
pub use connections::{ConnectionService, Contact};
pub use lists::{ListDetail, ListService, ListSummary};
pub use sharing::{ShareCandidate, SharingService};

use crate::domain::{DomainError, DomainResult, UserId};
use crate::repository::AuthGateway;

/// Id of the signed-in user
async fn current_user<A: AuthGateway + ?Sized>(auth: &A) -> DomainResult<UserId> {
    auth.current_session()
        .await
        .map(|session| session.user_id)
        .ok_or_else(|| DomainError::Unauthorized("Sign in to continue".to_string()))
}
