//! Repository Layer
//!
//! Data access abstractions and their implementations: an embedded SQLite
//! store for development and tests, and a REST client for the hosted
//! platform.

mod traits;
pub mod local;
pub mod rest;

#[cfg(test)]
mod tests;

pub use local::LocalBackend;
pub use rest::RestBackend;
pub use traits::{
    AuthGateway, Backend, ConnectionRepository, ListRepository, MembershipRepository, ProfileRepository,
    TaskRepository,
};
