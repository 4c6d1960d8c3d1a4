//! Collaborative to-do lists
//!
//! Layered architecture:
//! - domain: Core entities, ids and input rules
//! - repository: Data access traits with a local SQLite and a REST implementation
//! - realtime: Per-list change event streams
//! - sync: Optimistic task list synchronization
//! - services: Lists, sharing, connections and accounts
//! - app: Bootstrap and wiring

pub mod app;
pub mod config;
pub mod domain;
pub mod realtime;
pub mod repository;
pub mod services;
pub mod sync;

pub use app::{App, AppListSession};
pub use config::{AppConfig, BackendConfig, LogConfig};
pub use domain::{DomainError, DomainResult};
pub use sync::{ListSession, ListSynchronizer, SyncError, SyncResult};
