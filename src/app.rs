//! Application bootstrap
//!
//! Wires logging, the configured backend and the services together. A host
//! (CLI, desktop shell, server) creates one `App` and drives everything
//! through it.

use std::sync::Arc;

use crate::config::{AppConfig, BackendConfig};
use crate::domain::{DomainError, DomainResult, ListId};
use crate::realtime::ChangeEventSource;
use crate::repository::{AuthGateway, Backend, LocalBackend, RestBackend};
use crate::services::{AccountService, ConnectionService, ListService, SharingService};
use crate::sync::ListSession;

/// Open list bound to the application's backend
pub type AppListSession = ListSession<dyn Backend>;

pub struct App {
    config: AppConfig,
    backend: Arc<dyn Backend>,
    events: Option<Arc<dyn ChangeEventSource>>,
}

impl App {
    /// Start logging and connect the configured backend
    pub async fn bootstrap(config: AppConfig) -> DomainResult<Self> {
        config.validate()?;

        if let Some(dir) = &config.log.dir {
            if let Err(e) = rolling_logger::init_logger(dir, &config.log.app_name) {
                log::warn!("File logging unavailable: {}", e);
            }
        }

        let app = match &config.backend {
            BackendConfig::Local { db_path } => {
                let backend = Arc::new(match db_path {
                    Some(path) => LocalBackend::open(path)?,
                    None => LocalBackend::in_memory()?,
                });
                let events: Arc<dyn ChangeEventSource> = backend.clone();
                Self {
                    backend,
                    events: Some(events),
                    config,
                }
            }
            BackendConfig::Remote { url, anon_key } => {
                let backend = RestBackend::new(url, anon_key)?;
                if let Err(e) = backend.ping().await {
                    log::error!("Platform at {} is unreachable: {}", url, e);
                }
                Self {
                    backend: Arc::new(backend),
                    events: None,
                    config,
                }
            }
        };

        rolling_logger::info("Application started");
        Ok(app)
    }

    /// Assemble from an existing backend
    pub fn from_backend(backend: Arc<dyn Backend>, events: Option<Arc<dyn ChangeEventSource>>) -> Self {
        Self {
            config: AppConfig::default(),
            backend,
            events,
        }
    }

    /// Use `events` for list change streams (the REST backend has none of its own)
    pub fn with_event_source(mut self, events: Arc<dyn ChangeEventSource>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub fn lists(&self) -> ListService<dyn Backend> {
        ListService::new(self.backend.clone())
    }

    pub fn sharing(&self) -> SharingService<dyn Backend> {
        SharingService::new(self.backend.clone())
    }

    pub fn connections(&self) -> ConnectionService<dyn Backend> {
        ConnectionService::new(self.backend.clone())
    }

    pub fn accounts(&self) -> AccountService<dyn Backend> {
        AccountService::new(self.backend.clone())
    }

    /// Open a list for live editing as the signed-in user
    pub async fn open_list(&self, list_id: ListId) -> DomainResult<AppListSession> {
        let session = self
            .backend
            .current_session()
            .await
            .ok_or_else(|| DomainError::Unauthorized("Sign in to open a list".to_string()))?;
        let events = self
            .events
            .as_ref()
            .ok_or_else(|| DomainError::Internal("no change event source configured".to_string()))?;

        ListSession::open(list_id, session.user_id, self.backend.clone(), events.as_ref()).await
    }
}
