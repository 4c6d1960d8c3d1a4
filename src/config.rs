//! Application configuration
//!
//! Stored as `collab_todos.json` in the app directory. Environment variables
//! override the file so a deployment can point at a platform without editing
//! it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, DomainResult};

pub const CONFIG_FILE: &str = "collab_todos.json";

pub const ENV_URL: &str = "COLLAB_TODOS_URL";
pub const ENV_ANON_KEY: &str = "COLLAB_TODOS_ANON_KEY";
pub const ENV_DB: &str = "COLLAB_TODOS_DB";

/// Where data lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Embedded store; in memory when no path is set
    Local {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        db_path: Option<PathBuf>,
    },
    /// Hosted platform
    Remote { url: String, anon_key: String },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local { db_path: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log directory; file logging is off without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

fn default_app_name() -> String {
    "collab-todos".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            app_name: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn remote(url: &str, anon_key: &str) -> Self {
        Self {
            backend: BackendConfig::Remote {
                url: url.trim().to_string(),
                anon_key: anon_key.trim().to_string(),
            },
            ..Default::default()
        }
    }

    pub fn local(db_path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::Local {
                db_path: Some(db_path.into()),
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let BackendConfig::Remote { url, anon_key } = &self.backend {
            let host = url
                .strip_prefix("https://")
                .or_else(|| url.strip_prefix("http://"))
                .unwrap_or_default();
            if host.trim_matches('/').is_empty() {
                return Err(DomainError::InvalidInput(format!("'{}' is not an http(s) URL", url)));
            }
            if anon_key.trim().is_empty() {
                return Err(DomainError::InvalidInput("The anon key cannot be empty".to_string()));
            }
        }
        if self.log.app_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("The log name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let url = lookup(ENV_URL).filter(|v| !v.trim().is_empty());
        let anon_key = lookup(ENV_ANON_KEY).filter(|v| !v.trim().is_empty());
        if let (Some(url), Some(anon_key)) = (url, anon_key) {
            self.backend = BackendConfig::Remote {
                url: url.trim().to_string(),
                anon_key: anon_key.trim().to_string(),
            };
        } else if let Some(db) = lookup(ENV_DB).filter(|v| !v.trim().is_empty()) {
            self.backend = BackendConfig::Local {
                db_path: Some(PathBuf::from(db)),
            };
        }
        self
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Read the saved configuration, `None` when there is none yet
pub fn load_config(dir: &Path) -> DomainResult<Option<AppConfig>> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    let config = serde_json::from_str(&content)?;
    Ok(Some(config))
}

pub fn save_config(dir: &Path, config: &AppConfig) -> DomainResult<()> {
    config.validate()?;
    std::fs::create_dir_all(dir)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path(dir), content)?;
    log::info!("Saved configuration to {}", config_path(dir).display());
    Ok(())
}

/// Saved configuration (or defaults) with environment overrides applied
pub fn resolve(dir: &Path) -> DomainResult<AppConfig> {
    let config = load_config(dir)?
        .unwrap_or_default()
        .with_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
