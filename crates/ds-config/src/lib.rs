//! DevStack Configuration System
//!
//! TOML-based configuration with environment variable override support.
//! Each external system (Bitbucket, Jira, OpenShift, AAP, UiPath, webhook
//! proxy) gets a section of named instances; instance order in the file is
//! preserved, because the first configured instance acts as the implicit
//! default when no `default-instance` pointer is set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bitbucket: SystemConfig,
    pub jira: SystemConfig,
    pub openshift: SystemConfig,
    pub aap: SystemConfig,
    pub uipath: SystemConfig,
    pub webhook_proxy: SystemConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec![],
        }
    }
}

/// Configuration for one external system: named instances plus an optional
/// explicit default. Iteration order of `instances` follows the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SystemConfig {
    /// Instance used when a request does not name one. When absent, the
    /// first configured instance is the default.
    pub default_instance: Option<String>,

    pub instances: IndexMap<String, InstanceSettings>,
}

impl SystemConfig {
    /// Whether any instance is configured for this system.
    pub fn is_configured(&self) -> bool {
        !self.instances.is_empty()
    }
}

/// Connection settings for one configured instance of an external system.
/// Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstanceSettings {
    /// Base URL of the remote API (for the webhook proxy this is the
    /// cluster base domain the per-project URL is derived from).
    pub url: String,

    /// Bearer/API token. Takes precedence over username/password.
    pub token: Option<String>,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Default namespace/tenant (OpenShift namespace, UiPath folder, ...).
    pub namespace: Option<String>,

    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,

    /// Accept invalid TLS certificates for this instance only. Development
    /// use; never affects other instances or process-wide TLS defaults.
    pub trust_all_certificates: bool,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: None,
            username: None,
            password: None,
            namespace: None,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
            trust_all_certificates: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (system, cfg) in self.systems() {
            for (name, instance) in &cfg.instances {
                if instance.url.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "{system} instance '{name}' has an empty url"
                    )));
                }
            }
            if let Some(default) = &cfg.default_instance {
                if !default.trim().is_empty() && !cfg.instances.contains_key(default) {
                    return Err(ConfigError::ValidationError(format!(
                        "{system} default-instance '{default}' is not a configured instance"
                    )));
                }
            }
        }
        Ok(())
    }

    /// All system sections with their labels, for validation and health
    /// reporting.
    pub fn systems(&self) -> [(&'static str, &SystemConfig); 6] {
        [
            ("bitbucket", &self.bitbucket),
            ("jira", &self.jira),
            ("openshift", &self.openshift),
            ("aap", &self.aap),
            ("uipath", &self.uipath),
            ("webhook-proxy", &self.webhook_proxy),
        ]
    }
}
