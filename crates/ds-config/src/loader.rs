//! Configuration loader with file search and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "devstack.toml",
    "./config/config.toml",
    "./config/devstack.toml",
    "/etc/devstack/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable
    /// overrides applied on top.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// `load` with an injectable environment lookup, so override precedence
    /// is testable without mutating process-global state.
    fn load_with_env(
        &self,
        env_var: impl Fn(&str) -> Option<String>,
    ) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_env_overrides(&mut config, env_var);
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use: explicit path, then
    /// DEVSTACK_CONFIG, then the standard search paths.
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("DEVSTACK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

}

/// Apply environment variable overrides on top of file values.
fn apply_env_overrides(config: &mut AppConfig, env_var: impl Fn(&str) -> Option<String>) {
    // HTTP
    if let Some(val) = env_var("DEVSTACK_HTTP_PORT") {
        if let Ok(port) = val.parse() {
            config.server.port = port;
        }
    }
    if let Some(val) = env_var("DEVSTACK_HTTP_HOST") {
        config.server.host = val;
    }
    if let Some(val) = env_var("DEVSTACK_CORS_ORIGINS") {
        config.server.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
    }

    // Per-system default instance pointers
    if let Some(val) = env_var("DEVSTACK_BITBUCKET_DEFAULT_INSTANCE") {
        config.bitbucket.default_instance = Some(val);
    }
    if let Some(val) = env_var("DEVSTACK_JIRA_DEFAULT_INSTANCE") {
        config.jira.default_instance = Some(val);
    }
    if let Some(val) = env_var("DEVSTACK_OPENSHIFT_DEFAULT_INSTANCE") {
        config.openshift.default_instance = Some(val);
    }
    if let Some(val) = env_var("DEVSTACK_AAP_DEFAULT_INSTANCE") {
        config.aap.default_instance = Some(val);
    }
    if let Some(val) = env_var("DEVSTACK_UIPATH_DEFAULT_INSTANCE") {
        config.uipath.default_instance = Some(val);
    }
    if let Some(val) = env_var("DEVSTACK_WEBHOOK_PROXY_DEFAULT_INSTANCE") {
        config.webhook_proxy.default_instance = Some(val);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [server]
            port = 9191

            [jira.instances.main]
            url = "https://jira.example.com"
            "#
        )
        .unwrap();

        let config = ConfigLoader::with_path(file.path()).load().unwrap();
        assert_eq!(config.server.port, 9191);
        assert!(config.jira.is_configured());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let loader = ConfigLoader::with_path("/nonexistent/devstack.toml");
        // No standard-path config files exist in the test environment.
        let config = loader.load().unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.bitbucket.is_configured());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [server]
            host = "127.0.0.1"
            port = 9191

            [jira]
            default-instance = "dev"

            [jira.instances.dev]
            url = "https://jira-dev.example.com"

            [jira.instances.prod]
            url = "https://jira.example.com"
            "#
        )
        .unwrap();

        let env = |key: &str| match key {
            "DEVSTACK_HTTP_PORT" => Some("8888".to_string()),
            "DEVSTACK_CORS_ORIGINS" => {
                Some("https://a.example.com, https://b.example.com".to_string())
            }
            "DEVSTACK_JIRA_DEFAULT_INSTANCE" => Some("prod".to_string()),
            _ => None,
        };
        let config = ConfigLoader::with_path(file.path())
            .load_with_env(env)
            .unwrap();

        assert_eq!(config.server.port, 8888);
        // Untouched keys keep their file values.
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.jira.default_instance.as_deref(), Some("prod"));
    }

    #[test]
    fn unparseable_port_override_is_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| {
            (key == "DEVSTACK_HTTP_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.server.port, 8080);
    }
}
