//! Read-only registry of configured instances for one external system

use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

use ds_config::{InstanceSettings, SystemConfig};

use crate::ConnectError;

/// Credential material for one instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    Token(String),
    Basic { username: String, password: String },
    Anonymous,
}

/// Runtime form of one instance's connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceConfig {
    pub name: String,
    pub base_url: String,
    pub credential: Credential,
    pub namespace: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub trust_all_certificates: bool,
}

impl InstanceConfig {
    fn from_settings(name: &str, settings: &InstanceSettings) -> Self {
        let credential = if let Some(token) = &settings.token {
            Credential::Token(token.clone())
        } else if let Some(username) = &settings.username {
            Credential::Basic {
                username: username.clone(),
                password: settings.password.clone().unwrap_or_default(),
            }
        } else {
            Credential::Anonymous
        };

        Self {
            name: name.to_string(),
            base_url: settings.url.trim_end_matches('/').to_string(),
            credential,
            namespace: settings.namespace.clone(),
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            read_timeout: Duration::from_millis(settings.read_timeout_ms),
            trust_all_certificates: settings.trust_all_certificates,
        }
    }
}

/// Mapping from instance name to configuration for one external system.
/// Built once at startup; insertion order is preserved because the first
/// entry is the implicit default.
#[derive(Debug)]
pub struct InstanceRegistry {
    system: String,
    instances: IndexMap<String, Arc<InstanceConfig>>,
    default_instance: Option<String>,
}

impl InstanceRegistry {
    /// Build a registry from a system's configuration section.
    pub fn from_system_config(system: impl Into<String>, config: &SystemConfig) -> Self {
        let system = system.into();
        let instances = config
            .instances
            .iter()
            .map(|(name, settings)| {
                (
                    name.clone(),
                    Arc::new(InstanceConfig::from_settings(name, settings)),
                )
            })
            .collect();

        Self {
            system,
            instances,
            default_instance: config
                .default_instance
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// System label used in error messages ("bitbucket", "openshift", ...).
    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn has_instance(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// Configured instance names, in configuration order.
    pub fn available_instances(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<InstanceConfig>> {
        self.instances.get(name).cloned()
    }

    /// The default instance name: the explicit pointer when configured,
    /// otherwise the first instance in configuration order.
    pub fn resolve_default_name(&self) -> Result<&str, ConnectError> {
        if let Some(default) = &self.default_instance {
            return Ok(default);
        }
        self.instances
            .keys()
            .next()
            .map(String::as_str)
            .ok_or_else(|| ConnectError::NoInstancesConfigured {
                system: self.system.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_config::AppConfig;

    fn two_instance_registry(default: Option<&str>) -> InstanceRegistry {
        let default_line = default
            .map(|d| format!("default-instance = \"{d}\""))
            .unwrap_or_default();
        let toml = format!(
            r#"
            [bitbucket]
            {default_line}

            [bitbucket.instances.dev]
            url = "https://bitbucket-dev.example.com"
            token = "t1"

            [bitbucket.instances.prod]
            url = "https://bitbucket.example.com/"
            username = "svc"
            password = "secret"
            "#
        );
        let config = AppConfig::from_toml_str(&toml).unwrap();
        InstanceRegistry::from_system_config("bitbucket", &config.bitbucket)
    }

    #[test]
    fn default_is_first_inserted_without_pointer() {
        let registry = two_instance_registry(None);
        assert_eq!(registry.resolve_default_name().unwrap(), "dev");
    }

    #[test]
    fn explicit_default_wins() {
        let registry = two_instance_registry(Some("prod"));
        assert_eq!(registry.resolve_default_name().unwrap(), "prod");
    }

    #[test]
    fn empty_registry_has_no_default() {
        let config = AppConfig::default();
        let registry = InstanceRegistry::from_system_config("jira", &config.jira);
        let err = registry.resolve_default_name().unwrap_err();
        assert_eq!(err.code(), "NO_INSTANCES_CONFIGURED");
    }

    #[test]
    fn credentials_prefer_token_over_basic() {
        let registry = two_instance_registry(None);
        let dev = registry.get("dev").unwrap();
        assert_eq!(dev.credential, Credential::Token("t1".into()));

        let prod = registry.get("prod").unwrap();
        assert_eq!(
            prod.credential,
            Credential::Basic {
                username: "svc".into(),
                password: "secret".into()
            }
        );
        // Trailing slash on the configured URL is normalized away.
        assert_eq!(prod.base_url, "https://bitbucket.example.com");
    }
}
