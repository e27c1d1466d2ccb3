//! Per-instance HTTP client factory with a concurrent lazy cache

use dashmap::DashMap;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use crate::registry::{Credential, InstanceConfig, InstanceRegistry};
use crate::ConnectError;

/// Cache key. Default resolution gets its own slot, separate from caching by
/// explicit name, because the resolved default can change between
/// configuration reloads and `clear_cache`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Default,
    Named(String),
}

/// A configured HTTP client bound to one instance. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    config: Arc<InstanceConfig>,
    http: Client,
}

impl ClientHandle {
    pub fn instance_name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.inner.config
    }

    pub fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Absolute URL for a path under this instance's base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.inner.config.base_url,
            path.trim_start_matches('/')
        )
    }

    /// Request builder for a path, with this instance's credential applied.
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.inner.http.request(method, self.url(path));
        match &self.inner.config.credential {
            Credential::Token(token) => builder.bearer_auth(token),
            Credential::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            Credential::Anonymous => builder,
        }
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }
}

/// Resolves instance names to cached, lazily-constructed HTTP clients for
/// one external system.
///
/// Concurrent first use of the same name may race to construct a handle; the
/// losing construction is discarded. Callers never observe a partial handle.
#[derive(Debug)]
pub struct ClientFactory {
    registry: Arc<InstanceRegistry>,
    cache: DashMap<CacheKey, ClientHandle>,
}

impl ClientFactory {
    pub fn new(registry: Arc<InstanceRegistry>) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
        }
    }

    pub fn system(&self) -> &str {
        self.registry.system()
    }

    pub fn has_instance(&self, name: &str) -> bool {
        self.registry.has_instance(name)
    }

    pub fn available_instances(&self) -> Vec<String> {
        self.registry.available_instances()
    }

    /// The instance name `client()` would resolve: the explicit
    /// `default-instance` when configured, else the first configured
    /// instance, else `NoInstancesConfigured`.
    pub fn resolve_default_instance_name(&self) -> Result<String, ConnectError> {
        self.registry.resolve_default_name().map(str::to_string)
    }

    /// Client for the default instance.
    pub fn client(&self) -> Result<ClientHandle, ConnectError> {
        if let Some(handle) = self.cache.get(&CacheKey::Default) {
            return Ok(handle.clone());
        }

        let name = self.resolve_default_instance_name()?;
        let handle = self.build_handle(&name)?;
        let handle = self
            .cache
            .entry(CacheKey::Default)
            .or_insert(handle)
            .clone();
        Ok(handle)
    }

    /// Client for a named instance. The name must be non-blank and
    /// configured; use `client()` for default resolution.
    pub fn client_for(&self, name: &str) -> Result<ClientHandle, ConnectError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConnectError::MissingInstanceName {
                system: self.registry.system().to_string(),
                available: self.registry.available_instances(),
            });
        }

        let key = CacheKey::Named(name.to_string());
        if let Some(handle) = self.cache.get(&key) {
            return Ok(handle.clone());
        }

        let handle = self.build_handle(name)?;
        let handle = self.cache.entry(key).or_insert(handle).clone();
        Ok(handle)
    }

    /// Discard all cached handles; subsequent calls rebuild from
    /// configuration. Maintenance operation, not part of the request path.
    /// In-flight holders of an already-resolved handle keep using it.
    pub fn clear_cache(&self) {
        debug!(system = self.registry.system(), "Clearing client cache");
        self.cache.clear();
    }

    fn build_handle(&self, name: &str) -> Result<ClientHandle, ConnectError> {
        let config = self.registry.get(name).ok_or_else(|| {
            ConnectError::InstanceNotConfigured {
                system: self.registry.system().to_string(),
                name: name.to_string(),
                available: self.registry.available_instances(),
            }
        })?;

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout);

        if config.trust_all_certificates {
            // Scoped to this one client; other instances and the process
            // TLS defaults are unaffected.
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|source| ConnectError::ClientBuild {
                system: self.registry.system().to_string(),
                name: name.to_string(),
                source,
            })?;

        debug!(
            system = self.registry.system(),
            instance = name,
            "Constructed HTTP client"
        );

        Ok(ClientHandle {
            inner: Arc::new(HandleInner { config, http }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_config::AppConfig;

    fn factory_from_toml(toml: &str) -> ClientFactory {
        let config = AppConfig::from_toml_str(toml).unwrap();
        let registry =
            InstanceRegistry::from_system_config("bitbucket", &config.bitbucket);
        ClientFactory::new(Arc::new(registry))
    }

    fn two_instance_factory(default_line: &str) -> ClientFactory {
        factory_from_toml(&format!(
            r#"
            [bitbucket]
            {default_line}

            [bitbucket.instances.dev]
            url = "https://url-a.example.com"

            [bitbucket.instances.prod]
            url = "https://url-b.example.com"
            "#
        ))
    }

    #[test]
    fn default_client_uses_first_inserted_instance() {
        let factory = two_instance_factory("");
        let handle = factory.client().unwrap();
        assert_eq!(handle.instance_name(), "dev");
        assert_eq!(handle.config().base_url, "https://url-a.example.com");
    }

    #[test]
    fn default_client_honors_explicit_pointer() {
        let factory = two_instance_factory(r#"default-instance = "prod""#);
        let handle = factory.client().unwrap();
        assert_eq!(handle.instance_name(), "prod");
    }

    #[test]
    fn named_lookup_succeeds_iff_configured() {
        let factory = two_instance_factory("");
        assert_eq!(factory.client_for("prod").unwrap().instance_name(), "prod");

        let err = factory.client_for("qa").unwrap_err();
        assert_eq!(err.code(), "INSTANCE_NOT_CONFIGURED");
        assert!(err.to_string().contains("dev, prod"));
    }

    #[test]
    fn blank_name_is_rejected_with_available_list() {
        let factory = two_instance_factory("");
        let err = factory.client_for("  ").unwrap_err();
        assert_eq!(err.code(), "MISSING_INSTANCE_NAME");
        assert!(err.to_string().contains("dev, prod"));
    }

    #[test]
    fn empty_registry_fails_default_resolution() {
        let factory = factory_from_toml("");
        let err = factory.client().unwrap_err();
        assert_eq!(err.code(), "NO_INSTANCES_CONFIGURED");
    }

    #[test]
    fn repeated_lookups_return_the_same_binding() {
        let factory = two_instance_factory("");
        let first = factory.client_for("dev").unwrap();
        let second = factory.client_for("dev").unwrap();
        // Cache hit: same inner allocation.
        assert!(Arc::ptr_eq(&first.inner, &second.inner));

        factory.clear_cache();
        let third = factory.client_for("dev").unwrap();
        // Rebuilt handle, same instance binding.
        assert!(!Arc::ptr_eq(&first.inner, &third.inner));
        assert_eq!(third.instance_name(), "dev");
        assert_eq!(third.config(), first.config());
    }

    #[test]
    fn default_slot_is_separate_from_named_slot() {
        let factory = two_instance_factory("");
        let by_default = factory.client().unwrap();
        let by_name = factory.client_for("dev").unwrap();
        assert_eq!(by_default.instance_name(), by_name.instance_name());
        // Two slots, so two constructions are allowed.
        assert_eq!(factory.cache.len(), 2);
    }

    #[test]
    fn concurrent_first_use_yields_consistent_handles() {
        let factory = Arc::new(two_instance_factory(""));
        let mut joins = Vec::new();
        for _ in 0..16 {
            let factory = Arc::clone(&factory);
            joins.push(std::thread::spawn(move || {
                factory.client_for("dev").unwrap().instance_name().to_string()
            }));
        }
        for join in joins {
            assert_eq!(join.join().unwrap(), "dev");
        }
        // Exactly one handle survives in the named slot.
        assert_eq!(factory.cache.len(), 1);
    }

    #[test]
    fn url_joins_paths_cleanly() {
        let factory = two_instance_factory("");
        let handle = factory.client_for("dev").unwrap();
        assert_eq!(
            handle.url("/rest/api/1.0/projects"),
            "https://url-a.example.com/rest/api/1.0/projects"
        );
        assert_eq!(
            handle.url("rest/api/1.0/projects"),
            "https://url-a.example.com/rest/api/1.0/projects"
        );
    }
}
