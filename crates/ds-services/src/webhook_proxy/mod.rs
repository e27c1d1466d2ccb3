//! Jenkins webhook proxy adapter
//!
//! The proxy is not one endpoint but a family of them: each project gets
//! its own host of the form `webhook-proxy-{projectKey}-cd.{clusterBase}`,
//! where the cluster base comes from the configured instance URL. Builds
//! are triggered with a per-project secret passed as a query parameter.

mod commands;

pub use commands::{TriggerBuildCommand, TriggerBuildRequest};

use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use ds_connect::{ClientFactory, ClientHandle};

use crate::error::ServiceError;
use crate::http;

const SYSTEM: &str = "webhook-proxy";

/// Webhook proxy operations, addressed by instance (cluster) name.
pub struct WebhookProxyService {
    factory: Arc<ClientFactory>,
}

impl WebhookProxyService {
    pub fn new(factory: Arc<ClientFactory>) -> Self {
        Self { factory }
    }

    pub fn has_instance(&self, name: &str) -> bool {
        self.factory.has_instance(name)
    }

    fn handle_for(&self, instance: Option<&str>) -> Result<ClientHandle, ServiceError> {
        match instance {
            Some(name) => Ok(self.factory.client_for(name)?),
            None => Ok(self.factory.client()?),
        }
    }

    /// Per-project proxy URL. The instance URL names the cluster base; any
    /// scheme prefix on it is dropped before the host is assembled.
    pub fn build_url(handle: &ClientHandle, project_key: &str) -> String {
        derive_url(handle.config().base_url.as_str(), project_key)
    }

    /// Trigger a build for one component of a project.
    pub async fn trigger_build(
        &self,
        instance: Option<&str>,
        project_key: &str,
        trigger_secret: &str,
        component: &str,
        branch: Option<&str>,
    ) -> Result<(), ServiceError> {
        let handle = self.handle_for(instance)?;
        let url = Self::build_url(&handle, project_key);
        let resource = format!("build trigger for project '{project_key}'");
        let body = json!({
            "component": component,
            "branch": branch,
        });
        let builder = handle
            .http()
            .post(&url)
            .query(&[("trigger_secret", trigger_secret)])
            .json(&body);
        http::send_expect_success(SYSTEM, &handle, &resource, builder).await?;
        Ok(())
    }

    /// Configuration-presence probe. The proxy hosts are per-project, so
    /// there is no single endpoint to call without a project key; a
    /// resolvable instance with a cluster base counts as reachable.
    /// Never fails.
    pub async fn validate_connection(&self, instance: Option<&str>) -> bool {
        match self.handle_for(instance) {
            Ok(handle) => !handle.config().base_url.is_empty(),
            Err(err) => {
                warn!(system = SYSTEM, error = %err, "Connection validation failed");
                false
            }
        }
    }

    /// Aggregated health: `true` if any instance is configured.
    pub async fn is_healthy(&self) -> bool {
        for name in self.factory.available_instances() {
            if self.validate_connection(Some(&name)).await {
                return true;
            }
        }
        false
    }
}

fn derive_url(base: &str, project_key: &str) -> String {
    let cluster_base = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .unwrap_or(base);
    format!(
        "https://webhook-proxy-{}-cd.{cluster_base}/build",
        project_key.to_lowercase()
    )
}
