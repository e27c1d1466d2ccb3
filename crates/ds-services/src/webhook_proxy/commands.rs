//! Webhook proxy commands

use std::sync::Arc;

use crate::command::{check_optional_instance, non_blank, Command, CommandError};
use crate::error::ExternalServiceError;

use super::WebhookProxyService;

const SERVICE: &str = "webhook-proxy";
const SYSTEM_LABEL: &str = "Webhook proxy";

/// Request to trigger a component build.
#[derive(Debug, Clone)]
pub struct TriggerBuildRequest {
    pub instance: Option<String>,
    pub project_key: String,
    pub trigger_secret: String,
    pub component: String,
    pub branch: Option<String>,
}

pub struct TriggerBuildCommand {
    service: Arc<WebhookProxyService>,
}

impl Command for TriggerBuildCommand {
    fn name(&self) -> &'static str {
        "trigger-build"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl TriggerBuildCommand {
    pub fn new(service: Arc<WebhookProxyService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &TriggerBuildRequest) -> Result<(), CommandError> {
        non_blank(&req.project_key, "projectKey")?;
        non_blank(&req.trigger_secret, "triggerSecret")?;
        non_blank(&req.component, "component")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &TriggerBuildRequest) -> Result<(), CommandError> {
        self.validate(req)?;
        self.service
            .trigger_build(
                req.instance.as_deref(),
                req.project_key.trim(),
                req.trigger_secret.trim(),
                req.component.trim(),
                req.branch.as_deref().map(str::trim),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap("TRIGGER_BUILD_FAILED", SERVICE, "triggerBuild", err)
                    .into()
            })
    }
}
