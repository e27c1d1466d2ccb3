//! Ansible Automation Platform adapter
//!
//! Wraps the AAP job/workflow API (`/api/v2`): workflow template lookup,
//! launch, and job status polling.

mod commands;

pub use commands::{
    ExecuteWorkflowAsyncCommand, ExecuteWorkflowCommand, ExecuteWorkflowRequest,
    GetJobStatusCommand, GetJobStatusRequest,
};

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use ds_connect::{ClientFactory, ClientHandle};

use crate::error::{RemoteError, ServiceError};
use crate::http;

const SYSTEM: &str = "aap";

/// Result of launching a workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowLaunch {
    pub job_id: u64,
    pub status: String,
    pub url: Option<String>,
}

/// A workflow job as seen by status polling.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowJob {
    pub id: u64,
    pub status: String,
    pub failed: bool,
    pub finished: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TemplatePageDto {
    results: Vec<TemplateDto>,
}

#[derive(Debug, Deserialize)]
struct TemplateDto {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct LaunchDto {
    job: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobDto {
    id: u64,
    status: String,
    #[serde(default)]
    failed: bool,
    #[serde(default)]
    finished: Option<String>,
}

/// AAP business operations, addressed by instance name.
pub struct AapService {
    factory: Arc<ClientFactory>,
}

impl AapService {
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

    /// Numeric ID of a workflow job template by its exact name.
    pub async fn find_workflow_id(
        &self,
        instance: Option<&str>,
        name: &str,
    ) -> Result<u64, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("workflow template '{name}'");
        let builder = handle
            .get("api/v2/workflow_job_templates/")
            .query(&[("name", name)]);
        let page: TemplatePageDto =
            http::get_json(SYSTEM, &handle, &resource, builder).await?;
        page.results.first().map(|t| t.id).ok_or_else(|| {
            RemoteError::not_found(
                SYSTEM,
                &handle,
                format!(
                    "Workflow template '{name}' was not found on aap instance '{}'",
                    handle.instance_name()
                ),
            )
            .into()
        })
    }

    /// Launch a workflow by name with extra variables.
    pub async fn execute_workflow(
        &self,
        instance: Option<&str>,
        name: &str,
        extra_vars: serde_json::Value,
    ) -> Result<WorkflowLaunch, ServiceError> {
        let id = self.find_workflow_id(instance, name).await?;
        let handle = self.handle_for(instance)?;
        let resource = format!("launch of workflow '{name}'");
        let path = format!("api/v2/workflow_job_templates/{id}/launch/");
        let builder = handle.post(&path).json(&json!({ "extra_vars": extra_vars }));
        let dto: LaunchDto = http::get_json(SYSTEM, &handle, &resource, builder).await?;
        Ok(WorkflowLaunch {
            job_id: dto.job,
            status: dto.status.unwrap_or_else(|| "pending".to_string()),
            url: dto.url,
        })
    }

    /// Status of a previously launched workflow job.
    pub async fn get_job_status(
        &self,
        instance: Option<&str>,
        job_id: u64,
    ) -> Result<WorkflowJob, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("workflow job {job_id}");
        let path = format!("api/v2/workflow_jobs/{job_id}/");
        let dto: JobDto = http::get_json(SYSTEM, &handle, &resource, handle.get(&path)).await?;
        Ok(WorkflowJob {
            id: dto.id,
            status: dto.status,
            failed: dto.failed,
            finished: dto.finished,
        })
    }

    /// Probe one instance via the unauthenticated ping endpoint. Never
    /// fails.
    pub async fn validate_connection(&self, instance: Option<&str>) -> bool {
        let handle = match self.handle_for(instance) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(system = SYSTEM, error = %err, "Connection validation failed");
                return false;
            }
        };

        let builder = handle.get("api/v2/ping/");
        match http::send_expect_success(SYSTEM, &handle, "ping", builder).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    system = SYSTEM,
                    instance = handle.instance_name(),
                    error = %err,
                    "Connection validation failed"
                );
                false
            }
        }
    }

    /// Aggregated health: `true` if any configured instance is reachable.
    pub async fn is_healthy(&self) -> bool {
        for name in self.factory.available_instances() {
            if self.validate_connection(Some(&name)).await {
                return true;
            }
        }
        false
    }
}
