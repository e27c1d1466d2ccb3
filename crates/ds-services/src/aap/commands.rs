//! AAP commands
//!
//! `execute-workflow-async` presents the same synchronous `execute` contract
//! as every other command: the launch runs on a spawned task and the command
//! waits for it up to a fixed deadline. A timed-out wait degrades to a
//! reported error; the remote launch is not cancelled.

use std::sync::Arc;
use std::time::Duration;

use crate::command::{check_optional_instance, non_blank, Command, CommandError};
use crate::error::ExternalServiceError;

use super::{AapService, WorkflowJob, WorkflowLaunch};

const SERVICE: &str = "aap";
const SYSTEM_LABEL: &str = "AAP";

/// Bound on how long the async variant waits for the launch to be accepted.
const LAUNCH_WAIT: Duration = Duration::from_secs(30);

/// Request to launch a workflow.
#[derive(Debug, Clone)]
pub struct ExecuteWorkflowRequest {
    pub instance: Option<String>,
    pub workflow: String,
    pub extra_vars: serde_json::Value,
}

pub struct ExecuteWorkflowCommand {
    service: Arc<AapService>,
}

impl Command for ExecuteWorkflowCommand {
    fn name(&self) -> &'static str {
        "execute-workflow"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl ExecuteWorkflowCommand {
    pub fn new(service: Arc<AapService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &ExecuteWorkflowRequest) -> Result<(), CommandError> {
        non_blank(&req.workflow, "workflow")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(
        &self,
        req: &ExecuteWorkflowRequest,
    ) -> Result<WorkflowLaunch, CommandError> {
        self.validate(req)?;
        self.service
            .execute_workflow(
                req.instance.as_deref(),
                req.workflow.trim(),
                req.extra_vars.clone(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "EXECUTE_WORKFLOW_FAILED",
                    SERVICE,
                    "executeWorkflow",
                    err,
                )
                .into()
            })
    }
}

pub struct ExecuteWorkflowAsyncCommand {
    service: Arc<AapService>,
    wait: Duration,
}

impl Command for ExecuteWorkflowAsyncCommand {
    fn name(&self) -> &'static str {
        "execute-workflow-async"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl ExecuteWorkflowAsyncCommand {
    pub fn new(service: Arc<AapService>) -> Self {
        Self::with_wait(service, LAUNCH_WAIT)
    }

    /// Same command with a custom launch-wait bound.
    pub fn with_wait(service: Arc<AapService>, wait: Duration) -> Self {
        Self { service, wait }
    }

    pub fn validate(&self, req: &ExecuteWorkflowRequest) -> Result<(), CommandError> {
        non_blank(&req.workflow, "workflow")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(
        &self,
        req: &ExecuteWorkflowRequest,
    ) -> Result<WorkflowLaunch, CommandError> {
        self.validate(req)?;

        let service = Arc::clone(&self.service);
        let instance = req.instance.clone();
        let workflow = req.workflow.trim().to_string();
        let extra_vars = req.extra_vars.clone();

        let task = tokio::spawn(async move {
            service
                .execute_workflow(instance.as_deref(), &workflow, extra_vars)
                .await
        });

        match tokio::time::timeout(self.wait, task).await {
            Err(_elapsed) => Err(ExternalServiceError::new(
                "WORKFLOW_INITIATION_TIMEOUT",
                SERVICE,
                "executeWorkflowAsync",
                format!(
                    "Workflow '{}' launch was not accepted within {:?}",
                    req.workflow.trim(),
                    self.wait
                ),
            )
            .into()),
            Ok(Err(join_err)) if join_err.is_cancelled() => Err(ExternalServiceError::new(
                "WORKFLOW_EXECUTION_INTERRUPTED",
                SERVICE,
                "executeWorkflowAsync",
                format!(
                    "Workflow '{}' launch task was cancelled before completion",
                    req.workflow.trim()
                ),
            )
            .into()),
            Ok(Err(join_err)) => Err(ExternalServiceError::new(
                "ASYNC_WORKFLOW_EXECUTION_FAILED",
                SERVICE,
                "executeWorkflowAsync",
                format!(
                    "Workflow '{}' launch task failed: {join_err}",
                    req.workflow.trim()
                ),
            )
            .into()),
            Ok(Ok(Err(service_err))) => Err(ExternalServiceError::wrap(
                "ASYNC_WORKFLOW_EXECUTION_FAILED",
                SERVICE,
                "executeWorkflowAsync",
                service_err,
            )
            .into()),
            Ok(Ok(Ok(launch))) => Ok(launch),
        }
    }
}

/// Request for the status of a launched workflow job.
#[derive(Debug, Clone)]
pub struct GetJobStatusRequest {
    pub instance: Option<String>,
    pub job_id: u64,
}

pub struct GetJobStatusCommand {
    service: Arc<AapService>,
}

impl Command for GetJobStatusCommand {
    fn name(&self) -> &'static str {
        "get-job-status"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl GetJobStatusCommand {
    pub fn new(service: Arc<AapService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &GetJobStatusRequest) -> Result<(), CommandError> {
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &GetJobStatusRequest) -> Result<WorkflowJob, CommandError> {
        self.validate(req)?;
        self.service
            .get_job_status(req.instance.as_deref(), req.job_id)
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "GET_JOB_STATUS_FAILED",
                    SERVICE,
                    "getJobStatus",
                    err,
                )
                .into()
            })
    }
}
