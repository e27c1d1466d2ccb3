//! Jira commands

use std::sync::Arc;

use crate::command::{check_optional_instance, non_blank, Command, CommandError};
use crate::error::ExternalServiceError;

use super::{CreatedIssue, JiraService, Project};

const SERVICE: &str = "jira";
const SYSTEM_LABEL: &str = "Jira";

/// Request for a project-existence check.
#[derive(Debug, Clone)]
pub struct CheckProjectExistsRequest {
    pub instance: Option<String>,
    pub project: String,
}

pub struct CheckProjectExistsCommand {
    service: Arc<JiraService>,
}

impl Command for CheckProjectExistsCommand {
    fn name(&self) -> &'static str {
        "check-project-exists"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl CheckProjectExistsCommand {
    pub fn new(service: Arc<JiraService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &CheckProjectExistsRequest) -> Result<(), CommandError> {
        non_blank(&req.project, "project")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &CheckProjectExistsRequest) -> Result<bool, CommandError> {
        self.validate(req)?;
        self.service
            .project_exists(req.instance.as_deref(), req.project.trim())
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "CHECK_PROJECT_EXISTS_FAILED",
                    SERVICE,
                    "projectExists",
                    err,
                )
                .into()
            })
    }
}

/// Request for a project lookup.
#[derive(Debug, Clone)]
pub struct GetProjectRequest {
    pub instance: Option<String>,
    pub project: String,
}

pub struct GetProjectCommand {
    service: Arc<JiraService>,
}

impl Command for GetProjectCommand {
    fn name(&self) -> &'static str {
        "get-project"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl GetProjectCommand {
    pub fn new(service: Arc<JiraService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &GetProjectRequest) -> Result<(), CommandError> {
        non_blank(&req.project, "project")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &GetProjectRequest) -> Result<Project, CommandError> {
        self.validate(req)?;
        self.service
            .get_project(req.instance.as_deref(), req.project.trim())
            .await
            .map_err(|err| {
                ExternalServiceError::wrap("GET_PROJECT_FAILED", SERVICE, "getProject", err)
                    .into()
            })
    }
}

/// Request to create an issue.
#[derive(Debug, Clone)]
pub struct CreateIssueRequest {
    pub instance: Option<String>,
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

pub struct CreateIssueCommand {
    service: Arc<JiraService>,
}

impl Command for CreateIssueCommand {
    fn name(&self) -> &'static str {
        "create-issue"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl CreateIssueCommand {
    pub fn new(service: Arc<JiraService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &CreateIssueRequest) -> Result<(), CommandError> {
        non_blank(&req.project, "project")?;
        non_blank(&req.summary, "summary")?;
        non_blank(&req.issue_type, "issueType")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &CreateIssueRequest) -> Result<CreatedIssue, CommandError> {
        self.validate(req)?;
        self.service
            .create_issue(
                req.instance.as_deref(),
                req.project.trim(),
                req.summary.trim(),
                req.description.trim(),
                req.issue_type.trim(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap("CREATE_ISSUE_FAILED", SERVICE, "createIssue", err)
                    .into()
            })
    }
}
