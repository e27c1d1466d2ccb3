//! Jira adapter
//!
//! Wraps the Jira REST API (`/rest/api/2`) for project lookup and issue
//! creation.

mod commands;

pub use commands::{
    CheckProjectExistsCommand, CheckProjectExistsRequest, CreateIssueCommand,
    CreateIssueRequest, GetProjectCommand, GetProjectRequest,
};

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use ds_connect::{ClientFactory, ClientHandle};

use crate::error::ServiceError;
use crate::http;

const SYSTEM: &str = "jira";

/// A Jira project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub key: String,
    pub name: String,
}

/// A freshly created issue.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ProjectDto {
    id: String,
    key: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssueDto {
    id: String,
    key: String,
    #[serde(rename = "self")]
    self_url: String,
}

/// Jira business operations, addressed by instance name.
pub struct JiraService {
    factory: Arc<ClientFactory>,
}

impl JiraService {
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

    pub async fn get_project(
        &self,
        instance: Option<&str>,
        key: &str,
    ) -> Result<Project, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("project '{key}'");
        let path = format!("rest/api/2/project/{key}");
        let dto: ProjectDto =
            http::get_json(SYSTEM, &handle, &resource, handle.get(&path)).await?;
        Ok(Project {
            id: dto.id,
            key: dto.key,
            name: dto.name,
        })
    }

    /// Whether a project exists (404 answers `false`).
    pub async fn project_exists(
        &self,
        instance: Option<&str>,
        key: &str,
    ) -> Result<bool, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("project '{key}'");
        let path = format!("rest/api/2/project/{key}");
        Ok(http::exists(SYSTEM, &handle, &resource, handle.get(&path)).await?)
    }

    pub async fn create_issue(
        &self,
        instance: Option<&str>,
        project_key: &str,
        summary: &str,
        description: &str,
        issue_type: &str,
    ) -> Result<CreatedIssue, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("issue in project '{project_key}'");
        let body = json!({
            "fields": {
                "project": { "key": project_key },
                "summary": summary,
                "description": description,
                "issuetype": { "name": issue_type },
            }
        });
        let builder = handle.post("rest/api/2/issue").json(&body);
        let dto: CreatedIssueDto = http::get_json(SYSTEM, &handle, &resource, builder).await?;
        Ok(CreatedIssue {
            id: dto.id,
            key: dto.key,
            url: dto.self_url,
        })
    }

    /// Probe one instance via `/myself`. Never fails.
    pub async fn validate_connection(&self, instance: Option<&str>) -> bool {
        let handle = match self.handle_for(instance) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(system = SYSTEM, error = %err, "Connection validation failed");
                return false;
            }
        };

        let builder = handle.get("rest/api/2/myself");
        match http::send_expect_success(SYSTEM, &handle, "current user", builder).await {
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
