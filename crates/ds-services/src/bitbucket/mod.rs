//! Bitbucket Server adapter
//!
//! Wraps the Bitbucket REST API (`/rest/api/1.0`) behind instance-addressed
//! business operations. Response DTOs stay private; callers see this
//! module's model types only.

mod commands;

pub use commands::{
    CheckBranchExistsCommand, CheckBranchExistsRequest, CheckProjectExistsCommand,
    CheckProjectExistsRequest, GetDefaultBranchCommand, GetDefaultBranchRequest,
    ListRepositoriesCommand, ListRepositoriesRequest,
};

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use ds_connect::{ClientFactory, ClientHandle};

use crate::error::ServiceError;
use crate::http;

const SYSTEM: &str = "bitbucket";

/// A branch as this service models it.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: String,
    pub display_id: String,
    pub is_default: bool,
}

/// A repository within a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct BranchDto {
    id: String,
    #[serde(rename = "displayId")]
    display_id: String,
    #[serde(rename = "isDefault", default)]
    is_default: bool,
}

impl From<BranchDto> for Branch {
    fn from(dto: BranchDto) -> Self {
        Branch {
            id: dto.id,
            display_id: dto.display_id,
            is_default: dto.is_default,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryDto {
    slug: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PageDto<T> {
    values: Vec<T>,
}

/// Bitbucket business operations, addressed by instance name.
pub struct BitbucketService {
    factory: Arc<ClientFactory>,
}

impl BitbucketService {
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

    /// Default branch of a repository. 404 here is an error: the caller
    /// asked for a branch that should exist.
    pub async fn get_default_branch(
        &self,
        instance: Option<&str>,
        project: &str,
        repo: &str,
    ) -> Result<Branch, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("default branch of {project}/{repo}");
        let path = format!("rest/api/1.0/projects/{project}/repos/{repo}/branches/default");
        let dto: BranchDto =
            http::get_json(SYSTEM, &handle, &resource, handle.get(&path)).await?;
        Ok(dto.into())
    }

    /// Whether a branch exists. 404 (unknown project/repo) answers `false`;
    /// auth failures and server errors still propagate.
    pub async fn branch_exists(
        &self,
        instance: Option<&str>,
        project: &str,
        repo: &str,
        branch: &str,
    ) -> Result<bool, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("branches of {project}/{repo}");
        let path = format!("rest/api/1.0/projects/{project}/repos/{repo}/branches");
        let builder = handle.get(&path).query(&[("filterText", branch)]);

        let response = http::send(SYSTEM, &handle, builder).await?;
        match response.status() {
            status if status.is_success() => {
                let page: PageDto<BranchDto> =
                    http::decode_json(SYSTEM, &handle, &resource, response).await?;
                // filterText is a substring match; require an exact hit.
                Ok(page.values.iter().any(|b| b.display_id == branch))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(ServiceError::Remote(
                crate::error::RemoteError::from_status(
                    SYSTEM,
                    handle.instance_name(),
                    &resource,
                    status,
                ),
            )),
        }
    }

    /// Whether a project exists (404 answers `false`).
    pub async fn project_exists(
        &self,
        instance: Option<&str>,
        project: &str,
    ) -> Result<bool, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("project '{project}'");
        let path = format!("rest/api/1.0/projects/{project}");
        Ok(http::exists(SYSTEM, &handle, &resource, handle.get(&path)).await?)
    }

    /// Repositories of a project.
    pub async fn list_repositories(
        &self,
        instance: Option<&str>,
        project: &str,
    ) -> Result<Vec<Repository>, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("repositories of project '{project}'");
        let path = format!("rest/api/1.0/projects/{project}/repos");
        let builder = handle.get(&path).query(&[("limit", "100")]);
        let page: PageDto<RepositoryDto> =
            http::get_json(SYSTEM, &handle, &resource, builder).await?;
        Ok(page
            .values
            .into_iter()
            .map(|dto| Repository {
                slug: dto.slug,
                name: dto.name,
            })
            .collect())
    }

    /// Probe one instance. Never fails; any error is logged and reported as
    /// `false`.
    pub async fn validate_connection(&self, instance: Option<&str>) -> bool {
        let handle = match self.handle_for(instance) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(system = SYSTEM, error = %err, "Connection validation failed");
                return false;
            }
        };

        let builder = handle
            .get("rest/api/1.0/projects")
            .query(&[("limit", "1")]);
        match http::send_expect_success(SYSTEM, &handle, "project listing", builder).await {
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
    /// Per-instance failures are swallowed and logged.
    pub async fn is_healthy(&self) -> bool {
        for name in self.factory.available_instances() {
            if self.validate_connection(Some(&name)).await {
                return true;
            }
        }
        false
    }
}
