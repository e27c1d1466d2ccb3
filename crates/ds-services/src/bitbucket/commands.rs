//! Bitbucket commands: validate, invoke, wrap once

use std::sync::Arc;

use crate::command::{check_optional_instance, non_blank, Command, CommandError};
use crate::error::ExternalServiceError;

use super::{BitbucketService, Branch, Repository};

const SERVICE: &str = "bitbucket";
const SYSTEM_LABEL: &str = "Bitbucket";

/// Request for the default branch of a repository.
#[derive(Debug, Clone)]
pub struct GetDefaultBranchRequest {
    pub instance: Option<String>,
    pub project: String,
    pub repo: String,
}

pub struct GetDefaultBranchCommand {
    service: Arc<BitbucketService>,
}

impl Command for GetDefaultBranchCommand {
    fn name(&self) -> &'static str {
        "get-default-branch"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl GetDefaultBranchCommand {
    pub fn new(service: Arc<BitbucketService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &GetDefaultBranchRequest) -> Result<(), CommandError> {
        non_blank(&req.project, "project")?;
        non_blank(&req.repo, "repo")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &GetDefaultBranchRequest) -> Result<Branch, CommandError> {
        self.validate(req)?;
        self.service
            .get_default_branch(req.instance.as_deref(), req.project.trim(), req.repo.trim())
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "GET_DEFAULT_BRANCH_FAILED",
                    SERVICE,
                    "getDefaultBranch",
                    err,
                )
                .into()
            })
    }
}

/// Request for a branch-existence check.
#[derive(Debug, Clone)]
pub struct CheckBranchExistsRequest {
    pub instance: Option<String>,
    pub project: String,
    pub repo: String,
    pub branch: String,
}

pub struct CheckBranchExistsCommand {
    service: Arc<BitbucketService>,
}

impl Command for CheckBranchExistsCommand {
    fn name(&self) -> &'static str {
        "check-branch-exists"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl CheckBranchExistsCommand {
    pub fn new(service: Arc<BitbucketService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &CheckBranchExistsRequest) -> Result<(), CommandError> {
        non_blank(&req.project, "project")?;
        non_blank(&req.repo, "repo")?;
        non_blank(&req.branch, "branch")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &CheckBranchExistsRequest) -> Result<bool, CommandError> {
        self.validate(req)?;
        self.service
            .branch_exists(
                req.instance.as_deref(),
                req.project.trim(),
                req.repo.trim(),
                req.branch.trim(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "CHECK_BRANCH_EXISTS_FAILED",
                    SERVICE,
                    "branchExists",
                    err,
                )
                .into()
            })
    }
}

/// Request for a project-existence check.
#[derive(Debug, Clone)]
pub struct CheckProjectExistsRequest {
    pub instance: Option<String>,
    pub project: String,
}

pub struct CheckProjectExistsCommand {
    service: Arc<BitbucketService>,
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
    pub fn new(service: Arc<BitbucketService>) -> Self {
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

/// Request for the repositories of a project.
#[derive(Debug, Clone)]
pub struct ListRepositoriesRequest {
    pub instance: Option<String>,
    pub project: String,
}

pub struct ListRepositoriesCommand {
    service: Arc<BitbucketService>,
}

impl Command for ListRepositoriesCommand {
    fn name(&self) -> &'static str {
        "list-repositories"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl ListRepositoriesCommand {
    pub fn new(service: Arc<BitbucketService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &ListRepositoriesRequest) -> Result<(), CommandError> {
        non_blank(&req.project, "project")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(
        &self,
        req: &ListRepositoriesRequest,
    ) -> Result<Vec<Repository>, CommandError> {
        self.validate(req)?;
        self.service
            .list_repositories(req.instance.as_deref(), req.project.trim())
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "LIST_REPOSITORIES_FAILED",
                    SERVICE,
                    "listRepositories",
                    err,
                )
                .into()
            })
    }
}
