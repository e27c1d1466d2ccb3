//! Project API
//!
//! User provisioning for a project is delegated to an AAP workflow: the POST
//! launches it asynchronously and hands back the workflow job id as the
//! request id, which the status endpoint polls.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::aap::{
    ExecuteWorkflowAsyncCommand, ExecuteWorkflowRequest, GetJobStatusCommand, GetJobStatusRequest,
};
use ds_services::bitbucket::{CheckProjectExistsCommand, CheckProjectExistsRequest};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::ApiContext;

/// AAP workflow template that provisions project users.
const PROVISION_WORKFLOW: &str = "project-user-provisioning";

/// Roles a user can be granted on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRole {
    Developer,
    Maintainer,
    Viewer,
}

impl ProjectRole {
    const ALLOWED: &'static str = "developer, maintainer, viewer";
}

impl FromStr for ProjectRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "developer" => Ok(ProjectRole::Developer),
            "maintainer" => Ok(ProjectRole::Maintainer),
            "viewer" => Ok(ProjectRole::Viewer),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectRole::Developer => "developer",
            ProjectRole::Maintainer => "maintainer",
            ProjectRole::Viewer => "viewer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProjectUserRequest {
    pub username: String,

    /// One of: developer, maintainer, viewer.
    pub role: String,

    /// AAP instance to run the provisioning workflow on; default when
    /// absent.
    #[serde(default)]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResponse {
    pub request_id: u64,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub request_id: u64,
    pub username: String,
    pub status: String,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Request id returned by the provisioning POST.
    pub request_id: Option<String>,

    /// AAP instance to poll; default when absent.
    #[serde(default)]
    pub instance: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstanceQuery {
    /// Instance name; default when absent.
    pub instance: Option<String>,
}

#[derive(Clone)]
pub struct ProjectState {
    pub provision: Arc<ExecuteWorkflowAsyncCommand>,
    pub job_status: Arc<GetJobStatusCommand>,
    pub project_exists: Arc<CheckProjectExistsCommand>,
}

/// Request user access to a project
#[utoipa::path(
    post,
    path = "/api/v1/project/{projectKey}/users",
    tag = "project",
    params(("projectKey" = String, Path, description = "Project key")),
    request_body = AddProjectUserRequest,
    responses(
        (status = 201, description = "Provisioning workflow launched", body = Envelope<ProvisioningResponse>),
        (status = 400, description = "Validation failure or invalid role"),
        (status = 502, description = "AAP unavailable")
    )
)]
pub async fn add_project_user(
    State(state): State<ProjectState>,
    ApiPath(project_key): ApiPath<String>,
    ApiJson(req): ApiJson<AddProjectUserRequest>,
) -> Result<(axum::http::StatusCode, axum::Json<Envelope<ProvisioningResponse>>), ApiError> {
    let role = ProjectRole::from_str(&req.role).map_err(|_| ApiError::InvalidRole {
        value: req.role.clone(),
        allowed: ProjectRole::ALLOWED.to_string(),
    })?;

    let launch = state
        .provision
        .execute(&ExecuteWorkflowRequest {
            instance: req.instance.clone(),
            workflow: PROVISION_WORKFLOW.to_string(),
            extra_vars: serde_json::json!({
                "project_key": project_key,
                "username": req.username,
                "role": role.to_string(),
            }),
        })
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        axum::Json(Envelope::ok_with_message(
            ProvisioningResponse {
                request_id: launch.job_id,
                status: launch.status,
            },
            "User provisioning workflow launched",
        )),
    ))
}

/// Provisioning status for a user
#[utoipa::path(
    get,
    path = "/api/v1/project/{projectKey}/users/{username}/status",
    tag = "project",
    params(
        ("projectKey" = String, Path, description = "Project key"),
        ("username" = String, Path, description = "Username"),
        StatusQuery
    ),
    responses(
        (status = 200, description = "Provisioning status", body = Envelope<UserStatusResponse>),
        (status = 400, description = "Missing or malformed requestId"),
        (status = 404, description = "No such provisioning request")
    )
)]
pub async fn get_user_status(
    State(state): State<ProjectState>,
    ApiPath((_project_key, username)): ApiPath<(String, String)>,
    Query(query): Query<StatusQuery>,
) -> Result<axum::Json<Envelope<UserStatusResponse>>, ApiError> {
    let raw = query.request_id.ok_or(ApiError::MissingParameter {
        name: "requestId".to_string(),
    })?;
    let job_id: u64 = raw.parse().map_err(|_| ApiError::InvalidParameter {
        name: "requestId".to_string(),
        message: format!("'{raw}' is not a numeric request id"),
    })?;

    let job = state
        .job_status
        .execute(&GetJobStatusRequest {
            instance: query.instance,
            job_id,
        })
        .await?;

    Ok(axum::Json(Envelope::ok(UserStatusResponse {
        request_id: job.id,
        username,
        status: job.status,
        failed: job.failed,
        finished: job.finished,
    })))
}

/// Whether a project exists in Bitbucket
#[utoipa::path(
    get,
    path = "/api/v1/project/{projectKey}/exists",
    tag = "project",
    params(
        ("projectKey" = String, Path, description = "Project key"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Existence answer", body = Envelope<ExistsResponse>)
    )
)]
pub async fn project_exists(
    State(state): State<ProjectState>,
    ApiPath(project_key): ApiPath<String>,
    Query(query): Query<InstanceQuery>,
) -> Result<axum::Json<Envelope<ExistsResponse>>, ApiError> {
    let exists = state
        .project_exists
        .execute(&CheckProjectExistsRequest {
            instance: query.instance,
            project: project_key,
        })
        .await?;
    Ok(axum::Json(Envelope::ok(ExistsResponse { exists })))
}

pub fn project_router(context: &ApiContext) -> OpenApiRouter {
    let state = ProjectState {
        provision: Arc::new(ExecuteWorkflowAsyncCommand::new(Arc::clone(&context.aap))),
        job_status: Arc::new(GetJobStatusCommand::new(Arc::clone(&context.aap))),
        project_exists: Arc::new(CheckProjectExistsCommand::new(Arc::clone(
            &context.bitbucket,
        ))),
    };
    OpenApiRouter::new()
        .routes(routes!(add_project_user))
        .routes(routes!(get_user_status))
        .routes(routes!(project_exists))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(ProjectRole::from_str("Developer"), Ok(ProjectRole::Developer));
        assert_eq!(ProjectRole::from_str(" viewer "), Ok(ProjectRole::Viewer));
        assert!(ProjectRole::from_str("owner").is_err());
    }
}
