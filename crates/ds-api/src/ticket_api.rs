//! Ticket API (Jira)

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::jira::{
    CheckProjectExistsCommand, CheckProjectExistsRequest, CreateIssueCommand, CreateIssueRequest,
    GetProjectCommand, GetProjectRequest,
};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::project_api::{ExistsResponse, InstanceQuery};
use crate::ApiContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub project: String,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    /// Issue type name, e.g. "Task".
    pub issue_type: String,
    #[serde(default)]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketResponse {
    pub id: String,
    pub key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct TicketState {
    pub get_project: Arc<GetProjectCommand>,
    pub project_exists: Arc<CheckProjectExistsCommand>,
    pub create_issue: Arc<CreateIssueCommand>,
}

/// Jira project by key
#[utoipa::path(
    get,
    path = "/api/v1/tickets/projects/{projectKey}",
    tag = "tickets",
    params(
        ("projectKey" = String, Path, description = "Jira project key"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Project detail", body = Envelope<ProjectResponse>),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    State(state): State<TicketState>,
    ApiPath(project_key): ApiPath<String>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<ProjectResponse>>, ApiError> {
    let project = state
        .get_project
        .execute(&GetProjectRequest {
            instance: query.instance,
            project: project_key,
        })
        .await?;
    Ok(Json(Envelope::ok(ProjectResponse {
        id: project.id,
        key: project.key,
        name: project.name,
    })))
}

/// Whether a Jira project exists
#[utoipa::path(
    get,
    path = "/api/v1/tickets/projects/{projectKey}/exists",
    tag = "tickets",
    params(
        ("projectKey" = String, Path, description = "Jira project key"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Existence answer", body = Envelope<ExistsResponse>)
    )
)]
pub async fn ticket_project_exists(
    State(state): State<TicketState>,
    ApiPath(project_key): ApiPath<String>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<ExistsResponse>>, ApiError> {
    let exists = state
        .project_exists
        .execute(&CheckProjectExistsRequest {
            instance: query.instance,
            project: project_key,
        })
        .await?;
    Ok(Json(Envelope::ok(ExistsResponse { exists })))
}

/// Create a ticket
#[utoipa::path(
    post,
    path = "/api/v1/tickets",
    tag = "tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = Envelope<TicketResponse>),
        (status = 400, description = "Validation failure"),
        (status = 502, description = "Jira unavailable")
    )
)]
pub async fn create_ticket(
    State(state): State<TicketState>,
    ApiJson(req): ApiJson<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Envelope<TicketResponse>>), ApiError> {
    let issue = state
        .create_issue
        .execute(&CreateIssueRequest {
            instance: req.instance,
            project: req.project,
            summary: req.summary,
            description: req.description,
            issue_type: req.issue_type,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with_message(
            TicketResponse {
                id: issue.id,
                key: issue.key,
                url: issue.url,
            },
            "Ticket created",
        )),
    ))
}

pub fn ticket_router(context: &ApiContext) -> OpenApiRouter {
    let state = TicketState {
        get_project: Arc::new(GetProjectCommand::new(Arc::clone(&context.jira))),
        project_exists: Arc::new(CheckProjectExistsCommand::new(Arc::clone(&context.jira))),
        create_issue: Arc::new(CreateIssueCommand::new(Arc::clone(&context.jira))),
    };
    OpenApiRouter::new()
        .routes(routes!(get_project))
        .routes(routes!(ticket_project_exists))
        .routes(routes!(create_ticket))
        .with_state(state)
}
