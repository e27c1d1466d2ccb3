//! Workflow API (AAP)

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::aap::{
    ExecuteWorkflowAsyncCommand, ExecuteWorkflowCommand, ExecuteWorkflowRequest,
    GetJobStatusCommand, GetJobStatusRequest,
};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::project_api::InstanceQuery;
use crate::ApiContext;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWorkflowBody {
    /// Extra variables passed to the workflow.
    #[serde(default)]
    pub extra_vars: serde_json::Value,

    #[serde(default)]
    pub instance: Option<String>,
}

impl Default for ExecuteWorkflowBody {
    fn default() -> Self {
        Self {
            extra_vars: serde_json::Value::Object(Default::default()),
            instance: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowLaunchResponse {
    pub job_id: u64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowJobResponse {
    pub job_id: u64,
    pub status: String,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<String>,
}

#[derive(Clone)]
pub struct WorkflowState {
    pub execute: Arc<ExecuteWorkflowCommand>,
    pub execute_async: Arc<ExecuteWorkflowAsyncCommand>,
    pub job_status: Arc<GetJobStatusCommand>,
}

fn launch_envelope(
    launch: ds_services::aap::WorkflowLaunch,
    message: &str,
) -> (StatusCode, Json<Envelope<WorkflowLaunchResponse>>) {
    (
        StatusCode::CREATED,
        Json(Envelope::ok_with_message(
            WorkflowLaunchResponse {
                job_id: launch.job_id,
                status: launch.status,
                url: launch.url,
            },
            message,
        )),
    )
}

/// Launch a workflow and wait for acceptance
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{name}/execute",
    tag = "workflows",
    params(("name" = String, Path, description = "Workflow template name")),
    request_body = ExecuteWorkflowBody,
    responses(
        (status = 201, description = "Workflow launched", body = Envelope<WorkflowLaunchResponse>),
        (status = 404, description = "Workflow template not found"),
        (status = 502, description = "AAP unavailable")
    )
)]
pub async fn execute_workflow(
    State(state): State<WorkflowState>,
    ApiPath(name): ApiPath<String>,
    ApiJson(body): ApiJson<ExecuteWorkflowBody>,
) -> Result<(StatusCode, Json<Envelope<WorkflowLaunchResponse>>), ApiError> {
    let launch = state
        .execute
        .execute(&ExecuteWorkflowRequest {
            instance: body.instance,
            workflow: name,
            extra_vars: body.extra_vars,
        })
        .await?;
    Ok(launch_envelope(launch, "Workflow launched"))
}

/// Launch a workflow with a bounded wait
///
/// The launch runs on a background task; this endpoint waits up to 30
/// seconds for AAP to accept it and reports a typed timeout error beyond
/// that. The remote workflow is not cancelled on timeout.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{name}/execute-async",
    tag = "workflows",
    params(("name" = String, Path, description = "Workflow template name")),
    request_body = ExecuteWorkflowBody,
    responses(
        (status = 201, description = "Workflow launched", body = Envelope<WorkflowLaunchResponse>),
        (status = 404, description = "Workflow template not found"),
        (status = 502, description = "AAP unavailable or launch not accepted in time")
    )
)]
pub async fn execute_workflow_async(
    State(state): State<WorkflowState>,
    ApiPath(name): ApiPath<String>,
    ApiJson(body): ApiJson<ExecuteWorkflowBody>,
) -> Result<(StatusCode, Json<Envelope<WorkflowLaunchResponse>>), ApiError> {
    let launch = state
        .execute_async
        .execute(&ExecuteWorkflowRequest {
            instance: body.instance,
            workflow: name,
            extra_vars: body.extra_vars,
        })
        .await?;
    Ok(launch_envelope(launch, "Workflow launched"))
}

/// Status of a workflow job
#[utoipa::path(
    get,
    path = "/api/v1/workflows/jobs/{jobId}",
    tag = "workflows",
    params(
        ("jobId" = u64, Path, description = "Workflow job id"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Job status", body = Envelope<WorkflowJobResponse>),
        (status = 400, description = "Non-numeric job id"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job_status(
    State(state): State<WorkflowState>,
    ApiPath(job_id): ApiPath<u64>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<WorkflowJobResponse>>, ApiError> {
    let job = state
        .job_status
        .execute(&GetJobStatusRequest {
            instance: query.instance,
            job_id,
        })
        .await?;
    Ok(Json(Envelope::ok(WorkflowJobResponse {
        job_id: job.id,
        status: job.status,
        failed: job.failed,
        finished: job.finished,
    })))
}

pub fn workflow_router(context: &ApiContext) -> OpenApiRouter {
    let state = WorkflowState {
        execute: Arc::new(ExecuteWorkflowCommand::new(Arc::clone(&context.aap))),
        execute_async: Arc::new(ExecuteWorkflowAsyncCommand::new(Arc::clone(&context.aap))),
        job_status: Arc::new(GetJobStatusCommand::new(Arc::clone(&context.aap))),
    };
    OpenApiRouter::new()
        .routes(routes!(execute_workflow))
        .routes(routes!(execute_workflow_async))
        .routes(routes!(get_job_status))
        .with_state(state)
}
