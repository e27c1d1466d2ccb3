//! Webhook API (build trigger through the Jenkins webhook proxy)

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::webhook_proxy::{TriggerBuildCommand, TriggerBuildRequest};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::ApiContext;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerBuildBody {
    /// Per-project trigger secret.
    pub trigger_secret: String,

    /// Component whose pipeline is triggered.
    pub component: String,

    #[serde(default)]
    pub branch: Option<String>,

    /// Cluster (instance) name; default when absent.
    #[serde(default)]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TriggerBuildResponse {
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Clone)]
pub struct WebhookState {
    pub trigger_build: Arc<TriggerBuildCommand>,
}

/// Trigger a component build
#[utoipa::path(
    post,
    path = "/api/v1/project/{projectKey}/build",
    tag = "webhook",
    params(("projectKey" = String, Path, description = "Project key")),
    request_body = TriggerBuildBody,
    responses(
        (status = 201, description = "Build triggered", body = Envelope<TriggerBuildResponse>),
        (status = 400, description = "Validation failure"),
        (status = 502, description = "Webhook proxy unavailable")
    )
)]
pub async fn trigger_build(
    State(state): State<WebhookState>,
    ApiPath(project_key): ApiPath<String>,
    ApiJson(body): ApiJson<TriggerBuildBody>,
) -> Result<(StatusCode, Json<Envelope<TriggerBuildResponse>>), ApiError> {
    state
        .trigger_build
        .execute(&TriggerBuildRequest {
            instance: body.instance,
            project_key,
            trigger_secret: body.trigger_secret,
            component: body.component.clone(),
            branch: body.branch.clone(),
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with_message(
            TriggerBuildResponse {
                component: body.component,
                branch: body.branch,
            },
            "Build triggered",
        )),
    ))
}

pub fn webhook_router(context: &ApiContext) -> OpenApiRouter {
    let state = WebhookState {
        trigger_build: Arc::new(TriggerBuildCommand::new(Arc::clone(&context.webhook_proxy))),
    };
    OpenApiRouter::new()
        .routes(routes!(trigger_build))
        .with_state(state)
}
