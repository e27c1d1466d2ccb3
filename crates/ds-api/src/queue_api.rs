//! Queue API (UiPath Orchestrator)

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::uipath::{
    AddQueueItemCommand, AddQueueItemRequest, GetQueueItemCommand, GetQueueItemRequest,
};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiJson, ApiPath};
use crate::project_api::InstanceQuery;
use crate::ApiContext;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddQueueItemBody {
    /// Caller-chosen reference for deduplication and lookup.
    pub reference: String,

    /// Item payload handed to the robot as specific content.
    #[serde(default)]
    pub content: serde_json::Value,

    #[serde(default)]
    pub instance: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemResponse {
    pub item_id: u64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Clone)]
pub struct QueueState {
    pub add_item: Arc<AddQueueItemCommand>,
    pub get_item: Arc<GetQueueItemCommand>,
}

/// Enqueue a work item
#[utoipa::path(
    post,
    path = "/api/v1/queues/{queue}/items",
    tag = "queues",
    params(("queue" = String, Path, description = "Queue name")),
    request_body = AddQueueItemBody,
    responses(
        (status = 201, description = "Item enqueued", body = Envelope<QueueItemResponse>),
        (status = 400, description = "Validation failure"),
        (status = 502, description = "Orchestrator unavailable")
    )
)]
pub async fn add_queue_item(
    State(state): State<QueueState>,
    ApiPath(queue): ApiPath<String>,
    ApiJson(body): ApiJson<AddQueueItemBody>,
) -> Result<(StatusCode, Json<Envelope<QueueItemResponse>>), ApiError> {
    let item = state
        .add_item
        .execute(&AddQueueItemRequest {
            instance: body.instance,
            queue,
            reference: body.reference,
            content: body.content,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with_message(
            QueueItemResponse {
                item_id: item.id,
                status: item.status,
                reference: item.reference,
            },
            "Queue item created",
        )),
    ))
}

/// Status of a queued item
#[utoipa::path(
    get,
    path = "/api/v1/queues/items/{itemId}",
    tag = "queues",
    params(
        ("itemId" = u64, Path, description = "Queue item id"),
        InstanceQuery
    ),
    responses(
        (status = 200, description = "Item status", body = Envelope<QueueItemResponse>),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_queue_item(
    State(state): State<QueueState>,
    ApiPath(item_id): ApiPath<u64>,
    Query(query): Query<InstanceQuery>,
) -> Result<Json<Envelope<QueueItemResponse>>, ApiError> {
    let item = state
        .get_item
        .execute(&GetQueueItemRequest {
            instance: query.instance,
            item_id,
        })
        .await?;
    Ok(Json(Envelope::ok(QueueItemResponse {
        item_id: item.id,
        status: item.status,
        reference: item.reference,
    })))
}

pub fn queue_router(context: &ApiContext) -> OpenApiRouter {
    let state = QueueState {
        add_item: Arc::new(AddQueueItemCommand::new(Arc::clone(&context.uipath))),
        get_item: Arc::new(GetQueueItemCommand::new(Arc::clone(&context.uipath))),
    };
    OpenApiRouter::new()
        .routes(routes!(add_queue_item))
        .routes(routes!(get_queue_item))
        .with_state(state)
}
