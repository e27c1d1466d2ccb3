//! UiPath commands

use std::sync::Arc;

use crate::command::{check_optional_instance, non_blank, Command, CommandError};
use crate::error::ExternalServiceError;

use super::{QueueItem, UiPathService};

const SERVICE: &str = "uipath";
const SYSTEM_LABEL: &str = "UiPath";

/// Request to enqueue a work item.
#[derive(Debug, Clone)]
pub struct AddQueueItemRequest {
    pub instance: Option<String>,
    pub queue: String,
    pub reference: String,
    pub content: serde_json::Value,
}

pub struct AddQueueItemCommand {
    service: Arc<UiPathService>,
}

impl Command for AddQueueItemCommand {
    fn name(&self) -> &'static str {
        "add-queue-item"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl AddQueueItemCommand {
    pub fn new(service: Arc<UiPathService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &AddQueueItemRequest) -> Result<(), CommandError> {
        non_blank(&req.queue, "queue")?;
        non_blank(&req.reference, "reference")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &AddQueueItemRequest) -> Result<QueueItem, CommandError> {
        self.validate(req)?;
        self.service
            .add_queue_item(
                req.instance.as_deref(),
                req.queue.trim(),
                req.reference.trim(),
                req.content.clone(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap("ADD_QUEUE_ITEM_FAILED", SERVICE, "addQueueItem", err)
                    .into()
            })
    }
}

/// Request for the status of a queued item.
#[derive(Debug, Clone)]
pub struct GetQueueItemRequest {
    pub instance: Option<String>,
    pub item_id: u64,
}

pub struct GetQueueItemCommand {
    service: Arc<UiPathService>,
}

impl Command for GetQueueItemCommand {
    fn name(&self) -> &'static str {
        "get-queue-item"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl GetQueueItemCommand {
    pub fn new(service: Arc<UiPathService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &GetQueueItemRequest) -> Result<(), CommandError> {
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &GetQueueItemRequest) -> Result<QueueItem, CommandError> {
        self.validate(req)?;
        self.service
            .get_queue_item(req.instance.as_deref(), req.item_id)
            .await
            .map_err(|err| {
                ExternalServiceError::wrap("GET_QUEUE_ITEM_FAILED", SERVICE, "getQueueItem", err)
                    .into()
            })
    }
}
