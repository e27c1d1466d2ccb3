//! UiPath Orchestrator adapter
//!
//! Wraps the Orchestrator OData queue API. When an instance carries a
//! namespace it is sent as the organization unit (folder) header.

mod commands;

pub use commands::{
    AddQueueItemCommand, AddQueueItemRequest, GetQueueItemCommand, GetQueueItemRequest,
};

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use ds_connect::{ClientFactory, ClientHandle};

use crate::error::ServiceError;
use crate::http;

const SYSTEM: &str = "uipath";
const FOLDER_HEADER: &str = "X-UIPATH-OrganizationUnitId";

/// A queue item as this service models it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub id: u64,
    pub status: String,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueItemDto {
    #[serde(rename = "Id")]
    id: u64,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Reference", default)]
    reference: Option<String>,
}

/// UiPath Orchestrator operations, addressed by instance name.
pub struct UiPathService {
    factory: Arc<ClientFactory>,
}

impl UiPathService {
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

    fn with_folder(
        handle: &ClientHandle,
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        match &handle.config().namespace {
            Some(folder) => builder.header(FOLDER_HEADER, folder),
            None => builder,
        }
    }

    /// Enqueue a work item.
    pub async fn add_queue_item(
        &self,
        instance: Option<&str>,
        queue: &str,
        reference: &str,
        content: serde_json::Value,
    ) -> Result<QueueItem, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("queue '{queue}'");
        let body = json!({
            "itemData": {
                "Name": queue,
                "Reference": reference,
                "Priority": "Normal",
                "SpecificContent": content,
            }
        });
        let builder = Self::with_folder(
            &handle,
            handle
                .post("odata/Queues/UiPathODataSvc.AddQueueItem")
                .json(&body),
        );
        let dto: QueueItemDto = http::get_json(SYSTEM, &handle, &resource, builder).await?;
        Ok(QueueItem {
            id: dto.id,
            status: dto.status,
            reference: dto.reference,
        })
    }

    /// Status of a previously enqueued item.
    pub async fn get_queue_item(
        &self,
        instance: Option<&str>,
        item_id: u64,
    ) -> Result<QueueItem, ServiceError> {
        let handle = self.handle_for(instance)?;
        let resource = format!("queue item {item_id}");
        let path = format!("odata/QueueItems({item_id})");
        let builder = Self::with_folder(&handle, handle.get(&path));
        let dto: QueueItemDto = http::get_json(SYSTEM, &handle, &resource, builder).await?;
        Ok(QueueItem {
            id: dto.id,
            status: dto.status,
            reference: dto.reference,
        })
    }

    /// Probe one Orchestrator instance. Never fails.
    pub async fn validate_connection(&self, instance: Option<&str>) -> bool {
        let handle = match self.handle_for(instance) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(system = SYSTEM, error = %err, "Connection validation failed");
                return false;
            }
        };

        let builder =
            Self::with_folder(&handle, handle.get("odata/Folders").query(&[("$top", "1")]));
        match http::send_expect_success(SYSTEM, &handle, "folder listing", builder).await {
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
