//! DevStack HTTP boundary
//!
//! Routers per aggregated domain, a standard response envelope, and one
//! exception-to-status mapping table shared by every endpoint. Handlers are
//! pure translation: decode path/query/body, build a command request, invoke
//! the command, wrap the result.

use std::sync::Arc;

use axum::middleware::map_response;
use axum::Router;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use ds_config::AppConfig;
use ds_connect::{ClientFactory, InstanceRegistry};
use ds_services::aap::AapService;
use ds_services::bitbucket::BitbucketService;
use ds_services::jira::JiraService;
use ds_services::openshift::OpenShiftService;
use ds_services::uipath::UiPathService;
use ds_services::webhook_proxy::WebhookProxyService;

pub mod admin_api;
pub mod envelope;
pub mod error;
pub mod health_api;
pub mod project_api;
pub mod queue_api;
pub mod repository_api;
pub mod secrets_api;
pub mod ticket_api;
pub mod webhook_api;
pub mod workflow_api;

pub use envelope::Envelope;
pub use error::{ApiError, ApiJson, ApiPath};
pub use health_api::HealthState;

/// All services and factories, wired once at startup from configuration.
#[derive(Clone)]
pub struct ApiContext {
    pub bitbucket: Arc<BitbucketService>,
    pub jira: Arc<JiraService>,
    pub openshift: Arc<OpenShiftService>,
    pub aap: Arc<AapService>,
    pub uipath: Arc<UiPathService>,
    pub webhook_proxy: Arc<WebhookProxyService>,
    factories: Arc<[(&'static str, Arc<ClientFactory>)]>,
}

impl ApiContext {
    /// Explicit constructor wiring: registry, factory, service per system.
    pub fn from_config(config: &AppConfig) -> Self {
        let factory = |system: &'static str, section| {
            Arc::new(ClientFactory::new(Arc::new(
                InstanceRegistry::from_system_config(system, section),
            )))
        };

        let bitbucket_factory = factory("bitbucket", &config.bitbucket);
        let jira_factory = factory("jira", &config.jira);
        let openshift_factory = factory("openshift", &config.openshift);
        let aap_factory = factory("aap", &config.aap);
        let uipath_factory = factory("uipath", &config.uipath);
        let webhook_factory = factory("webhook-proxy", &config.webhook_proxy);

        let factories: Arc<[(&'static str, Arc<ClientFactory>)]> = Arc::new([
            ("bitbucket", Arc::clone(&bitbucket_factory)),
            ("jira", Arc::clone(&jira_factory)),
            ("openshift", Arc::clone(&openshift_factory)),
            ("aap", Arc::clone(&aap_factory)),
            ("uipath", Arc::clone(&uipath_factory)),
            ("webhook-proxy", Arc::clone(&webhook_factory)),
        ]);

        Self {
            bitbucket: Arc::new(BitbucketService::new(bitbucket_factory)),
            jira: Arc::new(JiraService::new(jira_factory)),
            openshift: Arc::new(OpenShiftService::new(openshift_factory)),
            aap: Arc::new(AapService::new(aap_factory)),
            uipath: Arc::new(UiPathService::new(uipath_factory)),
            webhook_proxy: Arc::new(WebhookProxyService::new(webhook_factory)),
            factories,
        }
    }

    /// (label, factory) pairs for maintenance operations.
    pub fn factories(&self) -> &[(&'static str, Arc<ClientFactory>)] {
        &self.factories
    }

    pub(crate) fn factories_arc(&self) -> Arc<[(&'static str, Arc<ClientFactory>)]> {
        Arc::clone(&self.factories)
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DevStack API Service",
        description = "Aggregation API over Bitbucket, Jira, OpenShift, AAP, \
                       UiPath and the Jenkins webhook proxy"
    ),
    tags(
        (name = "health"),
        (name = "project"),
        (name = "repository"),
        (name = "tickets"),
        (name = "secrets"),
        (name = "workflows"),
        (name = "queues"),
        (name = "webhook"),
        (name = "admin")
    )
)]
struct ApiDoc;

/// The full application router plus its OpenAPI document.
pub fn api_router(context: ApiContext, health: HealthState) -> (Router, utoipa::openapi::OpenApi) {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(health_api::health_router(health))
        .merge(project_api::project_router(&context))
        .merge(repository_api::repository_router(&context))
        .merge(ticket_api::ticket_router(&context))
        .merge(secrets_api::secrets_router(&context))
        .merge(workflow_api::workflow_router(&context))
        .merge(queue_api::queue_router(&context))
        .merge(webhook_api::webhook_router(&context))
        .merge(admin_api::admin_router(&context))
        .split_for_parts();

    let router = router
        .fallback(error::route_not_found)
        .layer(map_response(error::envelope_method_not_allowed));

    (router, api)
}
