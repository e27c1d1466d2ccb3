//! Admin API
//!
//! Maintenance operations. Cache clearing affects subsequently issued
//! requests only; in-flight requests keep the handle they already resolved.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_connect::ClientFactory;

use crate::envelope::Envelope;
use crate::ApiContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheClearResponse {
    /// Systems whose client caches were dropped.
    pub cleared: Vec<String>,
}

#[derive(Clone)]
pub struct AdminState {
    pub factories: Arc<[(&'static str, Arc<ClientFactory>)]>,
}

/// Drop all cached HTTP clients
#[utoipa::path(
    post,
    path = "/api/v1/admin/cache/clear",
    tag = "admin",
    responses(
        (status = 200, description = "Caches cleared", body = Envelope<CacheClearResponse>)
    )
)]
pub async fn clear_caches(State(state): State<AdminState>) -> Json<Envelope<CacheClearResponse>> {
    let mut cleared = Vec::with_capacity(state.factories.len());
    for (label, factory) in state.factories.iter() {
        factory.clear_cache();
        cleared.push(label.to_string());
    }
    info!(systems = ?cleared, "Client caches cleared");
    Json(Envelope::ok_with_message(
        CacheClearResponse { cleared },
        "Client caches cleared",
    ))
}

pub fn admin_router(context: &ApiContext) -> OpenApiRouter {
    let state = AdminState {
        factories: context.factories_arc(),
    };
    OpenApiRouter::new()
        .routes(routes!(clear_caches))
        .with_state(state)
}
