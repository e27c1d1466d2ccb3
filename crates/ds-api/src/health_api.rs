//! Health endpoints
//!
//! - /health - overall status
//! - /health/live - liveness probe
//! - /health/ready - readiness probe
//! - /health/systems - per-system aggregated checks

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::ApiContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

/// One external system's aggregated check: up when any configured instance
/// answers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

#[derive(Clone)]
pub struct HealthState {
    pub context: ApiContext,
    pub version: Option<String>,
    pub ready: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new(context: ApiContext, version: Option<String>) -> Self {
        Self {
            context,
            version,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

async fn check_system(name: &str, healthy: impl std::future::Future<Output = bool>) -> HealthCheck {
    let start = Instant::now();
    let up = healthy.await;
    HealthCheck {
        name: name.to_string(),
        status: if up { HealthStatus::Up } else { HealthStatus::Down },
        message: (!up).then(|| "No configured instance is reachable".to_string()),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

async fn run_system_checks(context: &ApiContext) -> Vec<HealthCheck> {
    vec![
        check_system("bitbucket", context.bitbucket.is_healthy()).await,
        check_system("jira", context.jira.is_healthy()).await,
        check_system("openshift", context.openshift.is_healthy()).await,
        check_system("aap", context.aap.is_healthy()).await,
        check_system("uipath", context.uipath.is_healthy()).await,
        check_system("webhook-proxy", context.webhook_proxy.is_healthy()).await,
    ]
}

/// Overall service health
///
/// The service itself, not its upstreams: a degraded external system must
/// not take the aggregator down. Use /health/systems for upstream status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Up,
        timestamp: Utc::now(),
        version: state.version.clone(),
        checks: vec![],
    })
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = SimpleHealthResponse)
    )
)]
pub async fn get_liveness() -> Json<SimpleHealthResponse> {
    Json(SimpleHealthResponse {
        status: HealthStatus::Up,
    })
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = SimpleHealthResponse),
        (status = 503, description = "Service is starting", body = SimpleHealthResponse)
    )
)]
pub async fn get_readiness(State(state): State<HealthState>) -> Response {
    let (status_code, status) = if state.is_ready() {
        (StatusCode::OK, HealthStatus::Up)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Down)
    };
    (status_code, Json(SimpleHealthResponse { status })).into_response()
}

/// Per-system aggregated checks
///
/// Probes every configured external system; a system is UP when any of its
/// instances answers. Returns 200 regardless, with per-system detail.
#[utoipa::path(
    get,
    path = "/health/systems",
    tag = "health",
    responses(
        (status = 200, description = "Per-system health detail", body = HealthResponse)
    )
)]
pub async fn get_system_health(State(state): State<HealthState>) -> Json<HealthResponse> {
    let checks = run_system_checks(&state.context).await;
    let status = if checks.iter().all(|c| c.status == HealthStatus::Up) {
        HealthStatus::Up
    } else {
        HealthStatus::Down
    };
    Json(HealthResponse {
        status,
        timestamp: Utc::now(),
        version: state.version.clone(),
        checks,
    })
}

pub fn health_router(state: HealthState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_health))
        .routes(routes!(get_liveness))
        .routes(routes!(get_readiness))
        .routes(routes!(get_system_health))
        .with_state(state)
}
