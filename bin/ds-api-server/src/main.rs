//! DevStack API Server
//!
//! Aggregation REST API over Bitbucket, Jira, OpenShift, AAP, UiPath and
//! the Jenkins webhook proxy.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DEVSTACK_CONFIG` | - | Path to the TOML configuration file |
//! | `DEVSTACK_HTTP_HOST` | `0.0.0.0` | Bind address |
//! | `DEVSTACK_HTTP_PORT` | `8080` | HTTP port |
//! | `DEVSTACK_CORS_ORIGINS` | - | Comma-separated allowed origins |
//! | `LOG_FORMAT` | `text` | `json` for structured output |
//! | `RUST_LOG` | `info` | Log filter |

use anyhow::Result;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

use ds_api::{api_router, ApiContext, HealthState};
use ds_config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    ds_common::logging::init_logging("ds-api-server");

    info!("Starting DevStack API Server");

    let config = ConfigLoader::new().load()?;
    for (system, section) in config.systems() {
        info!(
            system,
            instances = section.instances.len(),
            configured = section.is_configured(),
            "External system configuration loaded"
        );
    }

    let context = ApiContext::from_config(&config);
    let health = HealthState::new(context.clone(), Some(env!("CARGO_PKG_VERSION").to_string()));
    let (router, openapi) = api_router(context, health.clone());

    let cors = if config.server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = router
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{addr}");

    // Wiring is complete; flip readiness before accepting traffic.
    health.set_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
