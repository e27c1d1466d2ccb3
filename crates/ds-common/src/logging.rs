//! Structured logging bootstrap
//!
//! Every binary in the workspace initializes tracing through this module so
//! log output is uniform across services:
//! - `LOG_FORMAT=json` switches to flattened JSON lines for log aggregation
//! - anything else produces human-readable text for development
//! - `RUST_LOG` carries the level filter (default: info), e.g.
//!   `RUST_LOG=ds_services=debug,tower_http=info`

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format, resolved from the `LOG_FORMAT` environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Resolve the format from the environment. Anything other than "json"
    /// (case-insensitive) falls back to text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Initialize the global tracing subscriber for the named service.
///
/// Panics if a subscriber is already installed, so call it once from `main`.
pub fn init_logging(service_name: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match LogFormat::from_env() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_current_span(true)
                        .with_span_list(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_file(false)
                        .with_line_number(false)
                        .with_ansi(true),
                )
                .init();
        }
    }

    tracing::info!(service = service_name, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_defaults_to_text() {
        // LOG_FORMAT is unset in the test environment
        if std::env::var("LOG_FORMAT").is_err() {
            assert_eq!(LogFormat::from_env(), LogFormat::Text);
        }
    }
}
