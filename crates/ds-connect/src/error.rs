//! Connection errors and transport failure classification

use thiserror::Error;

/// Errors raised while resolving an instance name to a client.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("No {system} instances configured")]
    NoInstancesConfigured { system: String },

    #[error("No {system} instance name given; available instances: {}", .available.join(", "))]
    MissingInstanceName {
        system: String,
        available: Vec<String>,
    },

    #[error("{system} instance '{name}' is not configured; available instances: {}", .available.join(", "))]
    InstanceNotConfigured {
        system: String,
        name: String,
        available: Vec<String>,
    },

    #[error("Failed to build HTTP client for {system} instance '{name}': {source}")]
    ClientBuild {
        system: String,
        name: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ConnectError {
    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectError::NoInstancesConfigured { .. } => "NO_INSTANCES_CONFIGURED",
            ConnectError::MissingInstanceName { .. } => "MISSING_INSTANCE_NAME",
            ConnectError::InstanceNotConfigured { .. } => "INSTANCE_NOT_CONFIGURED",
            ConnectError::ClientBuild { .. } => "CLIENT_BUILD_FAILED",
        }
    }
}

/// Why a remote call failed at the transport layer, before any HTTP status
/// was available. Derived from the underlying I/O failure, not guessed from
/// the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The read deadline elapsed.
    ReadTimeout,
    /// TCP connect failed (connection refused, unreachable, TLS setup).
    ConnectionFailed,
    /// The hostname could not be resolved.
    DnsResolutionFailed,
    /// The remote answered but the body could not be decoded.
    InvalidResponse,
    /// Anything else reqwest reports.
    Other,
}

impl TransportKind {
    pub fn code(&self) -> &'static str {
        match self {
            TransportKind::ReadTimeout => "READ_TIMEOUT",
            TransportKind::ConnectionFailed => "CONNECTION_FAILED",
            TransportKind::DnsResolutionFailed => "DNS_RESOLUTION_FAILED",
            TransportKind::InvalidResponse => "INVALID_RESPONSE",
            TransportKind::Other => "TRANSPORT_ERROR",
        }
    }
}

/// Classify a reqwest transport error by inspecting it and its source chain.
///
/// hyper does not expose a typed DNS error across its public API, so DNS
/// failures are recognized by the resolver's message text. Connection
/// refusal is detected from the `std::io::Error` kind in the chain.
pub fn classify_transport(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        return TransportKind::ReadTimeout;
    }
    if err.is_decode() {
        return TransportKind::InvalidResponse;
    }
    if err.is_connect() || err.is_request() {
        if chain_is_dns_failure(err) {
            return TransportKind::DnsResolutionFailed;
        }
        return TransportKind::ConnectionFailed;
    }
    TransportKind::Other
}

fn chain_is_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_codes_are_stable() {
        let err = ConnectError::NoInstancesConfigured {
            system: "bitbucket".into(),
        };
        assert_eq!(err.code(), "NO_INSTANCES_CONFIGURED");

        let err = ConnectError::InstanceNotConfigured {
            system: "jira".into(),
            name: "qa".into(),
            available: vec!["dev".into(), "prod".into()],
        };
        assert_eq!(err.code(), "INSTANCE_NOT_CONFIGURED");
        assert_eq!(
            err.to_string(),
            "jira instance 'qa' is not configured; available instances: dev, prod"
        );
    }

    #[test]
    fn missing_name_lists_available_instances() {
        let err = ConnectError::MissingInstanceName {
            system: "openshift".into(),
            available: vec!["dev".into()],
        };
        assert!(err.to_string().contains("available instances: dev"));
    }

    #[tokio::test]
    async fn connection_refused_classifies_as_connection_failed() {
        // Bind a listener to grab a free port, then drop it so nothing is
        // listening when the request goes out.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = reqwest::Client::new();
        let err = client
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .unwrap_err();

        assert_eq!(classify_transport(&err), TransportKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn unresolvable_host_classifies_as_dns_failure() {
        let client = reqwest::Client::new();
        let err = client
            .get("http://devstack-no-such-host.invalid/")
            .send()
            .await
            .unwrap_err();

        assert_eq!(
            classify_transport(&err),
            TransportKind::DnsResolutionFailed
        );
    }
}
