//! Service and command error types
//!
//! Two layers, matching the propagation policy: services raise
//! [`ServiceError`] (instance resolution or remote failure, with enough
//! context to print a human-readable message), commands wrap whatever they
//! catch exactly once into an [`ExternalServiceError`] with a stable
//! `{error_code, service_name, operation}` triple. Already-wrapped errors
//! are never re-wrapped.

use reqwest::StatusCode;
use thiserror::Error;

use ds_connect::{classify_transport, ClientHandle, ConnectError, TransportKind};

/// Stable error codes for remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest,
    UpstreamError,
    ConnectionFailed,
    DnsResolutionFailed,
    ReadTimeout,
    InvalidResponse,
    TransportError,
}

impl RemoteErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteErrorCode::Unauthorized => "UNAUTHORIZED",
            RemoteErrorCode::Forbidden => "FORBIDDEN",
            RemoteErrorCode::NotFound => "NOT_FOUND",
            RemoteErrorCode::BadRequest => "BAD_REQUEST",
            RemoteErrorCode::UpstreamError => "UPSTREAM_ERROR",
            RemoteErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            RemoteErrorCode::DnsResolutionFailed => "DNS_RESOLUTION_FAILED",
            RemoteErrorCode::ReadTimeout => "READ_TIMEOUT",
            RemoteErrorCode::InvalidResponse => "INVALID_RESPONSE",
            RemoteErrorCode::TransportError => "TRANSPORT_ERROR",
        }
    }
}

impl From<TransportKind> for RemoteErrorCode {
    fn from(kind: TransportKind) -> Self {
        match kind {
            TransportKind::ReadTimeout => RemoteErrorCode::ReadTimeout,
            TransportKind::ConnectionFailed => RemoteErrorCode::ConnectionFailed,
            TransportKind::DnsResolutionFailed => RemoteErrorCode::DnsResolutionFailed,
            TransportKind::InvalidResponse => RemoteErrorCode::InvalidResponse,
            TransportKind::Other => RemoteErrorCode::TransportError,
        }
    }
}

/// A failed call against one remote instance.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RemoteError {
    pub code: RemoteErrorCode,
    pub system: String,
    pub instance: String,
    pub message: String,
    #[source]
    pub source: Option<reqwest::Error>,
}

impl RemoteError {
    /// Map an HTTP error status to a domain error, most specific first.
    pub fn from_status(
        system: &str,
        instance: &str,
        resource: &str,
        status: StatusCode,
    ) -> Self {
        let (code, message) = match status {
            StatusCode::UNAUTHORIZED => (
                RemoteErrorCode::Unauthorized,
                format!(
                    "Authentication to {system} instance '{instance}' failed (401); \
                     check the configured credentials"
                ),
            ),
            StatusCode::FORBIDDEN => (
                RemoteErrorCode::Forbidden,
                format!(
                    "Access to {resource} on {system} instance '{instance}' was denied (403)"
                ),
            ),
            StatusCode::NOT_FOUND => (
                RemoteErrorCode::NotFound,
                format!("{resource} was not found on {system} instance '{instance}'"),
            ),
            StatusCode::BAD_REQUEST => (
                RemoteErrorCode::BadRequest,
                format!(
                    "{system} instance '{instance}' rejected the request for {resource} (400)"
                ),
            ),
            other => (
                RemoteErrorCode::UpstreamError,
                format!("{system} instance '{instance}' returned {other} for {resource}"),
            ),
        };

        Self {
            code,
            system: system.to_string(),
            instance: instance.to_string(),
            message,
            source: None,
        }
    }

    /// Map a transport failure, inspecting the underlying I/O error rather
    /// than any HTTP status.
    pub fn from_transport(system: &str, instance: &str, source: reqwest::Error) -> Self {
        let kind = classify_transport(&source);
        let code = RemoteErrorCode::from(kind);
        let reason = match kind {
            TransportKind::ReadTimeout => "timed out".to_string(),
            TransportKind::ConnectionFailed => "could not be reached".to_string(),
            TransportKind::DnsResolutionFailed => {
                "could not be resolved (DNS failure)".to_string()
            }
            TransportKind::InvalidResponse => "returned an undecodable response".to_string(),
            TransportKind::Other => format!("failed: {source}"),
        };

        Self {
            code,
            system: system.to_string(),
            instance: instance.to_string(),
            message: format!("{system} instance '{instance}' {reason}"),
            source: Some(source),
        }
    }

    pub(crate) fn not_found(system: &str, handle: &ClientHandle, message: String) -> Self {
        Self {
            code: RemoteErrorCode::NotFound,
            system: system.to_string(),
            instance: handle.instance_name().to_string(),
            message,
            source: None,
        }
    }

    pub(crate) fn invalid_response(
        system: &str,
        handle: &ClientHandle,
        message: String,
    ) -> Self {
        Self {
            code: RemoteErrorCode::InvalidResponse,
            system: system.to_string(),
            instance: handle.instance_name().to_string(),
            message,
            source: None,
        }
    }
}

/// Error type for every service operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Instance resolution failed (no/unknown/blank instance name).
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The remote call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Input could not be turned into a remote request (e.g. no namespace
    /// given and none configured for the instance).
    #[error("{0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &str {
        match self {
            ServiceError::Connect(err) => err.code(),
            ServiceError::Remote(err) => err.code.as_str(),
            ServiceError::InvalidInput(_) => "VALIDATION_ERROR",
        }
    }
}

/// Coarse failure classes the HTTP boundary distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The remote resource is truly absent.
    NotFound,
    /// The caller's input was unusable.
    Validation,
    /// The upstream system failed or could not be reached.
    Upstream,
}

/// The command-boundary error: one wrap, stable triple, cause preserved.
#[derive(Error, Debug)]
#[error("{service_name}/{operation} failed ({error_code}): {message}")]
pub struct ExternalServiceError {
    pub error_code: String,
    pub service_name: &'static str,
    pub operation: &'static str,
    pub message: String,
    #[source]
    pub source: Option<ServiceError>,
}

impl ExternalServiceError {
    /// Wrap a service failure once. The original message is preserved for
    /// humans; the triple identifies the command for machines.
    pub fn wrap(
        error_code: &str,
        service_name: &'static str,
        operation: &'static str,
        source: ServiceError,
    ) -> Self {
        Self {
            error_code: error_code.to_string(),
            service_name,
            operation,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// An error with no underlying service failure (timeouts and task
    /// failures in async command variants).
    pub fn new(
        error_code: &str,
        service_name: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_code: error_code.to_string(),
            service_name,
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// How the HTTP boundary should treat this failure.
    pub fn failure_class(&self) -> FailureClass {
        match &self.source {
            Some(ServiceError::Remote(remote)) if remote.code == RemoteErrorCode::NotFound => {
                FailureClass::NotFound
            }
            Some(ServiceError::InvalidInput(_)) => FailureClass::Validation,
            _ => FailureClass::Upstream,
        }
    }
}
