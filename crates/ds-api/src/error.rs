//! API error type and the exception-to-status mapping table
//!
//! One mapping governs every router: each failure becomes an HTTP status
//! plus an error envelope with a stable code. Handlers return `ApiError`
//! (usually converted from [`CommandError`]) and never build error
//! responses by hand.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use ds_services::{CommandError, FailureClass};

use crate::envelope::Envelope;

/// Everything a handler can fail with, highest specificity first.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String },

    /// Enum-shaped parameter mismatches get their own code so callers can
    /// distinguish "bad role" from generic validation failures.
    #[error("Invalid role '{value}'; allowed roles: {allowed}")]
    InvalidRole { value: String, allowed: String },

    #[error("Invalid value for parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Missing required parameter '{name}'")]
    MissingParameter { name: String },

    #[error("{message}")]
    MalformedBody { message: String },

    #[error("Unsupported content type; supported media types: application/json")]
    UnsupportedMediaType,

    #[error("Method {method} not allowed; supported methods: {allow}")]
    MethodNotAllowed { method: String, allow: String },

    #[error("No route for {method} {uri}")]
    RouteNotFound { method: Method, uri: Uri },

    /// A domain object the caller named does not exist.
    #[error("{message}")]
    NotFound { code: String, message: String },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not authorized")]
    Forbidden,

    /// The upstream system failed; the message names it.
    #[error("{system} request failed: {message}")]
    Upstream {
        system: String,
        code: String,
        message: String,
    },

    #[error("Internal error")]
    Internal { message: String },
}

impl ApiError {
    /// Status and stable code for the envelope.
    fn status_and_code(&self) -> (StatusCode, &str) {
        match self {
            ApiError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidRole { .. } => (StatusCode::BAD_REQUEST, "INVALID_ROLE"),
            ApiError::InvalidParameter { .. } => (StatusCode::BAD_REQUEST, "INVALID_PARAMETER"),
            ApiError::MissingParameter { .. } => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            ApiError::MalformedBody { .. } => (StatusCode::BAD_REQUEST, "MALFORMED_BODY"),
            ApiError::UnsupportedMediaType => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            ApiError::MethodNotAllowed { .. } => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED")
            }
            ApiError::RouteNotFound { .. } => (StatusCode::NOT_FOUND, "NO_SUCH_ROUTE"),
            ApiError::NotFound { code, .. } => (StatusCode::NOT_FOUND, code),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Upstream { code, .. } => (StatusCode::BAD_GATEWAY, code),
            ApiError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let code = code.to_string();

        // The cause stays server-side for 500s; the client gets a generic
        // message.
        let message = match &self {
            ApiError::Internal { message } => {
                error!(cause = %message, "Unhandled internal error");
                "An unexpected error occurred".to_string()
            }
            other => {
                if status.is_server_error() {
                    warn!(code = %code, error = %other, "Upstream failure");
                }
                other.to_string()
            }
        };

        (status, Json(Envelope::error(code, message))).into_response()
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Validation(message) => ApiError::Validation { message },
            CommandError::External(wrapped) => match wrapped.failure_class() {
                FailureClass::NotFound => ApiError::NotFound {
                    code: wrapped.error_code,
                    message: wrapped.message,
                },
                FailureClass::Validation => ApiError::Validation {
                    message: wrapped.message,
                },
                FailureClass::Upstream => ApiError::Upstream {
                    system: wrapped.service_name.to_string(),
                    code: wrapped.error_code,
                    message: wrapped.message,
                },
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ApiError::UnsupportedMediaType,
            JsonRejection::JsonSyntaxError(err) => ApiError::MalformedBody {
                message: format!("Request body is not valid JSON: {err}"),
            },
            JsonRejection::JsonDataError(err) => {
                // serde reports missing fields and type mismatches with
                // distinct messages; surface them under matching templates.
                let detail = err.to_string();
                let message = if detail.contains("missing field") {
                    format!("Request body is missing a required field: {detail}")
                } else {
                    format!("Request body has a field of the wrong type: {detail}")
                };
                ApiError::MalformedBody { message }
            }
            other => ApiError::MalformedBody {
                message: format!("Request body could not be read: {other}"),
            },
        }
    }
}

/// `axum::Json` with rejections funneled through the mapping table.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

/// `axum::extract::Path` with conversion failures mapped to 400 envelopes.
pub struct ApiPath<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    axum::extract::Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ApiError::InvalidParameter {
                name: "path".to_string(),
                message: rejection.body_text(),
            }),
        }
    }
}

/// Router fallback: no route matched.
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound { method, uri }
}

/// Response-mapping layer turning axum's bare 405 (empty body, `Allow`
/// header set) into the standard envelope.
pub async fn envelope_method_not_allowed(method: Method, response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response
        .headers()
        .get(header::ALLOW)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        allow,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_services::ExternalServiceError;

    #[test]
    fn command_validation_maps_to_400() {
        let err: ApiError = CommandError::Validation("projectKey must not be blank".into()).into();
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn upstream_failures_map_to_502_and_keep_the_command_code() {
        let wrapped = ExternalServiceError::new(
            "EXECUTE_WORKFLOW_FAILED",
            "aap",
            "executeWorkflow",
            "aap instance 'prod' returned 500",
        );
        let err: ApiError = CommandError::External(wrapped).into();
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "EXECUTE_WORKFLOW_FAILED");
        assert!(err.to_string().contains("aap"));
    }

    #[test]
    fn invalid_role_has_its_own_code() {
        let err = ApiError::InvalidRole {
            value: "owner".into(),
            allowed: "developer, maintainer, viewer".into(),
        };
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "INVALID_ROLE");
    }
}
