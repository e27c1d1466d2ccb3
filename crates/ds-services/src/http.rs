//! Shared request plumbing for the service modules

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use ds_connect::ClientHandle;

use crate::error::RemoteError;

/// Send a request, mapping transport failures (timeout/DNS/refused) to a
/// classified [`RemoteError`]. The HTTP status is left for the caller, so
/// existence predicates can treat 404 as an answer rather than an error.
pub(crate) async fn send(
    system: &str,
    handle: &ClientHandle,
    builder: RequestBuilder,
) -> Result<Response, RemoteError> {
    builder
        .send()
        .await
        .map_err(|err| RemoteError::from_transport(system, handle.instance_name(), err))
}

/// Send a request and require a success status; error statuses are mapped
/// with `resource` naming what was asked for.
pub(crate) async fn send_expect_success(
    system: &str,
    handle: &ClientHandle,
    resource: &str,
    builder: RequestBuilder,
) -> Result<Response, RemoteError> {
    let response = send(system, handle, builder).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::from_status(
            system,
            handle.instance_name(),
            resource,
            status,
        ));
    }
    Ok(response)
}

/// Decode a success response body, mapping decode failures to
/// `INVALID_RESPONSE`.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    system: &str,
    handle: &ClientHandle,
    resource: &str,
    response: Response,
) -> Result<T, RemoteError> {
    response.json().await.map_err(|err| RemoteError {
        code: crate::error::RemoteErrorCode::InvalidResponse,
        system: system.to_string(),
        instance: handle.instance_name().to_string(),
        message: format!(
            "{system} instance '{}' returned an undecodable body for {resource}: {err}",
            handle.instance_name()
        ),
        source: Some(err),
    })
}

/// Send, require success, and decode in one step.
pub(crate) async fn get_json<T: DeserializeOwned>(
    system: &str,
    handle: &ClientHandle,
    resource: &str,
    builder: RequestBuilder,
) -> Result<T, RemoteError> {
    let response = send_expect_success(system, handle, resource, builder).await?;
    decode_json(system, handle, resource, response).await
}

/// Shared existence-predicate shape: success is `true`, 404 is `false`, and
/// every other failure (401/403/5xx/transport) is still an error, because it
/// means the check itself could not be performed.
pub(crate) async fn exists(
    system: &str,
    handle: &ClientHandle,
    resource: &str,
    builder: RequestBuilder,
) -> Result<bool, RemoteError> {
    let response = send(system, handle, builder).await?;
    match response.status() {
        status if status.is_success() => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        status => Err(RemoteError::from_status(
            system,
            handle.instance_name(),
            resource,
            status,
        )),
    }
}
