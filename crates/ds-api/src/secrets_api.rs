//! Secrets API (OpenShift)
//!
//! Values are returned decoded; the base64 transport encoding of the
//! cluster API never reaches callers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use ds_services::openshift::{
    CheckSecretExistsCommand, CheckSecretExistsRequest, GetSecretCommand, GetSecretRequest,
    GetSecretValueCommand, GetSecretValueRequest,
};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiPath};
use crate::project_api::ExistsResponse;
use crate::ApiContext;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SecretQuery {
    /// Cluster (instance) name; default when absent.
    pub instance: Option<String>,

    /// Namespace; the instance's configured default when absent.
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SecretResponse {
    pub name: String,
    pub data: HashMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SecretValueResponse {
    pub name: String,
    pub key: String,
    pub value: String,
}

#[derive(Clone)]
pub struct SecretsState {
    pub get_secret: Arc<GetSecretCommand>,
    pub get_value: Arc<GetSecretValueCommand>,
    pub exists: Arc<CheckSecretExistsCommand>,
}

/// A whole secret, decoded
#[utoipa::path(
    get,
    path = "/api/v1/secrets/{name}",
    tag = "secrets",
    params(
        ("name" = String, Path, description = "Secret name"),
        SecretQuery
    ),
    responses(
        (status = 200, description = "Decoded secret", body = Envelope<SecretResponse>),
        (status = 404, description = "Secret not found"),
        (status = 502, description = "Cluster unavailable")
    )
)]
pub async fn get_secret(
    State(state): State<SecretsState>,
    ApiPath(name): ApiPath<String>,
    Query(query): Query<SecretQuery>,
) -> Result<Json<Envelope<SecretResponse>>, ApiError> {
    let data = state
        .get_secret
        .execute(&GetSecretRequest {
            instance: query.instance,
            namespace: query.namespace,
            name: name.clone(),
        })
        .await?;
    Ok(Json(Envelope::ok(SecretResponse { name, data })))
}

/// One key of a secret
#[utoipa::path(
    get,
    path = "/api/v1/secrets/{name}/keys/{key}",
    tag = "secrets",
    params(
        ("name" = String, Path, description = "Secret name"),
        ("key" = String, Path, description = "Key within the secret"),
        SecretQuery
    ),
    responses(
        (status = 200, description = "Decoded value", body = Envelope<SecretValueResponse>),
        (status = 404, description = "Secret or key not found"),
        (status = 502, description = "Cluster unavailable")
    )
)]
pub async fn get_secret_value(
    State(state): State<SecretsState>,
    ApiPath((name, key)): ApiPath<(String, String)>,
    Query(query): Query<SecretQuery>,
) -> Result<Json<Envelope<SecretValueResponse>>, ApiError> {
    let value = state
        .get_value
        .execute(&GetSecretValueRequest {
            instance: query.instance,
            namespace: query.namespace,
            name: name.clone(),
            key: key.clone(),
        })
        .await?;
    Ok(Json(Envelope::ok(SecretValueResponse { name, key, value })))
}

/// Whether a secret exists
#[utoipa::path(
    get,
    path = "/api/v1/secrets/{name}/exists",
    tag = "secrets",
    params(
        ("name" = String, Path, description = "Secret name"),
        SecretQuery
    ),
    responses(
        (status = 200, description = "Existence answer", body = Envelope<ExistsResponse>)
    )
)]
pub async fn secret_exists(
    State(state): State<SecretsState>,
    ApiPath(name): ApiPath<String>,
    Query(query): Query<SecretQuery>,
) -> Result<Json<Envelope<ExistsResponse>>, ApiError> {
    let exists = state
        .exists
        .execute(&CheckSecretExistsRequest {
            instance: query.instance,
            namespace: query.namespace,
            name,
        })
        .await?;
    Ok(Json(Envelope::ok(ExistsResponse { exists })))
}

pub fn secrets_router(context: &ApiContext) -> OpenApiRouter {
    let state = SecretsState {
        get_secret: Arc::new(GetSecretCommand::new(Arc::clone(&context.openshift))),
        get_value: Arc::new(GetSecretValueCommand::new(Arc::clone(&context.openshift))),
        exists: Arc::new(CheckSecretExistsCommand::new(Arc::clone(&context.openshift))),
    };
    OpenApiRouter::new()
        .routes(routes!(get_secret))
        .routes(routes!(get_secret_value))
        .routes(routes!(secret_exists))
        .with_state(state)
}
