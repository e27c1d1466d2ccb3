//! OpenShift adapter
//!
//! Wraps the cluster API for secret retrieval and identity self-checks.
//! Secret values arrive base64-encoded from the API; this module decodes
//! them, so callers always see plaintext.

mod commands;

pub use commands::{
    CheckSecretExistsCommand, CheckSecretExistsRequest, GetSecretCommand, GetSecretRequest,
    GetSecretValueCommand, GetSecretValueRequest,
};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use ds_connect::{ClientFactory, ClientHandle};

use crate::error::{RemoteError, ServiceError};
use crate::http;

const SYSTEM: &str = "openshift";

#[derive(Debug, Deserialize)]
struct SecretDto {
    #[serde(default)]
    data: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    metadata: UserMetadataDto,
}

#[derive(Debug, Deserialize)]
struct UserMetadataDto {
    name: String,
}

/// OpenShift business operations, addressed by instance (cluster) name.
pub struct OpenShiftService {
    factory: Arc<ClientFactory>,
}

impl OpenShiftService {
    pub fn new(factory: Arc<ClientFactory>) -> Self {
        Self { factory }
    }

    pub fn has_instance(&self, name: &str) -> bool {
        self.factory.has_instance(name)
    }

    fn handle_for(&self, instance: Option<&str>) -> Result<ClientHandle, ServiceError> {
        match instance {
            Some(name) => Ok(self.factory.client_for(name)?),
            None => Ok(self.factory.client()?),
        }
    }

    /// Namespace for a call: explicit parameter, else the instance's
    /// configured default.
    fn resolve_namespace(
        handle: &ClientHandle,
        namespace: Option<&str>,
    ) -> Result<String, ServiceError> {
        if let Some(ns) = namespace {
            if !ns.trim().is_empty() {
                return Ok(ns.trim().to_string());
            }
        }
        handle
            .config()
            .namespace
            .clone()
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "No namespace given and openshift instance '{}' has no default namespace",
                    handle.instance_name()
                ))
            })
    }

    /// Read a secret and decode its values. Every value is base64 in the
    /// API payload; decoded bytes must be valid UTF-8.
    pub async fn get_secret(
        &self,
        instance: Option<&str>,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<HashMap<String, String>, ServiceError> {
        let handle = self.handle_for(instance)?;
        let ns = Self::resolve_namespace(&handle, namespace)?;
        let resource = format!("secret '{name}' in namespace '{ns}'");
        let path = format!("api/v1/namespaces/{ns}/secrets/{name}");
        let dto: SecretDto =
            http::get_json(SYSTEM, &handle, &resource, handle.get(&path)).await?;

        let mut decoded = HashMap::with_capacity(dto.data.len());
        for (key, value) in dto.data {
            let bytes = BASE64.decode(value.as_bytes()).map_err(|err| {
                RemoteError::invalid_response(
                    SYSTEM,
                    &handle,
                    format!("Secret '{name}' key '{key}' is not valid base64: {err}"),
                )
            })?;
            let text = String::from_utf8(bytes).map_err(|_| {
                RemoteError::invalid_response(
                    SYSTEM,
                    &handle,
                    format!("Secret '{name}' key '{key}' is not valid UTF-8"),
                )
            })?;
            decoded.insert(key, text);
        }
        Ok(decoded)
    }

    /// One key of a secret. A present secret without the key is a
    /// not-found failure naming the available keys.
    pub async fn get_secret_value(
        &self,
        instance: Option<&str>,
        namespace: Option<&str>,
        name: &str,
        key: &str,
    ) -> Result<String, ServiceError> {
        let handle = self.handle_for(instance)?;
        let mut secret = self.get_secret(instance, namespace, name).await?;
        secret.remove(key).ok_or_else(|| {
            let mut available: Vec<_> = secret.keys().cloned().collect();
            available.sort();
            RemoteError::not_found(
                SYSTEM,
                &handle,
                format!(
                    "Key '{key}' not found in secret '{name}' (available keys: {})",
                    available.join(", ")
                ),
            )
            .into()
        })
    }

    /// Whether a secret exists (404 answers `false`).
    pub async fn secret_exists(
        &self,
        instance: Option<&str>,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<bool, ServiceError> {
        let handle = self.handle_for(instance)?;
        let ns = Self::resolve_namespace(&handle, namespace)?;
        let resource = format!("secret '{name}' in namespace '{ns}'");
        let path = format!("api/v1/namespaces/{ns}/secrets/{name}");
        Ok(http::exists(SYSTEM, &handle, &resource, handle.get(&path)).await?)
    }

    /// The username the configured token authenticates as.
    pub async fn whoami(&self, instance: Option<&str>) -> Result<String, ServiceError> {
        let handle = self.handle_for(instance)?;
        let dto: UserDto = http::get_json(
            SYSTEM,
            &handle,
            "current user",
            handle.get("apis/user.openshift.io/v1/users/~"),
        )
        .await?;
        Ok(dto.metadata.name)
    }

    /// Probe one cluster with a live `whoami` call (a configuration check
    /// alone would not prove connectivity). Never fails.
    pub async fn validate_connection(&self, instance: Option<&str>) -> bool {
        match self.whoami(instance).await {
            Ok(_) => true,
            Err(err) => {
                warn!(system = SYSTEM, error = %err, "Connection validation failed");
                false
            }
        }
    }

    /// Aggregated health: `true` if any configured cluster is reachable.
    pub async fn is_healthy(&self) -> bool {
        for name in self.factory.available_instances() {
            if self.validate_connection(Some(&name)).await {
                return true;
            }
        }
        false
    }
}
