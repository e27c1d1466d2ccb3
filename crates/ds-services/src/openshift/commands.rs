//! OpenShift commands

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::{check_optional_instance, non_blank, Command, CommandError};
use crate::error::ExternalServiceError;

use super::OpenShiftService;

const SERVICE: &str = "openshift";
const SYSTEM_LABEL: &str = "OpenShift";

/// Request for a whole secret.
#[derive(Debug, Clone)]
pub struct GetSecretRequest {
    pub instance: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
}

pub struct GetSecretCommand {
    service: Arc<OpenShiftService>,
}

impl Command for GetSecretCommand {
    fn name(&self) -> &'static str {
        "get-secret"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl GetSecretCommand {
    pub fn new(service: Arc<OpenShiftService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &GetSecretRequest) -> Result<(), CommandError> {
        non_blank(&req.name, "name")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(
        &self,
        req: &GetSecretRequest,
    ) -> Result<HashMap<String, String>, CommandError> {
        self.validate(req)?;
        self.service
            .get_secret(
                req.instance.as_deref(),
                req.namespace.as_deref(),
                req.name.trim(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap("GET_SECRET_FAILED", SERVICE, "getSecret", err)
                    .into()
            })
    }
}

/// Request for a single key of a secret.
#[derive(Debug, Clone)]
pub struct GetSecretValueRequest {
    pub instance: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
    pub key: String,
}

pub struct GetSecretValueCommand {
    service: Arc<OpenShiftService>,
}

impl Command for GetSecretValueCommand {
    fn name(&self) -> &'static str {
        "get-secret-value"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl GetSecretValueCommand {
    pub fn new(service: Arc<OpenShiftService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &GetSecretValueRequest) -> Result<(), CommandError> {
        non_blank(&req.name, "name")?;
        non_blank(&req.key, "key")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &GetSecretValueRequest) -> Result<String, CommandError> {
        self.validate(req)?;
        self.service
            .get_secret_value(
                req.instance.as_deref(),
                req.namespace.as_deref(),
                req.name.trim(),
                req.key.trim(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "GET_SECRET_VALUE_FAILED",
                    SERVICE,
                    "getSecretValue",
                    err,
                )
                .into()
            })
    }
}

/// Request for a secret-existence check.
#[derive(Debug, Clone)]
pub struct CheckSecretExistsRequest {
    pub instance: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
}

pub struct CheckSecretExistsCommand {
    service: Arc<OpenShiftService>,
}

impl Command for CheckSecretExistsCommand {
    fn name(&self) -> &'static str {
        "check-secret-exists"
    }

    fn service_name(&self) -> &'static str {
        SERVICE
    }
}

impl CheckSecretExistsCommand {
    pub fn new(service: Arc<OpenShiftService>) -> Self {
        Self { service }
    }

    pub fn validate(&self, req: &CheckSecretExistsRequest) -> Result<(), CommandError> {
        non_blank(&req.name, "name")?;
        check_optional_instance(
            req.instance.as_deref(),
            |n| self.service.has_instance(n),
            SYSTEM_LABEL,
        )
    }

    pub async fn execute(&self, req: &CheckSecretExistsRequest) -> Result<bool, CommandError> {
        self.validate(req)?;
        self.service
            .secret_exists(
                req.instance.as_deref(),
                req.namespace.as_deref(),
                req.name.trim(),
            )
            .await
            .map_err(|err| {
                ExternalServiceError::wrap(
                    "CHECK_SECRET_EXISTS_FAILED",
                    SERVICE,
                    "secretExists",
                    err,
                )
                .into()
            })
    }
}
