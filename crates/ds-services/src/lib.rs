//! DevStack external system adapters
//!
//! One module per aggregated system (Bitbucket, Jira, OpenShift, AAP,
//! UiPath, webhook proxy). Each module carries a `Service` that owns the
//! business operations against the remote API and a set of `Command`
//! wrappers that validate a request, invoke one service operation, and wrap
//! any failure exactly once into an [`ExternalServiceError`] carrying a
//! stable `{error_code, service_name, operation}` triple.
//!
//! Services never leak transport types: response DTOs are private, public
//! results use each module's own model types.

pub mod aap;
pub mod bitbucket;
pub mod command;
pub mod error;
mod http;
pub mod jira;
pub mod openshift;
pub mod uipath;
pub mod webhook_proxy;

pub use command::{Command, CommandError};
pub use error::{ExternalServiceError, FailureClass, RemoteError, RemoteErrorCode, ServiceError};
