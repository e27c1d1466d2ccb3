//! Command layer contract
//!
//! Every external operation is exposed through a thin command: validate the
//! request, invoke one service method, wrap any failure once. Commands also
//! expose two pure metadata accessors (a lower-kebab-case command name and
//! the owning service's short name) used for registry lookup and log
//! tagging, never for business logic.
//!
//! Validation order is fixed: operation-specific field checks first (each
//! required string trimmed and non-blank), then the instance-existence check
//! when the request names an instance. Request non-nullness is carried by
//! the type system here; there is no null request to reject.

use thiserror::Error;

use crate::error::ExternalServiceError;

/// Command metadata, shared by every command across all services.
pub trait Command {
    /// Stable lower-kebab-case command name (e.g. "get-secret-value").
    fn name(&self) -> &'static str;

    /// Short name of the owning service (e.g. "openshift").
    fn service_name(&self) -> &'static str;
}

/// Command-boundary failure: either the request never qualified for a remote
/// call, or the call failed and was wrapped.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    External(#[from] ExternalServiceError),
}

/// Require a trimmed, non-blank string field.
pub(crate) fn non_blank<'a>(value: &'a str, field: &str) -> Result<&'a str, CommandError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed)
}

/// When the request names an instance, it must exist in the registry.
/// `system_label` is the capitalized system name for the message, per the
/// uniform template `"<System> instance '<name>' does not exist"`.
pub(crate) fn check_instance(
    exists: bool,
    system_label: &str,
    name: &str,
) -> Result<(), CommandError> {
    if !exists {
        return Err(CommandError::Validation(format!(
            "{system_label} instance '{name}' does not exist"
        )));
    }
    Ok(())
}

/// Validate an optional instance-name field: blank values are rejected,
/// named instances must exist, absence means "use the default".
pub(crate) fn check_optional_instance(
    instance: Option<&str>,
    has_instance: impl Fn(&str) -> bool,
    system_label: &str,
) -> Result<(), CommandError> {
    if let Some(name) = instance {
        let name = non_blank(name, "instance")?;
        check_instance(has_instance(name), system_label, name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_name_the_field() {
        let err = non_blank("   ", "projectKey").unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
        assert_eq!(err.to_string(), "projectKey must not be blank");
    }

    #[test]
    fn unknown_instance_uses_the_uniform_template() {
        let err = check_instance(false, "Bitbucket", "qa").unwrap_err();
        assert_eq!(err.to_string(), "Bitbucket instance 'qa' does not exist");
    }

    #[test]
    fn absent_instance_field_is_accepted() {
        check_optional_instance(None, |_| false, "Jira").unwrap();
        check_optional_instance(Some("dev"), |n| n == "dev", "Jira").unwrap();
        let err = check_optional_instance(Some(" "), |_| true, "Jira").unwrap_err();
        assert_eq!(err.to_string(), "instance must not be blank");
    }
}
