// ── Core error types ──
//
// User-facing errors from kstone-core. Consumers never match on raw CLI
// exit codes: the `From<kstone_api::Error>` impl translates classified
// invocation failures into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Context errors ───────────────────────────────────────────────
    #[error("Missing domain name for resource [{resource}]")]
    MissingDomain { resource: String },

    #[error("Invalid identifier [{identifier}]: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    // ── Invocation errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Identity service unavailable: {message}")]
    Unavailable { message: String },

    #[error("{resource} not found: {identifier}")]
    NotFound { resource: String, identifier: String },

    #[error("{message}")]
    CommandFailed {
        message: String,
        /// Exit status of the tool, when it exited normally.
        status: Option<i32>,
    },

    #[error("Cannot run {program}: {reason}")]
    ToolUnavailable { program: String, reason: String },

    #[error("Unreadable {format} output at line {line}: {reason}")]
    Parse {
        format: &'static str,
        line: usize,
        reason: String,
    },

}

// ── Conversion from invocation errors ────────────────────────────────

impl From<kstone_api::Error> for CoreError {
    fn from(err: kstone_api::Error) -> Self {
        let message = err.to_string();
        match err {
            kstone_api::Error::Unauthorized { .. } => CoreError::AuthenticationFailed { message },
            kstone_api::Error::Forbidden { .. } => CoreError::PermissionDenied { message },
            kstone_api::Error::Transient { .. } => CoreError::Unavailable { message },
            kstone_api::Error::NotFound {
                entity, identifier, ..
            } => CoreError::NotFound {
                resource: entity,
                identifier,
            },
            kstone_api::Error::CommandFailed { status, .. } => {
                CoreError::CommandFailed { message, status }
            }
            kstone_api::Error::Spawn { program, source } => CoreError::ToolUnavailable {
                program,
                reason: source.to_string(),
            },
            kstone_api::Error::Parse {
                format,
                line,
                reason,
            } => CoreError::Parse {
                format,
                line,
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_domain_names_the_resource() {
        let err = CoreError::MissingDomain {
            resource: "name".into(),
        };
        assert_eq!(err.to_string(), "Missing domain name for resource [name]");
    }

    #[test]
    fn command_failure_keeps_the_execution_text() {
        let api = kstone_api::Error::from_failure(
            "/usr/bin/openstack project show --format shell no_project",
            Some(1),
            "Internal Server Error (HTTP 500)",
        );
        let err = CoreError::from(api);
        assert_eq!(
            err.to_string(),
            "Execution of '/usr/bin/openstack project show --format shell no_project' \
             returned 1: Internal Server Error (HTTP 500)"
        );
        assert!(matches!(err, CoreError::CommandFailed { status: Some(1), .. }));
    }

    #[test]
    fn unauthorized_maps_to_authentication_failure() {
        let api = kstone_api::Error::from_failure(
            "openstack domain list",
            Some(1),
            "The request you have made requires authentication. (HTTP 401)",
        );
        assert!(matches!(
            CoreError::from(api),
            CoreError::AuthenticationFailed { .. }
        ));
    }

    #[test]
    fn missing_entity_keeps_its_kind() {
        let api = kstone_api::Error::from_failure(
            "openstack project show --format shell p --domain Ghost",
            Some(1),
            "No domain with a name or ID of 'Ghost' exists.",
        );
        let err = CoreError::from(api);
        assert_eq!(err.to_string(), "domain not found: Ghost");
    }
}
