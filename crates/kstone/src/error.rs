//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use kstone_config::ConfigError;
use kstone_core::CoreError;

/// Process exit codes. Success is 0.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Identity service ─────────────────────────────────────────────
    #[error("Identity service unavailable: {message}")]
    #[diagnostic(
        code(kstone::unavailable),
        help("Check that the endpoint in OS_AUTH_URL is reachable.\nTry: kstone auth url")
    )]
    Unavailable { message: String },

    #[error("Identity service still unavailable after {seconds}s: {message}")]
    #[diagnostic(
        code(kstone::timeout),
        help("Increase the retry budget with --request-timeout or check the service.")
    )]
    Timeout { seconds: u64, message: String },

    #[error("Cannot run {program}: {reason}")]
    #[diagnostic(
        code(kstone::tool_missing),
        help(
            "Install python-openstackclient, or point kstone at the executable\n\
             with --program or `program` in the config file."
        )
    )]
    ToolMissing { program: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(kstone::auth_failed),
        help(
            "Verify OS_USERNAME/OS_PASSWORD (or the profile's credentials).\n\
             Store a new password with: kstone config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(kstone::no_credentials),
        help(
            "Export OS_USERNAME and OS_PASSWORD, source an openrc file,\n\
             or configure a profile with: kstone config init"
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(kstone::permission_denied),
        help("The credentials lack the admin role needed for this operation.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(kstone::not_found),
        help("Run: kstone {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(kstone::command_failed))]
    CommandFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kstone::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(kstone::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: kstone config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(kstone::config), help("Check the file shown by: kstone config path"))]
    Config { message: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(code(kstone::keyring))]
    Keyring { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(kstone::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// An unavailable service that was retried for `seconds` has timed out.
    #[must_use]
    pub fn with_retry_budget(self, seconds: u64) -> Self {
        match self {
            Self::Unavailable { message } if seconds > 0 => Self::Timeout { seconds, message },
            other => other,
        }
    }

    pub fn not_found(resource_type: &str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            list_command: format!("{resource_type} list"),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingDomain { .. } => CliError::Validation {
                field: "domain".into(),
                reason: err.to_string(),
            },
            CoreError::InvalidIdentifier { identifier, reason } => CliError::Validation {
                field: "name".into(),
                reason: format!("'{identifier}': {reason}"),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },
            CoreError::Unavailable { message } => CliError::Unavailable { message },
            CoreError::ToolUnavailable { program, reason } => {
                CliError::ToolMissing { program, reason }
            }

            CoreError::NotFound {
                resource,
                identifier,
            } => CliError::not_found(&resource, identifier),

            CoreError::CommandFailed { message, .. } => CliError::CommandFailed { message },
            CoreError::Parse { .. } => CliError::CommandFailed {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Keyring(message) => CliError::Keyring { message },
            ConfigError::Io(err) => CliError::Io(err),
            ConfigError::Serialization(_) | ConfigError::Figment(_) => CliError::Config {
                message: err.to_string(),
            },
        }
    }
}
