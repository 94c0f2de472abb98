use thiserror::Error;

use crate::invocation::Resource;

/// Top-level error type for the `kstone-api` crate.
///
/// Every failure of the external tool arrives as free text on stderr. The
/// text is classified once, in [`classify`], and the resulting variant is
/// what callers branch on. `kstone-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Classified command failures ─────────────────────────────────
    /// The tool reported that an entity does not exist. `entity` is the
    /// kind it named, which is not always the kind that was requested.
    #[error("Execution of '{command}' returned {}: {message}", status_text(.status))]
    NotFound {
        command: String,
        status: Option<i32>,
        entity: String,
        identifier: String,
        message: String,
    },

    /// Credentials were rejected (HTTP 401).
    #[error("Authentication failed running '{command}': {message}")]
    Unauthorized { command: String, message: String },

    /// Credentials were accepted but lack the required role (HTTP 403).
    #[error("Permission denied running '{command}': {message}")]
    Forbidden { command: String, message: String },

    /// The identity endpoint was unreachable or temporarily unavailable.
    #[error("Execution of '{command}' returned {}: {message}", status_text(.status))]
    Transient {
        command: String,
        status: Option<i32>,
        message: String,
    },

    /// Any other non-zero exit.
    #[error("Execution of '{command}' returned {}: {message}", status_text(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        message: String,
    },

    // ── Process ─────────────────────────────────────────────────────
    /// The tool could not be started at all.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Tool output did not match the requested format.
    #[error("Malformed {format} output at line {line}: {reason}")]
    Parse {
        format: &'static str,
        line: usize,
        reason: String,
    },
}

#[allow(clippy::ref_option)]
fn status_text(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".into(), |code| code.to_string())
}

/// Coarse category of a command failure, derived from its message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Unauthorized,
    Forbidden,
    Transient,
    Other,
}

// The tool's messages are not a stable contract. Every pattern the crate
// depends on lives in these tables; matching is case-insensitive.
const NOT_FOUND_MARKER: &str = " with a name or id of ";

const UNAUTHORIZED_PATTERNS: &[&str] = &["http 401"];

const FORBIDDEN_PATTERNS: &[&str] = &["http 403"];

const TRANSIENT_PATTERNS: &[&str] = &[
    "unable to establish connection",
    "connection refused",
    "http 502",
    "http 503",
    "http 504",
    "service unavailable",
    "gateway time-out",
    "keystone service is unavailable",
    "key not valid",
    "timed out",
];

/// The entity kind and identifier named by a not-found message.
///
/// Not-found messages have the shape `No <entity> with a name or ID of
/// '<x>' exists.`. The `No <entity>` prefix is required so that unrelated
/// text mentioning IDs does not match.
fn missing_entity(message: &str) -> Option<(String, String)> {
    // ASCII lowering keeps byte offsets valid for slicing `message`.
    let lower = message.to_ascii_lowercase();
    let at = lower.find(NOT_FOUND_MARKER)?;
    let head = &lower[..at];
    let start = head.rfind("no ")?;
    if head[..start].ends_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }
    let entity = head[start + 3..].trim();
    if entity.is_empty() || entity.contains(char::is_whitespace) {
        return None;
    }

    let tail = message[at + NOT_FOUND_MARKER.len()..]
        .lines()
        .next()
        .unwrap_or_default();
    let identifier = tail
        .strip_prefix('\'')
        .and_then(|rest| rest.rfind('\'').map(|end| &rest[..end]))
        .unwrap_or_else(|| tail.trim_end_matches(" exists.").trim());
    Some((entity.to_owned(), identifier.to_owned()))
}

/// Classify a failure message from the external tool.
pub fn classify(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    let matches = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

    if missing_entity(message).is_some() {
        FailureKind::NotFound
    } else if matches(UNAUTHORIZED_PATTERNS) {
        FailureKind::Unauthorized
    } else if matches(FORBIDDEN_PATTERNS) {
        FailureKind::Forbidden
    } else if matches(TRANSIENT_PATTERNS) {
        FailureKind::Transient
    } else {
        FailureKind::Other
    }
}

impl Error {
    /// Build the error for a non-zero exit, classifying its message.
    pub fn from_failure(command: impl Into<String>, status: Option<i32>, message: &str) -> Self {
        let command = command.into();
        let message = message.trim().to_owned();
        if let Some((entity, identifier)) = missing_entity(&message) {
            return Self::NotFound {
                command,
                status,
                entity,
                identifier,
                message,
            };
        }
        match classify(&message) {
            FailureKind::Unauthorized => Self::Unauthorized { command, message },
            FailureKind::Forbidden => Self::Forbidden { command, message },
            FailureKind::Transient => Self::Transient {
                command,
                status,
                message,
            },
            FailureKind::NotFound | FailureKind::Other => Self::CommandFailed {
                command,
                status,
                message,
            },
        }
    }

    /// Returns `true` if the tool reported a missing entity of any kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` only if the missing entity is a `resource`. A
    /// `project show` that fails because its `--domain` does not exist is
    /// not a missing project.
    pub fn is_not_found_for(&self, resource: Resource) -> bool {
        match self {
            Self::NotFound { entity, .. } => *entity == resource.to_string(),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns `true` if the credentials were rejected or insufficient.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Forbidden { .. })
    }

    /// The command line that failed, if this error came from one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::NotFound { command, .. }
            | Self::Unauthorized { command, .. }
            | Self::Forbidden { command, .. }
            | Self::Transient { command, .. }
            | Self::CommandFailed { command, .. } => Some(command),
            Self::Spawn { .. } | Self::Parse { .. } => None,
        }
    }

    /// Replace each secret value in the quoted command line with a marker.
    #[must_use]
    pub fn redact(mut self, secrets: &[&str]) -> Self {
        if let Self::NotFound { command, .. }
        | Self::Unauthorized { command, .. }
        | Self::Forbidden { command, .. }
        | Self::Transient { command, .. }
        | Self::CommandFailed { command, .. } = &mut self
        {
            for secret in secrets.iter().filter(|s| !s.is_empty()) {
                *command = command.replace(secret, crate::invocation::REDACTED);
            }
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classifies_missing_project() {
        let msg = "No project with a name or ID of 'no_project' exists.";
        assert_eq!(classify(msg), FailureKind::NotFound);
    }

    #[test]
    fn classifies_missing_user_case_insensitively() {
        assert_eq!(
            classify("NO USER WITH A NAME OR ID OF 'x' EXISTS."),
            FailureKind::NotFound
        );
    }

    #[test]
    fn classifies_http_codes() {
        assert_eq!(
            classify("The request you have made requires authentication. (HTTP 401)"),
            FailureKind::Unauthorized
        );
        assert_eq!(
            classify("You are not authorized to perform the requested action. (HTTP 403)"),
            FailureKind::Forbidden
        );
        assert_eq!(
            classify("Service Unavailable (HTTP 503)"),
            FailureKind::Transient
        );
    }

    #[test]
    fn classifies_connection_failures_as_transient() {
        let msg = "Failed to discover available identity versions when contacting \
                   http://127.0.0.1:5000/v3. Attempting to parse version from URL.\n\
                   Unable to establish connection to http://127.0.0.1:5000/v3/auth/tokens";
        assert_eq!(classify(msg), FailureKind::Transient);
    }

    #[test]
    fn unrelated_failure_is_other() {
        assert_eq!(
            classify("Conflict occurred attempting to store project - it is not permitted to have two projects with the same name in the same domain (HTTP 409)"),
            FailureKind::Other
        );
    }

    #[test]
    fn redact_masks_secrets_in_the_command() {
        let err = Error::from_failure(
            "openstack user create --format shell --password s3cret bob",
            Some(1),
            "Conflict (HTTP 409)",
        )
        .redact(&["s3cret"]);
        assert_eq!(
            err.command(),
            Some("openstack user create --format shell --password [REDACTED] bob")
        );
        assert!(!err.to_string().contains("s3cret"));
    }

    #[test]
    fn from_failure_renders_execution_message() {
        let err = Error::from_failure(
            "/usr/bin/openstack project show --format shell no_project",
            Some(1),
            "No project with a name or ID of 'no_project' exists.\n",
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Execution of '/usr/bin/openstack project show --format shell no_project' \
             returned 1: No project with a name or ID of 'no_project' exists."
        );
    }

    #[test]
    fn not_found_names_the_missing_entity() {
        let err = Error::from_failure(
            "openstack project show --format shell p --domain Ghost",
            Some(1),
            "No domain with a name or ID of 'Ghost' exists.",
        );
        assert!(err.is_not_found());
        assert!(err.is_not_found_for(Resource::Domain));
        assert!(!err.is_not_found_for(Resource::Project));
        match err {
            Error::NotFound {
                entity, identifier, ..
            } => {
                assert_eq!(entity, "domain");
                assert_eq!(identifier, "Ghost");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bare_id_mention_is_not_a_missing_entity() {
        assert_eq!(missing_entity("Project with a name or ID of 'x' is disabled"), None);
        assert_eq!(missing_entity("casino project with a name or ID of 'x'"), None);
        assert_eq!(
            classify("Could not find resource x"),
            FailureKind::Other
        );
    }

    #[test]
    fn identifier_stops_at_the_first_line() {
        let (entity, identifier) = missing_entity(
            "No user with a name or ID of 'O'Neil' exists.\nsee 'openstack --help'",
        )
        .unwrap();
        assert_eq!(entity, "user");
        assert_eq!(identifier, "O'Neil");
    }
}
