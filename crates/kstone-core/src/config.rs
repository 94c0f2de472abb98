// ── Runtime provider configuration ──
//
// These types describe *how* to reach the identity service through the
// CLI. They carry credential data and invocation tuning but never touch
// disk: the CLI resolves them from profiles, rc-files and the environment
// and hands a finished `ProviderConfig` in.

use std::path::PathBuf;
use std::time::Duration;

use kstone_api::{CommandEnv, RetryPolicy};
use secrecy::SecretString;
use url::Url;

/// Domain ID Keystone assigns to its built-in default domain.
pub const DEFAULT_DOMAIN_ID: &str = "default";

/// What a password-authenticated token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScope {
    /// System scope, usually `all`. Required for domain management.
    System(String),
    /// Project scope.
    Project { name: String, domain_name: String },
    /// Domain scope.
    Domain(String),
}

/// How to authenticate each CLI call.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Username and password against the v3 password plugin.
    Password {
        username: String,
        password: SecretString,
        user_domain_name: String,
        scope: AuthScope,
    },
    /// A pre-issued token.
    Token { token: SecretString },
}

/// Resolved credential context for one reconciliation run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub auth_url: Url,
    pub auth: AuthCredentials,
    pub identity_api_version: String,
    pub region_name: Option<String>,
    pub interface: Option<String>,
}

impl Credentials {
    /// Password credentials with system scope `all`, the scope the
    /// provider needs to manage domains.
    pub fn system(auth_url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            auth_url,
            auth: AuthCredentials::Password {
                username: username.into(),
                password,
                user_domain_name: "Default".into(),
                scope: AuthScope::System("all".into()),
            },
            identity_api_version: "3".into(),
            region_name: None,
            interface: None,
        }
    }

    /// Render as the `OS_*` variables the CLI reads.
    pub fn to_env(&self) -> CommandEnv {
        let mut env = CommandEnv::new();
        env.set("OS_AUTH_URL", self.auth_url.as_str())
            .set("OS_IDENTITY_API_VERSION", self.identity_api_version.as_str());

        match &self.auth {
            AuthCredentials::Password {
                username,
                password,
                user_domain_name,
                scope,
            } => {
                env.set("OS_USERNAME", username.as_str())
                    .set_secret("OS_PASSWORD", password.clone())
                    .set("OS_USER_DOMAIN_NAME", user_domain_name.as_str());
                match scope {
                    AuthScope::System(system) => {
                        env.set("OS_SYSTEM_SCOPE", system.as_str());
                    }
                    AuthScope::Project { name, domain_name } => {
                        env.set("OS_PROJECT_NAME", name.as_str())
                            .set("OS_PROJECT_DOMAIN_NAME", domain_name.as_str());
                    }
                    AuthScope::Domain(domain) => {
                        env.set("OS_DOMAIN_NAME", domain.as_str());
                    }
                }
            }
            AuthCredentials::Token { token } => {
                env.set("OS_AUTH_TYPE", "v3token")
                    .set_secret("OS_TOKEN", token.clone());
            }
        }

        if let Some(region) = &self.region_name {
            env.set("OS_REGION_NAME", region.as_str());
        }
        if let Some(interface) = &self.interface {
            env.set("OS_INTERFACE", interface.as_str());
        }
        env
    }
}

/// Configuration for one reconciliation context.
///
/// Built by the CLI, passed to `Provider` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub credentials: Credentials,
    /// ID of the domain whose name is elided from composite identifiers.
    pub default_domain_id: String,
    /// Retry budget for transient failures.
    pub request_timeout: Duration,
    /// Pause between retries.
    pub retry_interval: Duration,
    /// Path or name of the `openstack` executable.
    pub program: PathBuf,
}

impl ProviderConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            default_domain_id: DEFAULT_DOMAIN_ID.into(),
            request_timeout: Duration::from_secs(60),
            retry_interval: Duration::from_secs(10),
            program: PathBuf::from("openstack"),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            request_timeout: self.request_timeout,
            retry_interval: self.retry_interval,
        }
    }
}
