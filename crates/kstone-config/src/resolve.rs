// ── Credential resolution ──
//
// Every setting is looked up in three layers, first match wins: the
// environment, the rc-file, then the profile. The password chain also
// consults the system keyring before a plaintext profile value.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;
use url::Url;

use kstone_core::{AuthCredentials, AuthScope, Credentials, DEFAULT_DOMAIN_ID, ProviderConfig};

use crate::env::EnvSource;
use crate::rcfile::{self, RcVars};
use crate::{ConfigError, Defaults, Profile};

/// Endpoint used when nothing else names one.
pub const DEFAULT_AUTH_ENDPOINT: &str = "http://127.0.0.1:5000/v3";

const KEYRING_SERVICE: &str = "kstone";

// ── Password stores ─────────────────────────────────────────────────

/// Secret storage consulted for passwords.
pub trait PasswordStore {
    fn password(&self, profile_name: &str) -> Option<SecretString>;
}

/// The operating system keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keyring;

impl Keyring {
    fn entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
    }

    /// Store a profile's password in the keyring.
    pub fn store(profile_name: &str, password: &str) -> Result<(), ConfigError> {
        Self::entry(profile_name)
            .and_then(|entry| entry.set_password(password))
            .map_err(|e| ConfigError::Keyring(e.to_string()))
    }
}

impl PasswordStore for Keyring {
    fn password(&self, profile_name: &str) -> Option<SecretString> {
        Self::entry(profile_name)
            .and_then(|entry| entry.get_password())
            .ok()
            .map(SecretString::from)
    }
}

/// A store that never has anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPasswordStore;

impl PasswordStore for NoPasswordStore {
    fn password(&self, _profile_name: &str) -> Option<SecretString> {
        None
    }
}

// ── Layers ──────────────────────────────────────────────────────────

/// Which layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Environment,
    RcFile(PathBuf),
    Profile,
    Fallback,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment"),
            Self::RcFile(path) => write!(f, "rc-file {}", path.display()),
            Self::Profile => f.write_str("profile"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

struct Layers<'a, E> {
    env: &'a E,
    rc_path: Option<PathBuf>,
    rc: RcVars,
    profile: HashMap<&'static str, String>,
}

impl<'a, E: EnvSource> Layers<'a, E> {
    fn load(profile: &Profile, env: &'a E) -> Result<Self, ConfigError> {
        let rc_path = rcfile::rc_path(profile.rc_file.as_deref(), env);
        let rc = match &rc_path {
            Some(path) => rcfile::read_rc(path)?,
            None => RcVars::new(),
        };
        Ok(Self {
            env,
            rc_path,
            rc,
            profile: profile.os_vars(),
        })
    }

    fn get(&self, key: &str) -> Option<(String, Source)> {
        if let Some(value) = self.env.var(key) {
            return Some((value, Source::Environment));
        }
        if let Some(value) = self.rc.get(key).filter(|v| !v.is_empty()) {
            let path = self.rc_path.clone().unwrap_or_default();
            return Some((value.clone(), Source::RcFile(path)));
        }
        self.profile
            .get(key)
            .filter(|v| !v.is_empty())
            .map(|value| (value.clone(), Source::Profile))
    }

    fn value(&self, key: &str) -> Option<String> {
        self.get(key).map(|(value, _)| value)
    }

    /// The scope comes as a whole from the highest layer that sets any
    /// scope variable, so layers never mix half a project scope with half
    /// a system scope.
    fn scope(&self) -> AuthScope {
        scope_from(&|k: &str| self.env.var(k))
            .or_else(|| scope_from(&|k: &str| self.rc.get(k).filter(|v| !v.is_empty()).cloned()))
            .or_else(|| {
                scope_from(&|k: &str| self.profile.get(k).filter(|v| !v.is_empty()).cloned())
            })
            .unwrap_or_else(|| AuthScope::System("all".into()))
    }
}

fn scope_from(lookup: &dyn Fn(&str) -> Option<String>) -> Option<AuthScope> {
    if let Some(system) = lookup("OS_SYSTEM_SCOPE") {
        return Some(AuthScope::System(system));
    }
    if let Some(name) = lookup("OS_PROJECT_NAME") {
        let domain_name = lookup("OS_PROJECT_DOMAIN_NAME").unwrap_or_else(|| "Default".into());
        return Some(AuthScope::Project { name, domain_name });
    }
    lookup("OS_DOMAIN_NAME").map(AuthScope::Domain)
}

// ── Auth URL ────────────────────────────────────────────────────────

/// A resolved identity endpoint and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUrl {
    /// The value exactly as configured.
    pub value: String,
    pub url: Url,
    pub source: Source,
}

fn parse_url(value: String, source: Source) -> Result<AuthUrl, ConfigError> {
    let url = value.parse::<Url>().map_err(|e| ConfigError::Validation {
        field: "OS_AUTH_URL".into(),
        reason: format!("invalid URL '{value}' from {source}: {e}"),
    })?;
    Ok(AuthUrl { value, url, source })
}

/// Resolve the identity endpoint: `OS_AUTH_URL` from the environment,
/// then from the rc-file, then the profile's `auth_url`, then its
/// `auth_endpoint`, then [`DEFAULT_AUTH_ENDPOINT`].
pub fn resolve_auth_url(profile: &Profile, env: &impl EnvSource) -> Result<AuthUrl, ConfigError> {
    let layers = Layers::load(profile, env)?;
    auth_url_from(&layers, profile)
}

fn auth_url_from<E: EnvSource>(layers: &Layers<'_, E>, profile: &Profile) -> Result<AuthUrl, ConfigError> {
    if let Some((value, source)) = layers.get("OS_AUTH_URL") {
        return parse_url(value, source);
    }
    let fallback = profile
        .auth_endpoint
        .clone()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTH_ENDPOINT.into());
    parse_url(fallback, Source::Fallback)
}

// ── Credentials ─────────────────────────────────────────────────────

fn resolve_password<E: EnvSource>(
    layers: &Layers<'_, E>,
    profile: &Profile,
    profile_name: &str,
    store: &impl PasswordStore,
) -> Result<SecretString, ConfigError> {
    // 1. OS_PASSWORD from the environment or rc-file
    if let Some(pw) = layers
        .env
        .var("OS_PASSWORD")
        .or_else(|| layers.rc.get("OS_PASSWORD").filter(|v| !v.is_empty()).cloned())
    {
        return Ok(SecretString::from(pw));
    }

    // 2. Variable named by the profile
    if let Some(pw) = profile.password_env.as_deref().and_then(|name| layers.env.var(name)) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = store.password(profile_name) {
        debug!(profile = profile_name, "password from keyring");
        return Ok(pw);
    }

    // 4. Plaintext in config
    if let Some(pw) = profile.password.clone().filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(pw));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the credential context for one run.
///
/// A token (`OS_TOKEN` or the profile's `token`) takes precedence over
/// username and password.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    env: &impl EnvSource,
    store: &impl PasswordStore,
) -> Result<Credentials, ConfigError> {
    let layers = Layers::load(profile, env)?;
    let auth_url = auth_url_from(&layers, profile)?;
    debug!(auth_url = %auth_url.value, source = %auth_url.source, "resolved auth URL");

    let auth = if let Some(token) = layers.value("OS_TOKEN") {
        AuthCredentials::Token {
            token: SecretString::from(token),
        }
    } else {
        let username = layers
            .value("OS_USERNAME")
            .ok_or_else(|| ConfigError::NoCredentials {
                profile: profile_name.into(),
            })?;
        AuthCredentials::Password {
            username,
            password: resolve_password(&layers, profile, profile_name, store)?,
            user_domain_name: layers
                .value("OS_USER_DOMAIN_NAME")
                .unwrap_or_else(|| "Default".into()),
            scope: layers.scope(),
        }
    };

    Ok(Credentials {
        auth_url: auth_url.url,
        auth,
        identity_api_version: layers
            .value("OS_IDENTITY_API_VERSION")
            .unwrap_or_else(|| "3".into()),
        region_name: layers.value("OS_REGION_NAME"),
        interface: layers.value("OS_INTERFACE"),
    })
}

/// Build the provider configuration for a profile: credentials plus the
/// invocation settings, profile values overriding `[defaults]`.
pub fn provider_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    env: &impl EnvSource,
    store: &impl PasswordStore,
) -> Result<ProviderConfig, ConfigError> {
    let credentials = resolve_credentials(profile, profile_name, env, store)?;
    let mut config = ProviderConfig::new(credentials);
    config.default_domain_id = profile
        .default_domain_id
        .clone()
        .unwrap_or_else(|| DEFAULT_DOMAIN_ID.into());
    config.request_timeout =
        Duration::from_secs(profile.request_timeout.unwrap_or(defaults.request_timeout));
    config.retry_interval =
        Duration::from_secs(profile.retry_interval.unwrap_or(defaults.retry_interval));
    config.program = PathBuf::from(profile.program.as_deref().unwrap_or(&defaults.program));
    Ok(config)
}
