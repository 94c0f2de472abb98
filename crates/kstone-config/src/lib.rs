//! Configuration for kstone.
//!
//! TOML profiles, `openrc` parsing and credential resolution
//! (environment, rc-file, keyring, plaintext), translated into a
//! `kstone_core::ProviderConfig`. The CLI layers its flag overrides on top.

mod env;
pub mod rcfile;
pub mod resolve;
pub mod service;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use env::{EnvSource, ProcessEnv};
pub use resolve::{
    AuthUrl, DEFAULT_AUTH_ENDPOINT, Keyring, NoPasswordStore, PasswordStore, Source,
    provider_config, resolve_auth_url, resolve_credentials,
};
pub use service::ServiceSettings;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "KSTONE_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyring error: {0}")]
    Keyring(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named cloud profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Identity service deployment settings, validated by `config validate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
            service: None,
        }
    }
}

impl Config {
    /// The named profile, or an empty one when the config has none by
    /// that name (credentials then come from the environment alone).
    pub fn profile_or_default(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }

    /// Check every profile and the service settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.default_profile {
            if !self.profiles.is_empty() && !self.profiles.contains_key(name) {
                return Err(ConfigError::Validation {
                    field: "default_profile".into(),
                    reason: format!("no profile named '{name}'"),
                });
            }
        }
        for (name, profile) in &self.profiles {
            profile.validate().map_err(|err| match err {
                ConfigError::Validation { field, reason } => ConfigError::Validation {
                    field: format!("profiles.{name}.{field}"),
                    reason,
                },
                other => other,
            })?;
        }
        if let Some(service) = &self.service {
            service.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Seconds a lookup keeps retrying transient failures.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Seconds between retries.
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,

    /// The `openstack` executable.
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            request_timeout: default_request_timeout(),
            retry_interval: default_retry_interval(),
            program: default_program(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_request_timeout() -> u64 {
    60
}
fn default_retry_interval() -> u64 {
    10
}
fn default_program() -> String {
    "openstack".into()
}

/// A named cloud profile. Each field stands in for the `OS_*` variable of
/// the same meaning when neither the environment nor the rc-file sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Profile {
    /// Identity endpoint (`OS_AUTH_URL`).
    pub auth_url: Option<String>,

    /// Endpoint used when no `OS_AUTH_URL` is found anywhere.
    pub auth_endpoint: Option<String>,

    /// rc-file to read instead of `~/openrc`.
    pub rc_file: Option<PathBuf>,

    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    pub token: Option<String>,
    pub system_scope: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_name: Option<String>,
    pub domain_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<String>,

    /// Domain id used when a resource names no domain.
    pub default_domain_id: Option<String>,

    pub request_timeout: Option<u64>,
    pub retry_interval: Option<u64>,
    pub program: Option<String>,
}

impl Profile {
    /// The profile's values keyed by the `OS_*` variable they stand for.
    pub fn os_vars(&self) -> HashMap<&'static str, String> {
        [
            ("OS_AUTH_URL", &self.auth_url),
            ("OS_USERNAME", &self.username),
            ("OS_TOKEN", &self.token),
            ("OS_SYSTEM_SCOPE", &self.system_scope),
            ("OS_PROJECT_NAME", &self.project_name),
            ("OS_PROJECT_DOMAIN_NAME", &self.project_domain_name),
            ("OS_DOMAIN_NAME", &self.domain_name),
            ("OS_USER_DOMAIN_NAME", &self.user_domain_name),
            ("OS_REGION_NAME", &self.region_name),
            ("OS_INTERFACE", &self.interface),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("auth_url", &self.auth_url), ("auth_endpoint", &self.auth_endpoint)] {
            if let Some(value) = value {
                value.parse::<url::Url>().map_err(|e| ConfigError::Validation {
                    field: field.into(),
                    reason: format!("invalid URL '{value}': {e}"),
                })?;
            }
        }
        if self.request_timeout == Some(0) {
            return Err(ConfigError::Validation {
                field: "request_timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if let Some(domain_id) = &self.default_domain_id {
            if domain_id.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: "default_domain_id".into(),
                    reason: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// The config file: `$KSTONE_CONFIG` if set, else the platform config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("rs", "kstone", "kstone").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = ProcessEnv.home_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push(".config");
    p.push("kstone");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file. `KSTONE_*` variables override file values,
/// with `__` separating nested keys (`KSTONE_DEFAULTS__OUTPUT=json`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KSTONE_").split("__").ignore(&["config"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is
/// unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
