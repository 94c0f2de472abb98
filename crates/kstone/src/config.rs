//! CLI configuration: a thin wrapper around `kstone_config`.
//!
//! Adds the resolution steps that respect `GlobalOpts` flag overrides
//! (--profile, --auth-url, --request-timeout, --program).

use std::path::PathBuf;
use std::time::Duration;

use kstone_config::{AuthUrl, EnvSource, Keyring, ProcessEnv};
use kstone_core::ProviderConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use kstone_config::{Config, Profile, config_path, load_config, save_config};

// ── Flag-aware environment ──────────────────────────────────────────

/// The process environment with `--auth-url` standing in for
/// `OS_AUTH_URL`.
struct FlagEnv<'a> {
    global: &'a GlobalOpts,
}

impl EnvSource for FlagEnv<'_> {
    fn var(&self, key: &str) -> Option<String> {
        if key == "OS_AUTH_URL" {
            if let Some(url) = self.global.auth_url.as_ref().filter(|u| !u.is_empty()) {
                return Some(url.clone());
            }
        }
        ProcessEnv.var(key)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        ProcessEnv.home_dir()
    }
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// The active profile. A profile named with `--profile` must exist; an
/// absent default profile means "environment only".
pub fn active_profile(global: &GlobalOpts, config: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, config);
    if let Some(profile) = config.profiles.get(&name) {
        return Ok((name, profile.clone()));
    }
    if global.profile.is_some() {
        return Err(profile_not_found(name, config));
    }
    Ok((name, Profile::default()))
}

pub fn profile_not_found(name: String, config: &Config) -> CliError {
    let available: Vec<_> = config.profiles.keys().cloned().collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Resolve the identity endpoint with `--auth-url` taking priority.
pub fn resolve_auth_url(global: &GlobalOpts, config: &Config) -> Result<AuthUrl, CliError> {
    let (_, profile) = active_profile(global, config)?;
    Ok(kstone_config::resolve_auth_url(&profile, &FlagEnv { global })?)
}

/// Translate the active profile + global flags into a `ProviderConfig`.
///
/// CLI flag overrides take priority over profile and `[defaults]` values.
pub fn provider_config(global: &GlobalOpts, config: &Config) -> Result<ProviderConfig, CliError> {
    let (name, profile) = active_profile(global, config)?;
    let mut provider = kstone_config::provider_config(
        &profile,
        &name,
        &config.defaults,
        &FlagEnv { global },
        &Keyring,
    )?;

    if let Some(seconds) = global.request_timeout {
        provider.request_timeout = Duration::from_secs(seconds);
    }
    if let Some(program) = &global.program {
        provider.program.clone_from(program);
    }
    Ok(provider)
}
