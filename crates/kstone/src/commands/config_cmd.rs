//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};

use kstone_config::Keyring;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

/// TOML rendering for the table format. `redacted` has already masked
/// every secret.
fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| {
        let mut out = String::new();
        let _ = writeln!(out, "# config could not be rendered: {e}");
        out
    })
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn optional(value: String) -> Option<String> {
    let value = value.trim().to_owned();
    (!value.is_empty()).then_some(value)
}

/// Offer to store the password in the system keyring or return it for
/// plaintext config. `None` means stored in the keyring or skipped.
fn prompt_password_storage(profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
        "Don't store (use OS_PASSWORD or an rc-file)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 2 {
        return Ok(None);
    }
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    if selection == 0 {
        Keyring::store(profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, cfg: Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("kstone configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let auth_url: String = Input::new()
                .with_prompt("Identity endpoint (OS_AUTH_URL)")
                .default(kstone_config::DEFAULT_AUTH_ENDPOINT.into())
                .validate_with(|input: &String| {
                    input
                        .parse::<url::Url>()
                        .map(|_| ())
                        .map_err(|e| format!("invalid URL: {e}"))
                })
                .interact_text()
                .map_err(prompt_err)?;

            let username: String = Input::new()
                .with_prompt("Username")
                .default("admin".into())
                .interact_text()
                .map_err(prompt_err)?;

            let scope_choices = &["System (all)", "Project"];
            let scope = Select::new()
                .with_prompt("Scope")
                .items(scope_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let (system_scope, project_name) = if scope == 0 {
                (Some("all".to_owned()), None)
            } else {
                let project: String = Input::new()
                    .with_prompt("Project name")
                    .default("admin".into())
                    .interact_text()
                    .map_err(prompt_err)?;
                (None, optional(project))
            };

            let password = prompt_password_storage(&profile_name)?;

            let profile = Profile {
                auth_url: optional(auth_url),
                username: optional(username),
                password,
                system_scope,
                project_name,
                ..Profile::default()
            };

            let mut cfg = cfg;
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            cfg.validate()?;
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: kstone domain list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let masked = redacted(&cfg);
            let out = output::render_single(&global.format(), &masked, format_config, |c| {
                c.profiles.keys().cloned().collect::<Vec<_>>().join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Validate ────────────────────────────────────────────────
        ConfigCommand::Validate => {
            cfg.validate()?;
            if !global.quiet {
                eprintln!(
                    "✓ {} profile(s) valid{}",
                    cfg.profiles.len(),
                    if cfg.service.is_some() {
                        ", service settings valid"
                    } else {
                        ""
                    }
                );
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            if !cfg.profiles.contains_key(&name) {
                return Err(config::profile_not_found(name, &cfg));
            }
            let mut cfg = cfg;
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { name } => {
            let profile_name = name.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(config::profile_not_found(profile_name, &cfg));
            }
            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            Keyring::store(&profile_name, &password)?;
            eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                username: Some("admin".into()),
                password: Some("hunter2".into()),
                token: Some("gAAAA".into()),
                ..Profile::default()
            },
        );
        let shown = format_config(&redacted(&cfg));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("gAAAA"));
        assert!(shown.contains("****"));
        assert!(shown.contains("admin"));
    }
}
