//! Shared helpers for command handlers.

use std::io::IsTerminal;

use secrecy::SecretString;

use kstone_core::CompositeName;

use crate::cli::ScopedName;
use crate::error::CliError;

/// Domain assumed when a project or user names none.
pub const DEFAULT_DOMAIN_NAME: &str = "Default";

/// Split `name`, `name::domain` or `name --domain D` into name and domain.
pub fn scoped(target: &ScopedName) -> Result<(String, String), CliError> {
    let parsed = CompositeName::parse(&target.name)?;
    let domain = match (parsed.domain, target.domain.as_deref()) {
        (Some(inline), Some(flag)) if inline != flag => {
            return Err(CliError::Validation {
                field: "domain".into(),
                reason: format!(
                    "'{}' names domain '{inline}' but --domain is '{flag}'",
                    target.name
                ),
            });
        }
        (Some(inline), _) => inline,
        (None, Some(flag)) => flag.to_owned(),
        (None, None) => DEFAULT_DOMAIN_NAME.to_owned(),
    };
    Ok((parsed.name, domain))
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read a new password twice without echo.
pub fn prompt_new_password(label: &str) -> Result<SecretString, CliError> {
    let first = rpassword::prompt_password(format!("{label}: "))?;
    if first.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    let second = rpassword::prompt_password(format!("Repeat {label}: "))?;
    if first != second {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "passwords do not match".into(),
        });
    }
    Ok(SecretString::from(first))
}
