//! User command handlers.

use tabled::Tabled;

use kstone_core::{EntityRecord, Ensure, Provider, UserSpec};

use crate::cli::{GlobalOpts, UserArgs, UserCommand};
use crate::error::CliError;
use crate::output;

use super::{Report, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl From<&EntityRecord> for UserRow {
    fn from(r: &EntityRecord) -> Self {
        Self {
            id: r.id().unwrap_or_default().to_owned(),
            name: r.name().unwrap_or_default().to_owned(),
            domain: r
                .get("domain")
                .or_else(|| r.domain_id())
                .unwrap_or_default()
                .to_owned(),
            email: r.email().unwrap_or_default().to_owned(),
            enabled: r.get("enabled").unwrap_or_default().to_owned(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(provider: &mut Provider, args: UserArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UserCommand::List(list) => {
            let users = provider.list_users(list.domain.as_deref())?;
            let out = output::render_list(
                &global.format(),
                &users,
                |r| UserRow::from(r),
                |r| r.name().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UserCommand::Show(target) => {
            let (name, domain) = util::scoped(&target)?;
            let record = provider
                .fetch_user(&name, &domain)?
                .ok_or_else(|| CliError::not_found("user", format!("{name}::{domain}")))?;
            let out = output::render_single(
                &global.format(),
                &*record,
                output::record_detail,
                |r| r.id().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UserCommand::Ensure {
            target,
            state,
            email,
            password_prompt,
        } => {
            let (name, domain) = util::scoped(&target)?;
            let mut spec = UserSpec::new(name.as_str(), domain.as_str()).enabled(state.enabled());
            if let Some(description) = state.description {
                spec = spec.description(description);
            }
            if let Some(email) = email {
                spec = spec.email(email);
            }
            if password_prompt {
                spec = spec.password(util::prompt_new_password("Password")?);
            }
            let outcome = provider.reconcile_user(&spec, Ensure::Present)?;
            Report {
                kind: "user",
                name,
                domain: Some(domain),
                outcome,
            }
            .print(global);
            Ok(())
        }

        UserCommand::Remove(target) => {
            let (name, domain) = util::scoped(&target)?;
            if !util::confirm(
                &format!("Delete user '{name}' in domain '{domain}'?"),
                global.yes,
            )? {
                return Ok(());
            }
            let spec = UserSpec::new(name.as_str(), domain.as_str());
            let outcome = provider.reconcile_user(&spec, Ensure::Absent)?;
            Report {
                kind: "user",
                name,
                domain: Some(domain),
                outcome,
            }
            .print(global);
            Ok(())
        }
    }
}
