//! Domain command handlers.

use tabled::Tabled;

use kstone_core::{DomainSpec, EntityRecord, Ensure, Provider};

use crate::cli::{DomainArgs, DomainCommand, GlobalOpts, StateArgs};
use crate::error::CliError;
use crate::output;

use super::{Report, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DomainRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&EntityRecord> for DomainRow {
    fn from(r: &EntityRecord) -> Self {
        Self {
            id: r.id().unwrap_or_default().to_owned(),
            name: r.name().unwrap_or_default().to_owned(),
            enabled: r.get("enabled").unwrap_or_default().to_owned(),
            description: r.description().to_owned(),
        }
    }
}

fn spec(name: String, state: &StateArgs) -> DomainSpec {
    let spec = DomainSpec::new(name).enabled(state.enabled());
    match &state.description {
        Some(description) => spec.description(description.as_str()),
        None => spec,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(provider: &mut Provider, args: DomainArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DomainCommand::List => {
            let domains = provider.list_domains()?;
            let out = output::render_list(
                &global.format(),
                &domains,
                |r| DomainRow::from(r),
                |r| r.name().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DomainCommand::Show { domain } => {
            let record = provider
                .fetch_domain(&domain)?
                .ok_or_else(|| CliError::not_found("domain", domain.as_str()))?;
            let out = output::render_single(
                &global.format(),
                &*record,
                output::record_detail,
                |r| r.id().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DomainCommand::Id { name } => {
            let id = provider
                .domain_id_from_name(&name)?
                .ok_or_else(|| CliError::not_found("domain", name.as_str()))?;
            output::print_output(&id, global.quiet);
            Ok(())
        }

        DomainCommand::Name { id } => {
            let name = provider
                .domain_name_from_id(&id)?
                .ok_or_else(|| CliError::not_found("domain", id.as_str()))?;
            output::print_output(&name, global.quiet);
            Ok(())
        }

        DomainCommand::Ensure { name, state } => {
            let outcome = provider.reconcile_domain(&spec(name.clone(), &state), Ensure::Present)?;
            Report {
                kind: "domain",
                name,
                domain: None,
                outcome,
            }
            .print(global);
            Ok(())
        }

        DomainCommand::Remove { name } => {
            if !util::confirm(
                &format!("Delete domain '{name}' and everything in it? This is destructive."),
                global.yes,
            )? {
                return Ok(());
            }
            let outcome = provider.reconcile_domain(&DomainSpec::new(name.as_str()), Ensure::Absent)?;
            Report {
                kind: "domain",
                name,
                domain: None,
                outcome,
            }
            .print(global);
            Ok(())
        }
    }
}
