//! Project command handlers.

use tabled::Tabled;

use kstone_core::{EntityRecord, Ensure, ProjectSpec, Provider};

use crate::cli::{GlobalOpts, ProjectArgs, ProjectCommand};
use crate::error::CliError;
use crate::output;

use super::{Report, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Domain ID")]
    domain_id: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&EntityRecord> for ProjectRow {
    fn from(r: &EntityRecord) -> Self {
        Self {
            id: r.id().unwrap_or_default().to_owned(),
            name: r.name().unwrap_or_default().to_owned(),
            domain_id: r.domain_id().unwrap_or_default().to_owned(),
            enabled: r.get("enabled").unwrap_or_default().to_owned(),
            description: r.description().to_owned(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(provider: &mut Provider, args: ProjectArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ProjectCommand::List(list) => {
            let projects = provider.list_projects(list.domain.as_deref())?;
            let out = output::render_list(
                &global.format(),
                &projects,
                |r| ProjectRow::from(r),
                |r| r.name().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectCommand::Show(target) => {
            let (name, domain) = util::scoped(&target)?;
            let record = provider
                .fetch_project(&name, &domain)?
                .ok_or_else(|| CliError::not_found("project", format!("{name}::{domain}")))?;
            let out = output::render_single(
                &global.format(),
                &*record,
                output::record_detail,
                |r| r.id().unwrap_or_default().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProjectCommand::Ensure { target, state } => {
            let (name, domain) = util::scoped(&target)?;
            let mut spec = ProjectSpec::new(name.as_str(), domain.as_str()).enabled(state.enabled());
            if let Some(description) = state.description {
                spec = spec.description(description);
            }
            let outcome = provider.reconcile_project(&spec, Ensure::Present)?;
            Report {
                kind: "project",
                name,
                domain: Some(domain),
                outcome,
            }
            .print(global);
            Ok(())
        }

        ProjectCommand::Remove(target) => {
            let (name, domain) = util::scoped(&target)?;
            if !util::confirm(
                &format!("Delete project '{name}' in domain '{domain}'?"),
                global.yes,
            )? {
                return Ok(());
            }
            let spec = ProjectSpec::new(name.as_str(), domain.as_str());
            let outcome = provider.reconcile_project(&spec, Ensure::Absent)?;
            Report {
                kind: "project",
                name,
                domain: Some(domain),
                outcome,
            }
            .print(global);
            Ok(())
        }
    }
}
