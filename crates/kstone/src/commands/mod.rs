//! Command dispatch: bridges CLI args -> provider calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod domains;
pub mod projects;
pub mod users;
pub mod util;

use serde::Serialize;

use kstone_core::{Outcome, Provider};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Dispatch a command that needs the identity service.
pub fn dispatch(cmd: Command, provider: &mut Provider, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Domain(args) => domains::handle(provider, args, global),
        Command::Project(args) => projects::handle(provider, args, global),
        Command::User(args) => users::handle(provider, args, global),
        Command::Resolve { name, domain } => {
            let resolved = provider.set_domain_for_name(&name, domain.as_deref())?;
            output::print_output(&resolved, global.quiet);
            Ok(())
        }
        Command::Auth(_) | Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not use the identity service".into(),
        )),
    }
}

/// Result of one `ensure` or `remove`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Report {
    pub fn print(&self, global: &GlobalOpts) {
        let color = output::should_color(&global.color_mode());
        let out = output::render_single(
            &global.format(),
            self,
            |r| {
                let target = match &r.domain {
                    Some(domain) => format!("{} {} in domain {domain}", r.kind, r.name),
                    None => format!("{} {}", r.kind, r.name),
                };
                format!("{target}: {}", output::paint_outcome(&r.outcome, color))
            },
            |r| r.outcome.to_string(),
        );
        output::print_output(&out, global.quiet);
    }
}
