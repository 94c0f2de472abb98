//! Auth command handlers. These read configuration only and never run the
//! `openstack` tool.

use serde::Serialize;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ResolvedUrl {
    auth_url: String,
    source: String,
}

pub fn handle(args: AuthArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Url => {
            let resolved = config::resolve_auth_url(global, cfg)?;
            let view = ResolvedUrl {
                auth_url: resolved.value,
                source: resolved.source.to_string(),
            };
            let out = output::render_single(
                &global.format(),
                &view,
                |v| format!("{} (from {})", v.auth_url, v.source),
                |v| v.auth_url.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
