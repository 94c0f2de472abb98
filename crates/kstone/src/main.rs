mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use kstone_core::Provider;

use crate::cli::{Cli, ColorMode, Command, GlobalOpts, OutputFormat};
use crate::config::Config;
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(mut cli: Cli) -> Result<(), CliError> {
    // Shell completions need no configuration
    if let Command::Completions(args) = &cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "kstone", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config()?;
    apply_defaults(&mut cli.global, &cfg)?;

    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, cfg, &cli.global),
        Command::Auth(args) => commands::auth::handle(args, &cfg, &cli.global),

        // Everything else drives the identity service
        cmd => {
            let provider_config = config::provider_config(&cli.global, &cfg)?;
            let retry_budget = provider_config.request_timeout.as_secs();
            let mut provider = Provider::new(&provider_config);

            tracing::debug!(command = ?cmd, program = %provider_config.program.display(), "dispatching command");
            commands::dispatch(cmd, &mut provider, &cli.global)
                .map_err(|err| err.with_retry_budget(retry_budget))
        }
    }
}

/// Fill `--output` and `--color` from `[defaults]` when not given.
fn apply_defaults(global: &mut GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    if global.output.is_none() {
        let format = OutputFormat::from_str(&cfg.defaults.output, true).map_err(|reason| {
            CliError::Validation {
                field: "defaults.output".into(),
                reason,
            }
        })?;
        global.output = Some(format);
    }
    if global.color.is_none() {
        let color = ColorMode::from_str(&cfg.defaults.color, true).map_err(|reason| {
            CliError::Validation {
                field: "defaults.color".into(),
                reason,
            }
        })?;
        global.color = Some(color);
    }
    Ok(())
}
