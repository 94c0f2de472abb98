//! Clap derive structures for the `kstone` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kstone -- reconcile OpenStack identity domains, projects and users
#[derive(Debug, Parser)]
#[command(
    name = "kstone",
    version,
    about = "Reconcile OpenStack identity domains, projects and users",
    long_about = "Looks up and reconciles identity resources by driving the \
        `openstack` command-line client.\n\n\
        Credentials come from OS_* environment variables, ~/openrc, or a \
        named profile in the kstone config file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "KSTONE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Identity endpoint (overrides OS_AUTH_URL, rc-file and profile)
    #[arg(long, global = true)]
    pub auth_url: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "KSTONE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Seconds to keep retrying an unavailable identity service
    #[arg(long, env = "KSTONE_REQUEST_TIMEOUT", global = true)]
    pub request_timeout: Option<u64>,

    /// Path to the `openstack` executable
    #[arg(long, env = "KSTONE_PROGRAM", global = true)]
    pub program: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up and reconcile identity domains
    #[command(alias = "domains")]
    Domain(DomainArgs),

    /// Look up and reconcile projects
    #[command(alias = "projects")]
    Project(ProjectArgs),

    /// Look up and reconcile users
    #[command(alias = "users")]
    User(UserArgs),

    /// Print the domain-qualified name of a resource
    Resolve {
        /// Resource name
        name: String,

        /// Domain name the resource lives in
        #[arg(long, short = 'd')]
        domain: Option<String>,
    },

    /// Inspect resolved credentials
    Auth(AuthArgs),

    /// Manage kstone configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// A project or user, named either `name --domain D` or `name::D`.
#[derive(Debug, Args)]
pub struct ScopedName {
    /// Resource name, optionally qualified as `name::domain`
    pub name: String,

    /// Domain name [default: Default]
    #[arg(long, short = 'd')]
    pub domain: Option<String>,
}

/// Desired state shared by every `ensure` command.
#[derive(Debug, Args)]
pub struct StateArgs {
    /// Ensure the resource is enabled (default)
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Ensure the resource is disabled
    #[arg(long)]
    pub disable: bool,

    /// Desired description
    #[arg(long)]
    pub description: Option<String>,
}

impl StateArgs {
    pub fn enabled(&self) -> bool {
        !self.disable
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only list resources in this domain
    #[arg(long, short = 'd')]
    pub domain: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DOMAINS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DomainArgs {
    #[command(subcommand)]
    pub command: DomainCommand,
}

#[derive(Debug, Subcommand)]
pub enum DomainCommand {
    /// List domains
    #[command(alias = "ls")]
    List,

    /// Show a domain by name or ID
    Show {
        /// Domain name or ID
        domain: String,
    },

    /// Print the ID of a named domain
    Id {
        /// Domain name
        name: String,
    },

    /// Print the name of a domain ID
    Name {
        /// Domain ID
        id: String,
    },

    /// Create or update a domain to match the given state
    Ensure {
        /// Domain name
        name: String,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Disable and delete a domain
    #[command(alias = "rm")]
    Remove {
        /// Domain name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROJECTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List projects
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a project
    Show(ScopedName),

    /// Create or update a project to match the given state
    Ensure {
        #[command(flatten)]
        target: ScopedName,

        #[command(flatten)]
        state: StateArgs,
    },

    /// Delete a project
    #[command(alias = "rm")]
    Remove(ScopedName),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  USERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a user
    Show(ScopedName),

    /// Create or update a user to match the given state
    Ensure {
        #[command(flatten)]
        target: ScopedName,

        #[command(flatten)]
        state: StateArgs,

        /// Desired email address
        #[arg(long)]
        email: Option<String>,

        /// Prompt for the password set when the user is created
        #[arg(long)]
        password_prompt: bool,
    },

    /// Delete a user
    #[command(alias = "rm")]
    Remove(ScopedName),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Print the identity endpoint and where it was found
    Url,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Check profiles and service settings
    Validate,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name [default: the active profile]
        name: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
