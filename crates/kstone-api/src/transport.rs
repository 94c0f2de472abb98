// Process transport for the `openstack` CLI.
//
// `Runner` is the seam between the invoker and the operating system: the
// real implementation spawns the tool, tests substitute a scripted runner.
// Credentials travel as `OS_*` environment variables on the child only.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;

/// Prefix of every variable the tool reads its credentials from.
const OS_PREFIX: &str = "OS_";

// ── CommandEnv ───────────────────────────────────────────────────────

enum EnvValue {
    Plain(String),
    Secret(SecretString),
}

/// Environment handed to each child process.
///
/// Secret values are redacted from the [`Debug`] rendering so that the
/// environment can be traced safely.
#[derive(Default)]
pub struct CommandEnv {
    vars: Vec<(String, EnvValue)>,
}

impl CommandEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain variable, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.insert(key.into(), EnvValue::Plain(value.into()));
        self
    }

    /// Set a secret variable, replacing any previous value.
    pub fn set_secret(&mut self, key: impl Into<String>, value: SecretString) -> &mut Self {
        self.insert(key.into(), EnvValue::Secret(value));
        self
    }

    fn insert(&mut self, key: String, value: EnvValue) {
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value));
    }

    /// Look up a plain value. Secrets are never returned.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.iter().find_map(|(k, v)| match v {
            EnvValue::Plain(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Apply every variable to a command, exposing secrets to the child.
    fn apply(&self, cmd: &mut Command) {
        for (key, value) in &self.vars {
            match value {
                EnvValue::Plain(v) => cmd.env(key, v),
                EnvValue::Secret(v) => cmd.env(key, v.expose_secret()),
            };
        }
    }
}

impl fmt::Debug for CommandEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.vars {
            match value {
                EnvValue::Plain(v) => map.entry(key, v),
                EnvValue::Secret(_) => map.entry(key, &"[REDACTED]"),
            };
        }
        map.finish()
    }
}

// ── Runner ───────────────────────────────────────────────────────────

/// Executes one tool invocation and returns its stdout.
///
/// A non-zero exit must be reported through [`Error::from_failure`] so the
/// failure text is classified the same way for every runner.
pub trait Runner {
    fn run(&self, argv: &[String], env: &CommandEnv) -> Result<String, Error>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, argv: &[String], env: &CommandEnv) -> Result<String, Error> {
        (**self).run(argv, env)
    }
}

impl<R: Runner + ?Sized> Runner for Box<R> {
    fn run(&self, argv: &[String], env: &CommandEnv) -> Result<String, Error> {
        (**self).run(argv, env)
    }
}

// ── OpenstackCli ─────────────────────────────────────────────────────

/// Runs the real `openstack` binary as a blocking child process.
#[derive(Debug, Clone)]
pub struct OpenstackCli {
    program: PathBuf,
}

impl Default for OpenstackCli {
    fn default() -> Self {
        Self::new("openstack")
    }
}

impl OpenstackCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Render a command line the way failure messages quote it.
    fn render(&self, argv: &[String]) -> String {
        let mut line = self.program.display().to_string();
        for arg in argv {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl Runner for OpenstackCli {
    fn run(&self, argv: &[String], env: &CommandEnv) -> Result<String, Error> {
        let rendered = self.render(argv);
        debug!(program = %self.program.display(), args = argv.len(), env = ?env, "spawning");

        let mut cmd = Command::new(&self.program);
        cmd.args(argv);

        // Ambient credentials must not leak into the child: the run's
        // credential context is the only source of OS_* variables.
        for (key, _) in std::env::vars_os() {
            if key.to_string_lossy().starts_with(OS_PREFIX) {
                cmd.env_remove(&key);
            }
        }
        env.apply(&mut cmd);

        let output = cmd.output().map_err(|source| Error::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            stdout.as_str()
        } else {
            stderr.as_ref()
        };
        Err(Error::from_failure(rendered, output.status.code(), message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let mut env = CommandEnv::new();
        env.set("OS_USERNAME", "admin")
            .set_secret("OS_PASSWORD", SecretString::from("hunter2".to_owned()));
        let rendered = format!("{env:?}");
        assert!(rendered.contains("admin"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn set_replaces_previous_value() {
        let mut env = CommandEnv::new();
        env.set("OS_AUTH_URL", "http://a").set("OS_AUTH_URL", "http://b");
        assert_eq!(env.get("OS_AUTH_URL"), Some("http://b"));
        assert_eq!(env.keys().count(), 1);
    }

    #[test]
    fn get_never_returns_secrets() {
        let mut env = CommandEnv::new();
        env.set_secret("OS_PASSWORD", SecretString::from("x".to_owned()));
        assert!(env.contains("OS_PASSWORD"));
        assert_eq!(env.get("OS_PASSWORD"), None);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cli = OpenstackCli::new("/nonexistent/kstone-openstack");
        let err = cli
            .run(&["domain".into(), "list".into()], &CommandEnv::new())
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
