// Argument-vector construction for the `openstack` CLI.
//
// Every call has the shape `<resource> <action> [format flags] <args...>`.
// The format flags are derived from the action so that callers cannot ask
// for a CSV `show` or a shell-formatted `list` by accident.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, EnumString};

/// Stand-in for secret arguments wherever an invocation is rendered.
pub const REDACTED: &str = "[REDACTED]";

/// Identity resources managed through the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
    Domain,
    Project,
    User,
}

/// CLI verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    List,
    Show,
    Create,
    Set,
    Delete,
}

/// Output format requested from the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `--quiet --format csv`, one row per entity.
    Csv,
    /// `--format shell`, one `key="value"` line per attribute.
    Shell,
}

impl Format {
    fn flags(self) -> &'static [&'static str] {
        match self {
            Self::Csv => &["--quiet", "--format", "csv"],
            Self::Shell => &["--format", "shell"],
        }
    }
}

impl Action {
    /// The output format the tool is asked for, if the action prints data.
    pub fn format(self) -> Option<Format> {
        match self {
            Self::List => Some(Format::Csv),
            Self::Show | Self::Create => Some(Format::Shell),
            Self::Set | Self::Delete => None,
        }
    }
}

/// A single CLI call: resource, action and trailing arguments.
///
/// Arguments added through [`secret_opt`](Self::secret_opt) are passed to
/// the tool verbatim but masked in the `Debug` rendering and in
/// [`redacted_argv`](Self::redacted_argv).
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub resource: Resource,
    pub action: Action,
    pub args: Vec<String>,
    secret_args: Vec<usize>,
}

impl Invocation {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self {
            resource,
            action,
            args: Vec::new(),
            secret_args: Vec::new(),
        }
    }

    /// Append one positional or flag argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a `--flag value` pair.
    pub fn opt(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Append `--flag value` only when `value` is present.
    pub fn opt_if(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.opt(flag, v),
            None => self,
        }
    }

    /// Append a bare flag only when `enabled` is true.
    pub fn flag_if(self, flag: &str, enabled: bool) -> Self {
        if enabled { self.arg(flag) } else { self }
    }

    /// Append a `--flag value` pair whose value must never be logged.
    pub fn secret_opt(mut self, flag: &str, value: &SecretString) -> Self {
        self.args.push(flag.to_owned());
        self.secret_args.push(self.args.len());
        self.args.push(value.expose_secret().to_owned());
        self
    }

    /// Secret argument values, for scrubbing them out of error text.
    pub fn secrets(&self) -> Vec<&str> {
        self.secret_args
            .iter()
            .filter_map(|&i| self.args.get(i).map(String::as_str))
            .collect()
    }

    /// The format this invocation's stdout is expected in.
    pub fn format(&self) -> Option<Format> {
        self.action.format()
    }

    /// The full argument vector passed to the tool.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.resource.to_string(), self.action.to_string()];
        if let Some(format) = self.format() {
            argv.extend(format.flags().iter().map(|f| (*f).to_owned()));
        }
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// The argument vector with secret values masked, safe to log.
    pub fn redacted_argv(&self) -> Vec<String> {
        let mut argv = self.argv();
        let offset = argv.len() - self.args.len();
        for &i in &self.secret_args {
            if let Some(arg) = argv.get_mut(offset + i) {
                REDACTED.clone_into(arg);
            }
        }
        argv
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("resource", &self.resource)
            .field("action", &self.action)
            .field("argv", &self.redacted_argv())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_requests_quiet_csv() {
        let inv = Invocation::new(Resource::Domain, Action::List);
        assert_eq!(
            inv.argv(),
            ["domain", "list", "--quiet", "--format", "csv"]
        );
    }

    #[test]
    fn show_requests_shell_before_args() {
        let inv = Invocation::new(Resource::Project, Action::Show)
            .arg("The Project")
            .opt("--domain", "Default");
        assert_eq!(
            inv.argv(),
            [
                "project",
                "show",
                "--format",
                "shell",
                "The Project",
                "--domain",
                "Default"
            ]
        );
    }

    #[test]
    fn set_and_delete_carry_no_format() {
        let inv = Invocation::new(Resource::User, Action::Set)
            .flag_if("--enable", true)
            .flag_if("--disable", false)
            .opt_if("--email", None)
            .arg("abc");
        assert_eq!(inv.argv(), ["user", "set", "--enable", "abc"]);
        assert_eq!(Action::Delete.format(), None);
    }

    #[test]
    fn secret_values_are_masked_when_rendered() {
        let inv = Invocation::new(Resource::User, Action::Create)
            .opt("--domain", "Default")
            .secret_opt("--password", &SecretString::from("s3cret".to_owned()))
            .arg("bob");
        assert_eq!(
            inv.argv(),
            [
                "user", "create", "--format", "shell", "--domain", "Default", "--password",
                "s3cret", "bob"
            ]
        );
        assert_eq!(inv.redacted_argv()[7], REDACTED);
        assert_eq!(inv.secrets(), ["s3cret"]);
        assert!(!format!("{inv:?}").contains("s3cret"));
    }

    #[test]
    fn resource_parses_from_lowercase() {
        assert_eq!("user".parse::<Resource>().ok(), Some(Resource::User));
        assert_eq!(Resource::Domain.to_string(), "domain");
    }
}
