//! Integration tests for the `kstone` CLI binary.
//!
//! Commands that reach the identity service run against a fake `openstack`
//! shell script, so no cloud is needed. Every test gets its own HOME and
//! config file.
#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const FAKE_OPENSTACK: &str = r#"#!/bin/sh
[ -n "$KSTONE_FAKE_LOG" ] && echo "$* user=$OS_USERNAME" >> "$KSTONE_FAKE_LOG"
case "$1 $2" in
"domain list")
  printf '"ID","Name","Enabled","Description"\n"default","Default",True,"The default domain"\n"d2","Ops",True,""\n' ;;
"domain show")
  case "$5" in
    Default|default) printf 'description="The default domain"\nenabled="True"\nid="default"\nname="Default"\n' ;;
    Ops|d2) printf 'enabled="True"\nid="d2"\nname="Ops"\n' ;;
    *) echo "No domain with a name or ID of '$5' exists." >&2; exit 1 ;;
  esac ;;
"project show")
  if [ "$7" = "Ghost" ]; then
    echo "No domain with a name or ID of '$7' exists." >&2; exit 1
  elif [ "$5" = "admin" ]; then
    printf 'domain_id="default"\nenabled="True"\nid="p1"\nname="admin"\n'
  else
    echo "No project with a name or ID of '$5' exists." >&2; exit 1
  fi ;;
"project list")
  printf '"ID","Name","Domain ID","Description","Enabled"\n"p1","admin","default","",True\n' ;;
"user show")
  echo "No user with a name or ID of '$5' exists." >&2; exit 1 ;;
"user create")
  printf 'enabled="True"\nid="u1"\nname="bob"\n' ;;
"user list")
  echo "The request you have made requires authentication. (HTTP 401)" >&2; exit 1 ;;
"domain set"|"domain delete") ;;
*)
  echo "Service Unavailable (HTTP 503)" >&2; exit 1 ;;
esac
"#;

// ── Helpers ─────────────────────────────────────────────────────────

/// Isolated HOME, config file and fake tool for one test.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("openstack");
        fs::write(&tool, FAKE_OPENSTACK).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// A `kstone` command with no ambient credentials or kstone settings.
    fn bare(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("kstone");
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.path("xdg"))
            .env("KSTONE_CONFIG", self.path("config.toml"))
            .env("KSTONE_FAKE_LOG", self.path("calls.log"))
            .env("NO_GRAPHICS", "1")
            .env_remove("RUST_LOG")
            .env_remove("NO_COLOR")
            .env_remove("KSTONE_PROFILE")
            .env_remove("KSTONE_OUTPUT")
            .env_remove("KSTONE_REQUEST_TIMEOUT")
            .env_remove("KSTONE_PROGRAM");
        for (key, _) in std::env::vars_os() {
            if key.to_string_lossy().starts_with("OS_") {
                cmd.env_remove(key);
            }
        }
        cmd
    }

    /// A `kstone` command with admin credentials and no retries.
    fn authed(&self) -> assert_cmd::Command {
        let mut cmd = self.bare();
        cmd.env("OS_USERNAME", "admin")
            .env("OS_PASSWORD", "hunter2")
            .env("OS_SYSTEM_SCOPE", "all")
            .env("OS_AUTH_URL", "http://127.0.0.1:5000/v3")
            .args(["--request-timeout", "0", "--color", "never"]);
        cmd
    }

    /// [`authed`](Self::authed) running the fake tool.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = self.authed();
        cmd.arg("--program").arg(self.path("openstack"));
        cmd
    }

    fn calls(&self) -> String {
        fs::read_to_string(self.path("calls.log")).unwrap_or_default()
    }
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let sandbox = Sandbox::new();
    let output = sandbox.bare().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    Sandbox::new().bare().arg("--help").assert().success().stdout(
        predicate::str::contains("domain")
            .and(predicate::str::contains("project"))
            .and(predicate::str::contains("user"))
            .and(predicate::str::contains("resolve")),
    );
}

#[test]
fn test_version_flag() {
    Sandbox::new()
        .bare()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kstone"));
}

#[test]
fn test_completions_zsh() {
    Sandbox::new()
        .bare()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    let output = Sandbox::new()
        .bare()
        .args(["--output", "invalid", "domain", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("possible values"), "{text}");
}

// ── Domain resolution ───────────────────────────────────────────────

#[test]
fn test_resolve_without_domain_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["resolve", "admin"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing domain name for resource [admin]"));
    assert_eq!(sandbox.calls(), "", "no invocation expected");
}

#[test]
fn test_resolve_default_domain_keeps_bare_name() {
    Sandbox::new()
        .cmd()
        .args(["resolve", "admin", "--domain", "Default"])
        .assert()
        .success()
        .stdout("admin\n");
}

#[test]
fn test_resolve_other_domain_qualifies_name() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["resolve", "svc", "--domain", "Ops"])
        .assert()
        .success()
        .stdout("svc::Ops\n");
    assert_eq!(sandbox.calls().lines().count(), 1, "one domain list expected");
}

#[test]
fn test_resolve_unknown_domain_warns() {
    Sandbox::new()
        .cmd()
        .args(["resolve", "svc", "--domain", "Nope"])
        .assert()
        .success()
        .stdout("svc\n")
        .stderr(predicate::str::contains("Could not find domain with name [Nope]"));
}

#[test]
fn test_domain_id_and_name_are_inverse() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["domain", "id", "Ops"])
        .assert()
        .success()
        .stdout("d2\n");
    sandbox
        .cmd()
        .args(["domain", "name", "d2"])
        .assert()
        .success()
        .stdout("Ops\n");
}

#[test]
fn test_domain_id_not_found() {
    Sandbox::new()
        .cmd()
        .args(["domain", "id", "Nope"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_domain_list_plain() {
    Sandbox::new()
        .cmd()
        .args(["-o", "plain", "domain", "list"])
        .assert()
        .success()
        .stdout("Default\nOps\n");
}

// ── Fetchers ────────────────────────────────────────────────────────

#[test]
fn test_project_show_json_defaults_description() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["-o", "json", "project", "show", "admin"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""name": "admin""#)
                .and(predicate::str::contains(r#""description": """#)),
        );
    let calls = sandbox.calls();
    assert!(
        calls.contains("project show --format shell admin --domain Default user=admin"),
        "{calls}"
    );
}

#[test]
fn test_user_show_missing_is_not_found() {
    Sandbox::new()
        .cmd()
        .args(["user", "show", "ghost::Default"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("user 'ghost::Default' not found"));
}

#[test]
fn test_project_show_in_missing_domain_reports_the_domain() {
    Sandbox::new()
        .cmd()
        .args(["project", "show", "web", "--domain", "Ghost"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("domain 'Ghost' not found"));
}

#[test]
fn test_project_list_plain() {
    Sandbox::new()
        .cmd()
        .args(["-o", "plain", "project", "list"])
        .assert()
        .success()
        .stdout("admin\n");
}

// ── Reconciliation ──────────────────────────────────────────────────

#[test]
fn test_user_ensure_creates_missing_user() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args([
            "-o",
            "json",
            "user",
            "ensure",
            "bob",
            "--domain",
            "Default",
            "--email",
            "bob@example.com",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""outcome": "created""#)
                .and(predicate::str::contains(r#""domain": "Default""#)),
        );
    let calls = sandbox.calls();
    assert!(calls.contains("user create --format shell"), "{calls}");
    assert!(calls.contains("--email bob@example.com"), "{calls}");
}

#[test]
fn test_domain_ensure_unchanged() {
    Sandbox::new()
        .cmd()
        .args(["domain", "ensure", "Ops", "--enable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("domain Ops: unchanged"));
}

#[test]
fn test_domain_remove_requires_confirmation() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["domain", "remove", "Ops"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(sandbox.calls(), "");
}

#[test]
fn test_domain_remove_disables_then_deletes() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["--yes", "domain", "remove", "Ops"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));
    let calls = sandbox.calls();
    let set = calls.find("domain set --disable Ops").unwrap();
    let delete = calls.find("domain delete Ops").unwrap();
    assert!(set < delete, "{calls}");
}

// ── Failures ────────────────────────────────────────────────────────

#[test]
fn test_missing_credentials() {
    let sandbox = Sandbox::new();
    sandbox
        .bare()
        .args(["domain", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_authentication_failure() {
    Sandbox::new()
        .cmd()
        .args(["user", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("HTTP 401"));
}

#[test]
fn test_unavailable_service_without_retries() {
    Sandbox::new()
        .cmd()
        .args(["--yes", "project", "remove", "admin"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("HTTP 503"));
}

#[test]
fn test_missing_tool() {
    Sandbox::new()
        .authed()
        .args(["--program", "/nonexistent/openstack", "domain", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot run"));
}

// ── Auth URL ────────────────────────────────────────────────────────

#[test]
fn test_auth_url_precedence() {
    let sandbox = Sandbox::new();
    sandbox
        .bare()
        .args(["-o", "plain", "auth", "url"])
        .assert()
        .success()
        .stdout("http://127.0.0.1:5000/v3\n");

    fs::write(
        sandbox.path("openrc"),
        "export OS_AUTH_URL='http://127.0.0.1:5001'\n",
    )
    .unwrap();
    sandbox
        .bare()
        .args(["auth", "url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:5001").and(predicate::str::contains("rc-file")));

    sandbox
        .bare()
        .env("OS_AUTH_URL", "http://127.0.0.1:5002")
        .args(["-o", "plain", "auth", "url"])
        .assert()
        .success()
        .stdout("http://127.0.0.1:5002\n");

    sandbox
        .bare()
        .env("OS_AUTH_URL", "http://127.0.0.1:5002")
        .args(["-o", "plain", "--auth-url", "http://flag:5000/v3", "auth", "url"])
        .assert()
        .success()
        .stdout("http://flag:5000/v3\n");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_override() {
    let sandbox = Sandbox::new();
    sandbox
        .bare()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(format!("{}\n", sandbox.path("config.toml").display()));
}

#[test]
fn test_config_show_no_config() {
    Sandbox::new()
        .bare()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

#[test]
fn test_config_validate_rejects_inactive_domain_directory() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.path("config.toml"),
        "[service]\ndomain_config_directory = \"/etc/keystone/domains\"\n",
    )
    .unwrap();
    sandbox
        .bare()
        .args(["config", "validate"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("You must activate domain configuration"));
}

#[test]
fn test_config_use_unknown_profile() {
    Sandbox::new()
        .bare()
        .args(["config", "use", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Profile 'nope' not found"));
}

#[test]
fn test_profile_supplies_credentials() {
    let sandbox = Sandbox::new();
    fs::write(
        sandbox.path("config.toml"),
        format!(
            "default_profile = \"lab\"\n\n\
             [profiles.lab]\n\
             auth_url = \"http://keystone.lab:5000/v3\"\n\
             username = \"operator\"\n\
             password = \"plaintext\"\n\
             system_scope = \"all\"\n\
             program = \"{}\"\n",
            sandbox.path("openstack").display()
        ),
    )
    .unwrap();
    sandbox
        .bare()
        .args(["domain", "id", "Default"])
        .assert()
        .success()
        .stdout("default\n");
    assert!(sandbox.calls().contains("user=operator"), "{}", sandbox.calls());
}
