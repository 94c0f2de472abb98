// ── Typed request structs for Command payloads ──
//
// Each request knows how to render itself as CLI arguments. The entity
// name is always the last positional argument.

use kstone_api::{Action, Invocation, Resource};
use secrecy::SecretString;

// ── Domain ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDomainRequest {
    pub name: String,
    pub enabled: bool,
    pub description: Option<String>,
}

impl CreateDomainRequest {
    pub(crate) fn invocation(&self) -> Invocation {
        Invocation::new(Resource::Domain, Action::Create)
            .flag_if("--enable", self.enabled)
            .flag_if("--disable", !self.enabled)
            .opt_if("--description", self.description.as_deref())
            .arg(&self.name)
    }
}

// ── Project ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    pub name: String,
    pub domain: String,
    pub enabled: bool,
    pub description: Option<String>,
}

impl CreateProjectRequest {
    pub(crate) fn invocation(&self) -> Invocation {
        Invocation::new(Resource::Project, Action::Create)
            .opt("--domain", &self.domain)
            .flag_if("--enable", self.enabled)
            .flag_if("--disable", !self.enabled)
            .opt_if("--description", self.description.as_deref())
            .arg(&self.name)
    }
}

// ── User ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub domain: String,
    pub enabled: bool,
    pub email: Option<String>,
    pub description: Option<String>,
    pub password: Option<SecretString>,
}

impl CreateUserRequest {
    pub(crate) fn invocation(&self) -> Invocation {
        let mut inv = Invocation::new(Resource::User, Action::Create)
            .opt("--domain", &self.domain)
            .flag_if("--enable", self.enabled)
            .flag_if("--disable", !self.enabled)
            .opt_if("--email", self.email.as_deref())
            .opt_if("--description", self.description.as_deref());
        if let Some(password) = &self.password {
            inv = inv.secret_opt("--password", password);
        }
        inv.arg(&self.name)
    }
}

// ── Updates (shared) ───────────────────────────────────────────────

/// Attribute changes for a `set`. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub enabled: Option<bool>,
    pub description: Option<String>,
    pub email: Option<String>,
}

impl UpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.description.is_none() && self.email.is_none()
    }

    /// Names of the attributes this update changes, in argument order.
    pub fn changed_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.enabled.is_some() {
            fields.push("enabled".to_owned());
        }
        if self.email.is_some() {
            fields.push("email".to_owned());
        }
        if self.description.is_some() {
            fields.push("description".to_owned());
        }
        fields
    }

    pub(crate) fn apply(&self, inv: Invocation) -> Invocation {
        inv.flag_if("--enable", self.enabled == Some(true))
            .flag_if("--disable", self.enabled == Some(false))
            .opt_if("--email", self.email.as_deref())
            .opt_if("--description", self.description.as_deref())
    }
}
