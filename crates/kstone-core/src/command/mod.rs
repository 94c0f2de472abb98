// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// provider renders each variant as one CLI invocation and invalidates the
// cache entries it touches.

pub mod requests;

use std::sync::Arc;

use kstone_api::{Action, Invocation, Resource};

use crate::model::{EntityKey, EntityRecord};

pub use requests::{CreateDomainRequest, CreateProjectRequest, CreateUserRequest, UpdateRequest};

/// All possible write operations against the identity service.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Domains ──────────────────────────────────────────────────────
    CreateDomain(CreateDomainRequest),
    UpdateDomain {
        name: String,
        update: UpdateRequest,
    },
    /// Keystone refuses to delete an enabled domain; disable it first.
    DeleteDomain {
        name: String,
    },

    // ── Projects ─────────────────────────────────────────────────────
    CreateProject(CreateProjectRequest),
    UpdateProject {
        name: String,
        domain: String,
        update: UpdateRequest,
    },
    DeleteProject {
        name: String,
        domain: String,
    },

    // ── Users ────────────────────────────────────────────────────────
    CreateUser(CreateUserRequest),
    UpdateUser {
        name: String,
        domain: String,
        update: UpdateRequest,
    },
    DeleteUser {
        name: String,
        domain: String,
    },
}

impl Command {
    /// The CLI call that performs this command.
    pub fn invocation(&self) -> Invocation {
        match self {
            Self::CreateDomain(req) => req.invocation(),
            Self::CreateProject(req) => req.invocation(),
            Self::CreateUser(req) => req.invocation(),
            Self::UpdateDomain { name, update } => update
                .apply(Invocation::new(Resource::Domain, Action::Set))
                .arg(name),
            Self::UpdateProject {
                name,
                domain,
                update,
            } => update
                .apply(Invocation::new(Resource::Project, Action::Set).opt("--domain", domain))
                .arg(name),
            Self::UpdateUser {
                name,
                domain,
                update,
            } => update
                .apply(Invocation::new(Resource::User, Action::Set).opt("--domain", domain))
                .arg(name),
            Self::DeleteDomain { name } => Invocation::new(Resource::Domain, Action::Delete).arg(name),
            Self::DeleteProject { name, domain } => {
                Invocation::new(Resource::Project, Action::Delete)
                    .opt("--domain", domain)
                    .arg(name)
            }
            Self::DeleteUser { name, domain } => Invocation::new(Resource::User, Action::Delete)
                .opt("--domain", domain)
                .arg(name),
        }
    }

    /// The cache key this command changes.
    pub fn key(&self) -> EntityKey {
        match self {
            Self::CreateDomain(CreateDomainRequest { name, .. })
            | Self::UpdateDomain { name, .. }
            | Self::DeleteDomain { name } => EntityKey::domain(name.as_str()),
            Self::CreateProject(CreateProjectRequest { name, domain, .. })
            | Self::UpdateProject { name, domain, .. }
            | Self::DeleteProject { name, domain } => {
                EntityKey::project(name.as_str(), domain.as_str())
            }
            Self::CreateUser(CreateUserRequest { name, domain, .. })
            | Self::UpdateUser { name, domain, .. }
            | Self::DeleteUser { name, domain } => EntityKey::user(name.as_str(), domain.as_str()),
        }
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    /// The record printed by a `create`.
    Created(Arc<EntityRecord>),
}
