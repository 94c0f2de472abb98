// ── Reconciliation ──
//
// Drives one entity from its observed state toward a desired state with the
// fewest CLI writes: nothing when it already matches, a single `set` with
// only the differing attributes otherwise.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use kstone_api::Runner;

use crate::command::{
    Command, CreateDomainRequest, CreateProjectRequest, CreateUserRequest, UpdateRequest,
};
use crate::error::CoreError;
use crate::model::{DomainSpec, EntityRecord, Ensure, ProjectSpec, UserSpec};
use crate::provider::Provider;

/// What reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "fields", rename_all = "lowercase")]
pub enum Outcome {
    Created,
    /// Names of the attributes that were changed.
    Updated(Vec<String>),
    Unchanged,
    Deleted,
}

impl Outcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated(fields) => write!(f, "updated ({})", fields.join(", ")),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

/// Attributes of `current` that differ from the desired values.
fn diff(
    current: &EntityRecord,
    enabled: bool,
    description: Option<&str>,
    email: Option<&str>,
) -> UpdateRequest {
    UpdateRequest {
        enabled: (current.enabled() != Some(enabled)).then_some(enabled),
        description: description
            .filter(|d| *d != current.description())
            .map(str::to_owned),
        email: email
            .filter(|e| current.email() != Some(*e))
            .map(str::to_owned),
    }
}

fn require_domain(name: &str, domain: &str) -> Result<(), CoreError> {
    if domain.is_empty() {
        Err(CoreError::MissingDomain {
            resource: name.to_owned(),
        })
    } else {
        Ok(())
    }
}

impl<R: Runner> Provider<R> {
    pub fn reconcile_domain(
        &mut self,
        spec: &DomainSpec,
        ensure: Ensure,
    ) -> Result<Outcome, CoreError> {
        let current = self.fetch_domain(&spec.name)?;

        let outcome = match (current, ensure) {
            (None, Ensure::Present) => {
                self.execute(Command::CreateDomain(CreateDomainRequest {
                    name: spec.name.clone(),
                    enabled: spec.enabled,
                    description: spec.description.clone(),
                }))?;
                Outcome::Created
            }
            (Some(current), Ensure::Present) => {
                let update = diff(&current, spec.enabled, spec.description.as_deref(), None);
                self.apply_update(update, |update| Command::UpdateDomain {
                    name: spec.name.clone(),
                    update,
                })?
            }
            (Some(current), Ensure::Absent) => {
                if current.enabled() != Some(false) {
                    self.execute(Command::UpdateDomain {
                        name: spec.name.clone(),
                        update: UpdateRequest {
                            enabled: Some(false),
                            ..UpdateRequest::default()
                        },
                    })?;
                }
                self.execute(Command::DeleteDomain {
                    name: spec.name.clone(),
                })?;
                Outcome::Deleted
            }
            (None, Ensure::Absent) => Outcome::Unchanged,
        };

        debug!(domain = %spec.name, %outcome, "reconciled");
        Ok(outcome)
    }

    pub fn reconcile_project(
        &mut self,
        spec: &ProjectSpec,
        ensure: Ensure,
    ) -> Result<Outcome, CoreError> {
        require_domain(&spec.name, &spec.domain)?;
        let current = self.fetch_project(&spec.name, &spec.domain)?;

        let outcome = match (current, ensure) {
            (None, Ensure::Present) => {
                self.execute(Command::CreateProject(CreateProjectRequest {
                    name: spec.name.clone(),
                    domain: spec.domain.clone(),
                    enabled: spec.enabled,
                    description: spec.description.clone(),
                }))?;
                Outcome::Created
            }
            (Some(current), Ensure::Present) => {
                let update = diff(&current, spec.enabled, spec.description.as_deref(), None);
                self.apply_update(update, |update| Command::UpdateProject {
                    name: spec.name.clone(),
                    domain: spec.domain.clone(),
                    update,
                })?
            }
            (Some(_), Ensure::Absent) => {
                self.execute(Command::DeleteProject {
                    name: spec.name.clone(),
                    domain: spec.domain.clone(),
                })?;
                Outcome::Deleted
            }
            (None, Ensure::Absent) => Outcome::Unchanged,
        };

        debug!(project = %spec.name, domain = %spec.domain, %outcome, "reconciled");
        Ok(outcome)
    }

    pub fn reconcile_user(&mut self, spec: &UserSpec, ensure: Ensure) -> Result<Outcome, CoreError> {
        require_domain(&spec.name, &spec.domain)?;
        let current = self.fetch_user(&spec.name, &spec.domain)?;

        let outcome = match (current, ensure) {
            (None, Ensure::Present) => {
                self.execute(Command::CreateUser(CreateUserRequest {
                    name: spec.name.clone(),
                    domain: spec.domain.clone(),
                    enabled: spec.enabled,
                    email: spec.email.clone(),
                    description: spec.description.clone(),
                    password: spec.password.clone(),
                }))?;
                Outcome::Created
            }
            (Some(current), Ensure::Present) => {
                let update = diff(
                    &current,
                    spec.enabled,
                    spec.description.as_deref(),
                    spec.email.as_deref(),
                );
                self.apply_update(update, |update| Command::UpdateUser {
                    name: spec.name.clone(),
                    domain: spec.domain.clone(),
                    update,
                })?
            }
            (Some(_), Ensure::Absent) => {
                self.execute(Command::DeleteUser {
                    name: spec.name.clone(),
                    domain: spec.domain.clone(),
                })?;
                Outcome::Deleted
            }
            (None, Ensure::Absent) => Outcome::Unchanged,
        };

        debug!(user = %spec.name, domain = %spec.domain, %outcome, "reconciled");
        Ok(outcome)
    }

    fn apply_update(
        &mut self,
        update: UpdateRequest,
        command: impl FnOnce(UpdateRequest) -> Command,
    ) -> Result<Outcome, CoreError> {
        if update.is_empty() {
            return Ok(Outcome::Unchanged);
        }
        let fields = update.changed_fields();
        self.execute(command(update))?;
        Ok(Outcome::Updated(fields))
    }
}
