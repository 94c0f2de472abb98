// kstone-core: Run-scoped reconciliation of Keystone domains, projects and users.

pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{AuthCredentials, AuthScope, Credentials, DEFAULT_DOMAIN_ID, ProviderConfig};
pub use error::CoreError;
pub use provider::Provider;
pub use reconcile::Outcome;
pub use store::{CacheEntry, EntityCache};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CompositeName, DomainSpec, EntityKey, EntityRecord, Ensure, ProjectSpec, UserSpec,
};
