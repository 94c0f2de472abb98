// ── Identity domain model ──
//
// Records observed through the CLI, the keys they are cached under, and
// the desired-state specs reconciliation drives them toward.

pub mod desired;
pub mod key;
pub mod record;

// ── Re-exports ──────────────────────────────────────────────────────

pub use desired::{DomainSpec, Ensure, ProjectSpec, UserSpec};
pub use key::{CompositeName, DOMAIN_SEPARATOR, EntityKey};
pub use record::EntityRecord;
