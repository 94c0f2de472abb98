// ── Run-scoped state ──
//
// Everything the provider learns during one reconciliation run. Owned by
// the provider and cleared by `Provider::reset`.

mod cache;
mod domains;

pub use cache::{CacheEntry, EntityCache};
pub use domains::{DomainIndex, Lookup};
