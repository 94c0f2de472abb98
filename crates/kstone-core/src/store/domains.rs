// ── Domain name/ID index ──
//
// Domains are referenced by name in desired state but by ID in every
// project and user record, so both directions are indexed. Pairs are
// learned from the one-off domain listing and from individual `show`
// lookups; names and IDs that could not be resolved are remembered too.

use std::collections::{HashMap, HashSet};

/// Result of consulting the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Known(&'a str),
    /// Looked up before and not found.
    Missing,
    /// Never looked up.
    Unknown,
}

#[derive(Debug, Default)]
pub struct DomainIndex {
    id_by_name: HashMap<String, String>,
    name_by_id: HashMap<String, String>,
    missing_names: HashSet<String>,
    missing_ids: HashSet<String>,
    listed: bool,
}

impl DomainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_for(&self, name: &str) -> Lookup<'_> {
        if let Some(id) = self.id_by_name.get(name) {
            Lookup::Known(id)
        } else if self.missing_names.contains(name) {
            Lookup::Missing
        } else {
            Lookup::Unknown
        }
    }

    pub fn name_for(&self, id: &str) -> Lookup<'_> {
        if let Some(name) = self.name_by_id.get(id) {
            Lookup::Known(name)
        } else if self.missing_ids.contains(id) {
            Lookup::Missing
        } else {
            Lookup::Unknown
        }
    }

    /// Record a discovered pair, clearing any negative entry for either
    /// side.
    pub fn record(&mut self, name: &str, id: &str) {
        self.missing_names.remove(name);
        self.missing_ids.remove(id);
        self.id_by_name.insert(name.to_owned(), id.to_owned());
        self.name_by_id.insert(id.to_owned(), name.to_owned());
    }

    pub fn mark_missing_name(&mut self, name: &str) {
        self.missing_names.insert(name.to_owned());
    }

    pub fn mark_missing_id(&mut self, id: &str) {
        self.missing_ids.insert(id.to_owned());
    }

    /// Drop everything known about a domain name, including its ID.
    pub fn forget_name(&mut self, name: &str) {
        self.missing_names.remove(name);
        if let Some(id) = self.id_by_name.remove(name) {
            self.name_by_id.remove(&id);
            self.missing_ids.remove(&id);
        }
    }

    /// Whether the full domain list has been loaded this run.
    pub fn is_listed(&self) -> bool {
        self.listed
    }

    pub fn mark_listed(&mut self) {
        self.listed = true;
    }

    pub fn len(&self) -> usize {
        self.id_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_by_name.is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_resolve_both_ways() {
        let mut index = DomainIndex::new();
        index.record("SomeName", "someid");
        assert_eq!(index.id_for("SomeName"), Lookup::Known("someid"));
        assert_eq!(index.name_for("someid"), Lookup::Known("SomeName"));
        assert_eq!(index.id_for("Other"), Lookup::Unknown);
    }

    #[test]
    fn negative_entries_are_cleared_by_discovery() {
        let mut index = DomainIndex::new();
        index.mark_missing_name("late");
        assert_eq!(index.id_for("late"), Lookup::Missing);
        index.record("late", "late_id");
        assert_eq!(index.id_for("late"), Lookup::Known("late_id"));
    }

    #[test]
    fn forget_name_drops_both_directions() {
        let mut index = DomainIndex::new();
        index.record("gone", "gone_id");
        index.forget_name("gone");
        assert_eq!(index.id_for("gone"), Lookup::Unknown);
        assert_eq!(index.name_for("gone_id"), Lookup::Unknown);
    }

    #[test]
    fn reset_clears_listing_flag() {
        let mut index = DomainIndex::new();
        index.mark_listed();
        index.record("a", "b");
        index.reset();
        assert!(!index.is_listed());
        assert!(index.is_empty());
    }
}
