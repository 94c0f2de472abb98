// ── Entity records ──

use std::fmt;

use kstone_api::Record;
use serde::Serialize;

/// One identity entity as the CLI reported it.
///
/// Attribute values stay raw strings in output order; typed accessors
/// interpret the handful of attributes reconciliation needs. A record is
/// never mutated after construction. Cached records are shared behind
/// `Arc`, and a changed entity is represented by a fresh record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntityRecord {
    attrs: Record,
}

impl EntityRecord {
    pub fn new(attrs: Record) -> Self {
        Self { attrs }
    }

    /// Build from a `show`/`create` response, defaulting `description` to
    /// an empty string. The CLI omits the attribute when it is unset.
    pub fn from_show(mut attrs: Record) -> Self {
        if !attrs.contains_key("description") {
            attrs.insert("description".into(), String::new());
        }
        Self { attrs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    pub fn description(&self) -> &str {
        self.get("description").unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email").filter(|e| !e.is_empty())
    }

    pub fn domain_id(&self) -> Option<&str> {
        self.get("domain_id")
    }

    /// `enabled` as a boolean. The CLI prints `True`/`False`; anything
    /// else is treated as unknown.
    pub fn enabled(&self) -> Option<bool> {
        parse_bool(self.get("enabled")?)
    }

    pub fn attributes(&self) -> &Record {
        &self.attrs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl From<Record> for EntityRecord {
    fn from(attrs: Record) -> Self {
        Self::new(attrs)
    }
}

impl fmt::Display for EntityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self.id()) {
            (Some(name), Some(id)) => write!(f, "{name} ({id})"),
            (Some(name), None) => f.write_str(name),
            (None, Some(id)) => f.write_str(id),
            (None, None) => f.write_str("<unnamed>"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn show_response_gains_empty_description() {
        let rec = EntityRecord::from_show(record(&[("name", "The User"), ("id", "the_user_id")]));
        let attrs: Vec<(&str, &str)> = rec.iter().collect();
        assert_eq!(
            attrs,
            [("name", "The User"), ("id", "the_user_id"), ("description", "")]
        );
    }

    #[test]
    fn show_response_keeps_existing_description() {
        let rec = EntityRecord::from_show(record(&[("description", "ops")]));
        assert_eq!(rec.description(), "ops");
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn enabled_reads_cli_booleans() {
        assert_eq!(EntityRecord::new(record(&[("enabled", "True")])).enabled(), Some(true));
        assert_eq!(EntityRecord::new(record(&[("enabled", "False")])).enabled(), Some(false));
        assert_eq!(EntityRecord::new(record(&[("enabled", "None")])).enabled(), None);
        assert_eq!(EntityRecord::new(Record::new()).enabled(), None);
    }

    #[test]
    fn empty_email_reads_as_unset() {
        assert_eq!(EntityRecord::new(record(&[("email", "")])).email(), None);
    }

    #[test]
    fn display_prefers_name_and_id() {
        let rec = EntityRecord::new(record(&[("id", "abc"), ("name", "Ops")]));
        assert_eq!(rec.to_string(), "Ops (abc)");
    }
}
