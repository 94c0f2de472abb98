// ── Entity identity ──
//
// `EntityKey` addresses one lookup in the run cache. `CompositeName` is the
// user-facing `name::domain` form used to tell apart same-named projects
// and users in different domains.

use std::fmt;

use kstone_api::Resource;

use crate::error::CoreError;

/// Separator between resource name and domain in a composite name.
pub const DOMAIN_SEPARATOR: &str = "::";

/// Cache key: entity kind, name, and the domain the name was looked up in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: Resource,
    pub name: String,
    pub domain: Option<String>,
}

impl EntityKey {
    pub fn domain(name: impl Into<String>) -> Self {
        Self {
            kind: Resource::Domain,
            name: name.into(),
            domain: None,
        }
    }

    pub fn project(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            kind: Resource::Project,
            name: name.into(),
            domain: Some(domain.into()),
        }
    }

    pub fn user(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            kind: Resource::User,
            name: name.into(),
            domain: Some(domain.into()),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{} [{}] in domain [{domain}]", self.kind, self.name),
            None => write!(f, "{} [{}]", self.kind, self.name),
        }
    }
}

/// A resource name optionally qualified by its domain: `name` or
/// `name::domain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeName {
    pub name: String,
    pub domain: Option<String>,
}

impl CompositeName {
    /// Split at the last `::`, so names may themselves contain `::`.
    pub fn parse(title: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidIdentifier {
            identifier: title.to_owned(),
            reason: reason.to_owned(),
        };

        match title.rsplit_once(DOMAIN_SEPARATOR) {
            Some((name, domain)) => {
                if name.is_empty() {
                    return Err(invalid("empty resource name"));
                }
                if domain.is_empty() {
                    return Err(invalid("empty domain name"));
                }
                Ok(Self {
                    name: name.to_owned(),
                    domain: Some(domain.to_owned()),
                })
            }
            None if title.is_empty() => Err(invalid("empty resource name")),
            None => Ok(Self {
                name: title.to_owned(),
                domain: None,
            }),
        }
    }

    /// The qualifying domain, or `default` when the name is unqualified.
    pub fn domain_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.domain.as_deref().unwrap_or(default)
    }
}

impl fmt::Display for CompositeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{}{DOMAIN_SEPARATOR}{domain}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
