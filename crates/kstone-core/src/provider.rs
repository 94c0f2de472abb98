// ── Provider ──
//
// One reconciliation context: credentials, invoker, run cache and domain
// index. Every lookup goes through the cache first; every write
// invalidates what it touched. Two providers never share state.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use kstone_api::{Action, CliClient, CommandEnv, Invocation, OpenstackCli, Resource, Runner};

use crate::command::{Command, CommandResult};
use crate::config::ProviderConfig;
use crate::error::CoreError;
use crate::model::{DOMAIN_SEPARATOR, EntityKey, EntityRecord};
use crate::store::{DomainIndex, EntityCache, Lookup};

/// Reconciliation context for domains, projects and users.
///
/// All methods take `&mut self`: lookups populate the run cache, and the
/// CLI is never invoked concurrently.
pub struct Provider<R = OpenstackCli> {
    client: CliClient<R>,
    env: CommandEnv,
    default_domain_id: String,
    cache: EntityCache,
    domains: DomainIndex,
}

impl Provider<OpenstackCli> {
    /// Provider that runs the real `openstack` binary named in `config`.
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_runner(config, OpenstackCli::new(&config.program))
    }
}

impl<R: Runner> Provider<R> {
    pub fn with_runner(config: &ProviderConfig, runner: R) -> Self {
        Self {
            client: CliClient::new(runner, config.retry_policy()),
            env: config.credentials.to_env(),
            default_domain_id: config.default_domain_id.clone(),
            cache: EntityCache::new(),
            domains: DomainIndex::new(),
        }
    }

    pub fn runner(&self) -> &R {
        self.client.runner()
    }

    /// ID of the domain whose name is left off composite names.
    pub fn default_domain_id(&self) -> &str {
        &self.default_domain_id
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// Start a new run: forget every cached lookup and domain pair.
    pub fn reset(&mut self) {
        debug!(entries = self.cache.len(), domains = self.domains.len(), "resetting run cache");
        self.cache.reset();
        self.domains.reset();
    }

    // ── Raw requests ─────────────────────────────────────────────

    fn list(&self, invocation: &Invocation) -> Result<Vec<EntityRecord>, CoreError> {
        let rows = self.client.list(invocation, &self.env)?;
        Ok(rows.into_iter().map(EntityRecord::new).collect())
    }

    /// `show` an entity. A not-found failure naming the requested kind and
    /// an empty body both mean the entity does not exist. Any other missing
    /// entity, such as the `--domain` of a project, is an error.
    fn show(&self, invocation: &Invocation) -> Result<Option<EntityRecord>, CoreError> {
        match self.client.show(invocation, &self.env) {
            Ok(record) => Ok(record.map(EntityRecord::from_show)),
            Err(err) if err.is_not_found_for(invocation.resource) => {
                debug!(error = %err, "entity does not exist");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Cached `show` for one key. Both outcomes are remembered.
    fn fetch(&mut self, key: EntityKey) -> Result<Option<Arc<EntityRecord>>, CoreError> {
        if let Some(entry) = self.cache.get(&key) {
            trace!(%key, "cache hit");
            return Ok(entry.record());
        }

        let invocation = Invocation::new(key.kind, Action::Show)
            .arg(key.name.as_str())
            .opt_if("--domain", key.domain.as_deref());
        match self.show(&invocation)? {
            Some(record) => Ok(Some(self.cache.insert(key, record))),
            None => {
                self.cache.insert_missing(key);
                Ok(None)
            }
        }
    }

    // ── Fetchers ─────────────────────────────────────────────────

    /// Look up a domain by name or ID.
    pub fn fetch_domain(&mut self, identifier: &str) -> Result<Option<Arc<EntityRecord>>, CoreError> {
        let found = self.fetch(EntityKey::domain(identifier))?;
        if let Some(record) = &found {
            if let (Some(name), Some(id)) = (record.name(), record.id()) {
                self.domains.record(name, id);
            }
        }
        Ok(found)
    }

    /// Look up a project within a domain. `None` when it does not exist.
    pub fn fetch_project(
        &mut self,
        name: &str,
        domain: &str,
    ) -> Result<Option<Arc<EntityRecord>>, CoreError> {
        self.fetch(EntityKey::project(name, domain))
    }

    /// Look up a user within a domain. `None` when it does not exist.
    pub fn fetch_user(
        &mut self,
        name: &str,
        domain: &str,
    ) -> Result<Option<Arc<EntityRecord>>, CoreError> {
        self.fetch(EntityKey::user(name, domain))
    }

    // ── Listing ──────────────────────────────────────────────────

    /// List every domain, learning all name/ID pairs on the way.
    pub fn list_domains(&mut self) -> Result<Vec<EntityRecord>, CoreError> {
        let records = self.list(&Invocation::new(Resource::Domain, Action::List))?;
        for record in &records {
            if let (Some(name), Some(id)) = (record.name(), record.id()) {
                self.domains.record(name, id);
            }
        }
        self.domains.mark_listed();
        debug!(domains = records.len(), "domain list loaded");
        Ok(records)
    }

    pub fn list_projects(&self, domain: Option<&str>) -> Result<Vec<EntityRecord>, CoreError> {
        self.list(
            &Invocation::new(Resource::Project, Action::List)
                .opt_if("--domain", domain)
                .arg("--long"),
        )
    }

    pub fn list_users(&self, domain: Option<&str>) -> Result<Vec<EntityRecord>, CoreError> {
        self.list(
            &Invocation::new(Resource::User, Action::List)
                .opt_if("--domain", domain)
                .arg("--long"),
        )
    }

    // ── Domain resolution ────────────────────────────────────────

    /// Resolve a domain name to its ID.
    ///
    /// Consults the index, then the full domain list (once per run), then
    /// a direct `show`. A name that cannot be resolved is logged, cached
    /// as missing and yields `None`.
    pub fn domain_id_from_name(&mut self, name: &str) -> Result<Option<String>, CoreError> {
        match self.domains.id_for(name) {
            Lookup::Known(id) => return Ok(Some(id.to_owned())),
            Lookup::Missing => return Ok(None),
            Lookup::Unknown => {}
        }

        if !self.domains.is_listed() {
            self.list_domains()?;
            if let Lookup::Known(id) = self.domains.id_for(name) {
                return Ok(Some(id.to_owned()));
            }
        }

        let found = self.fetch_domain(name)?;
        if let Some(id) = found.as_deref().and_then(EntityRecord::id) {
            return Ok(Some(id.to_owned()));
        }

        warn!("Could not find domain with name [{name}]");
        self.domains.mark_missing_name(name);
        Ok(None)
    }

    /// Resolve a domain ID to its name. Mirror of
    /// [`domain_id_from_name`](Self::domain_id_from_name).
    pub fn domain_name_from_id(&mut self, id: &str) -> Result<Option<String>, CoreError> {
        match self.domains.name_for(id) {
            Lookup::Known(name) => return Ok(Some(name.to_owned())),
            Lookup::Missing => return Ok(None),
            Lookup::Unknown => {}
        }

        if !self.domains.is_listed() {
            self.list_domains()?;
            if let Lookup::Known(name) = self.domains.name_for(id) {
                return Ok(Some(name.to_owned()));
            }
        }

        let found = self.fetch_domain(id)?;
        if let Some(name) = found.as_deref().and_then(EntityRecord::name) {
            return Ok(Some(name.to_owned()));
        }

        warn!("Could not find domain with id [{id}]");
        self.domains.mark_missing_id(id);
        Ok(None)
    }

    /// Build the composite name for a resource in `domain`.
    ///
    /// Resources in the default domain keep their bare name, as do
    /// resources whose domain cannot be resolved. Anything else becomes
    /// `name::domain`.
    pub fn set_domain_for_name(
        &mut self,
        name: &str,
        domain: Option<&str>,
    ) -> Result<String, CoreError> {
        let Some(domain) = domain.filter(|d| !d.is_empty()) else {
            return Err(CoreError::MissingDomain {
                resource: name.to_owned(),
            });
        };

        match self.domain_id_from_name(domain)? {
            Some(id) if id != self.default_domain_id => {
                Ok(format!("{name}{DOMAIN_SEPARATOR}{domain}"))
            }
            _ => Ok(name.to_owned()),
        }
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a write command.
    ///
    /// The affected cache key is invalidated; a `create` caches the record
    /// the CLI prints back.
    pub fn execute(&mut self, cmd: Command) -> Result<CommandResult, CoreError> {
        let key = cmd.key();
        let invocation = cmd.invocation();
        self.cache.invalidate(&key);

        let result = match &cmd {
            Command::CreateDomain(_) | Command::CreateProject(_) | Command::CreateUser(_) => {
                match self.client.show(&invocation, &self.env)? {
                    Some(attrs) => {
                        let record = EntityRecord::from_show(attrs);
                        if let (Resource::Domain, Some(name), Some(id)) =
                            (key.kind, record.name(), record.id())
                        {
                            self.domains.record(name, id);
                        }
                        CommandResult::Created(self.cache.insert(key.clone(), record))
                    }
                    None => CommandResult::Ok,
                }
            }
            Command::DeleteDomain { name } => {
                self.client.execute(&invocation, &self.env)?;
                if let Lookup::Known(id) = self.domains.id_for(name) {
                    let id_key = EntityKey::domain(id);
                    self.cache.invalidate(&id_key);
                }
                self.domains.forget_name(name);
                CommandResult::Ok
            }
            _ => {
                self.client.execute(&invocation, &self.env)?;
                CommandResult::Ok
            }
        };

        info!(%key, action = %invocation.action, "applied");
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use kstone_api::Error;
    use secrecy::SecretString;

    use super::*;
    use crate::config::Credentials;

    /// Answers every call with the same output and records the argv.
    struct Echo {
        stdout: String,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl Runner for Echo {
        fn run(&self, argv: &[String], _env: &CommandEnv) -> Result<String, Error> {
            self.calls.borrow_mut().push(argv.to_vec());
            Ok(self.stdout.clone())
        }
    }

    fn provider(stdout: &str) -> Provider<Echo> {
        let creds = Credentials::system(
            "http://127.0.0.1:5000/v3".parse().unwrap(),
            "test",
            SecretString::from("abc123".to_owned()),
        );
        Provider::with_runner(
            &ProviderConfig::new(creds),
            Echo {
                stdout: stdout.into(),
                calls: RefCell::new(Vec::new()),
            },
        )
    }

    #[test]
    fn empty_domain_is_missing() {
        let mut p = provider("");
        let err = p.set_domain_for_name("name", Some("")).unwrap_err();
        assert!(matches!(err, CoreError::MissingDomain { .. }));
        assert!(p.runner().calls.borrow().is_empty());
    }

    #[test]
    fn reset_forgets_negative_entries() {
        let mut p = provider("\n");
        assert!(p.fetch_user("ghost", "Default").unwrap().is_none());
        assert!(p.fetch_user("ghost", "Default").unwrap().is_none());
        assert_eq!(p.runner().calls.borrow().len(), 1);

        p.reset();
        assert!(p.cache().is_empty());
        assert!(p.fetch_user("ghost", "Default").unwrap().is_none());
        assert_eq!(p.runner().calls.borrow().len(), 2);
    }
}
