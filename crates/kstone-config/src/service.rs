// ── Identity service settings ──
//
// Deployment knobs handed to the tooling that installs and configures the
// identity service. Nothing here is applied by kstone itself; the settings
// are only validated, so that a bad combination is reported before any
// command runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const DEFAULT_FERNET_KEY_REPOSITORY: &str = "/etc/keystone/fernet-keys";
pub const DEFAULT_CREDENTIAL_KEY_REPOSITORY: &str = "/etc/keystone/credential-keys";
pub const DEFAULT_DOMAIN_CONFIG_DIRECTORY: &str = "/etc/keystone/domains";
pub const DEFAULT_CATALOG_TEMPLATE_FILE: &str = "/etc/keystone/default_catalog.templates";

/// Service names the identity service can run under: standalone, or
/// inside a web server.
const SERVICE_NAMES: &[&str] = &["keystone", "openstack-keystone", "httpd", "apache2"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ServiceSettings {
    pub package_ensure: String,
    pub service_name: String,
    pub manage_service: bool,
    pub enabled: bool,
    pub sync_db: bool,
    pub token_provider: String,
    /// Token lifetime in seconds.
    pub token_expiration: u64,
    /// `sql` or `template`.
    pub catalog_type: String,
    pub catalog_template_file: Option<PathBuf>,
    pub using_domain_config: bool,
    pub domain_config_directory: Option<PathBuf>,
    pub enable_fernet_setup: bool,
    pub fernet_key_repository: PathBuf,
    pub fernet_max_active_keys: u32,
    pub enable_credential_setup: bool,
    pub credential_key_repository: PathBuf,
    pub enable_ssl: bool,
    pub ssl_certfile: Option<PathBuf>,
    pub ssl_keyfile: Option<PathBuf>,
    pub ssl_ca_certs: Option<PathBuf>,
    pub default_domain: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            package_ensure: "present".into(),
            service_name: "httpd".into(),
            manage_service: true,
            enabled: true,
            sync_db: true,
            token_provider: "fernet".into(),
            token_expiration: 3600,
            catalog_type: "sql".into(),
            catalog_template_file: None,
            using_domain_config: false,
            domain_config_directory: None,
            enable_fernet_setup: true,
            fernet_key_repository: PathBuf::from(DEFAULT_FERNET_KEY_REPOSITORY),
            fernet_max_active_keys: 5,
            enable_credential_setup: true,
            credential_key_repository: PathBuf::from(DEFAULT_CREDENTIAL_KEY_REPOSITORY),
            enable_ssl: false,
            ssl_certfile: None,
            ssl_keyfile: None,
            ssl_ca_certs: None,
            default_domain: None,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn require_absolute(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{}' is not an absolute path", path.display()),
        ))
    }
}

impl ServiceSettings {
    /// Reject invalid combinations. Reports the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SERVICE_NAMES.contains(&self.service_name.as_str()) {
            return Err(invalid(
                "service_name",
                format!(
                    "Invalid service_name '{}'. Use keystone or openstack-keystone to run \
                     standalone, or httpd/apache2 to run inside a web server",
                    self.service_name
                ),
            ));
        }

        if !matches!(self.catalog_type.as_str(), "sql" | "template") {
            return Err(invalid(
                "catalog_type",
                format!("expected 'sql' or 'template', got '{}'", self.catalog_type),
            ));
        }
        if let Some(file) = &self.catalog_template_file {
            require_absolute("catalog_template_file", file)?;
        }

        if let Some(dir) = &self.domain_config_directory {
            if !self.using_domain_config {
                return Err(invalid(
                    "domain_config_directory",
                    "You must activate domain configuration using \
                     'using_domain_config' parameter to keystone class.",
                ));
            }
            require_absolute("domain_config_directory", dir)?;
        }

        if self.token_expiration == 0 {
            return Err(invalid("token_expiration", "must be greater than zero"));
        }
        if self.fernet_max_active_keys == 0 {
            return Err(invalid("fernet_max_active_keys", "must be greater than zero"));
        }
        require_absolute("fernet_key_repository", &self.fernet_key_repository)?;
        require_absolute("credential_key_repository", &self.credential_key_repository)?;

        for (field, path) in [
            ("ssl_certfile", &self.ssl_certfile),
            ("ssl_keyfile", &self.ssl_keyfile),
            ("ssl_ca_certs", &self.ssl_ca_certs),
        ] {
            match path {
                Some(path) => require_absolute(field, path)?,
                None if self.enable_ssl && field != "ssl_ca_certs" => {
                    return Err(invalid(field, "required when enable_ssl is true"));
                }
                None => {}
            }
        }

        Ok(())
    }

    /// Catalog driver name in the service's own configuration.
    pub fn catalog_driver(&self) -> &'static str {
        if self.catalog_type == "template" {
            "templated"
        } else {
            "sql"
        }
    }

    /// The template file in effect when `catalog_type` is `template`.
    pub fn effective_catalog_template_file(&self) -> Option<PathBuf> {
        (self.catalog_type == "template").then(|| {
            self.catalog_template_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_TEMPLATE_FILE))
        })
    }

    /// The domain configuration directory in effect, if domain
    /// configuration is on.
    pub fn effective_domain_config_directory(&self) -> Option<PathBuf> {
        self.using_domain_config.then(|| {
            self.domain_config_directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOMAIN_CONFIG_DIRECTORY))
        })
    }

    /// File whose presence shows the fernet repository was initialised.
    pub fn fernet_setup_marker(&self) -> PathBuf {
        self.fernet_key_repository.join("0")
    }

    /// File whose presence shows the credential repository was initialised.
    pub fn credential_setup_marker(&self) -> PathBuf {
        self.credential_key_repository.join("0")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::Validation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let settings = ServiceSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.catalog_driver(), "sql");
        assert_eq!(settings.effective_domain_config_directory(), None);
        assert_eq!(settings.effective_catalog_template_file(), None);
        assert_eq!(
            settings.fernet_setup_marker(),
            PathBuf::from("/etc/keystone/fernet-keys/0")
        );
        assert_eq!(
            settings.credential_setup_marker(),
            PathBuf::from("/etc/keystone/credential-keys/0")
        );
    }

    #[test]
    fn domain_directory_requires_domain_config() {
        let settings = ServiceSettings {
            domain_config_directory: Some("/this/is/an/absolute/path".into()),
            ..ServiceSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("You must activate domain"), "{err}");
    }

    #[test]
    fn domain_directory_must_be_absolute() {
        let settings = ServiceSettings {
            using_domain_config: true,
            domain_config_directory: Some("this/is/not/an/absolute/path".into()),
            ..ServiceSettings::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "domain_config_directory");
    }

    #[test]
    fn domain_config_uses_default_directory() {
        let settings = ServiceSettings {
            using_domain_config: true,
            ..ServiceSettings::default()
        };
        settings.validate().unwrap();
        assert_eq!(
            settings.effective_domain_config_directory(),
            Some(PathBuf::from("/etc/keystone/domains"))
        );

        let settings = ServiceSettings {
            using_domain_config: true,
            domain_config_directory: Some("/this/is/an/absolute/path".into()),
            ..ServiceSettings::default()
        };
        assert_eq!(
            settings.effective_domain_config_directory(),
            Some(PathBuf::from("/this/is/an/absolute/path"))
        );
    }

    #[test]
    fn catalog_type_is_checked() {
        let settings = ServiceSettings {
            catalog_type: "invalid".into(),
            ..ServiceSettings::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "catalog_type");
    }

    #[test]
    fn template_catalog_defaults_its_file() {
        let settings = ServiceSettings {
            catalog_type: "template".into(),
            ..ServiceSettings::default()
        };
        assert_eq!(settings.catalog_driver(), "templated");
        assert_eq!(
            settings.effective_catalog_template_file(),
            Some(PathBuf::from("/etc/keystone/default_catalog.templates"))
        );
    }

    #[test]
    fn unknown_service_name_is_rejected() {
        let settings = ServiceSettings {
            service_name: "foo".into(),
            ..ServiceSettings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid service_name"), "{err}");
    }

    #[test]
    fn ssl_needs_certificate_and_key() {
        let mut settings = ServiceSettings {
            enable_ssl: true,
            ..ServiceSettings::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "ssl_certfile");

        settings.ssl_certfile = Some("/etc/keystone/ssl/certs/keystone.pem".into());
        settings.ssl_keyfile = Some("/etc/keystone/ssl/private/keystonekey.pem".into());
        settings.validate().unwrap();
    }

    #[test]
    fn zero_limits_are_rejected() {
        let settings = ServiceSettings {
            token_expiration: 0,
            ..ServiceSettings::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "token_expiration");

        let settings = ServiceSettings {
            fernet_max_active_keys: 0,
            ..ServiceSettings::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "fernet_max_active_keys");
    }
}
