//! Backend selection and connection parameters.
//!
//! Exactly one branch of [`DatabaseConfig`] is populated, matching the
//! selector read at process start. A missing selector or a missing
//! parameter in the selected branch is a fatal `Config` error; there is no
//! silent default backend.

use std::env;

use crate::error::DatastoreError;
use crate::types::BackendKind;

/// Environment variable naming the active backend.
pub const BACKEND_VAR: &str = "DATASTORE_BACKEND";

/// Connection parameters for the managed data platform.
#[derive(Debug, Clone)]
pub struct PlatformOptions {
    /// Base URL of the platform project, without a trailing slash.
    pub url: String,
    /// Service key sent as both `apikey` and bearer token.
    pub api_key: String,
}

impl PlatformOptions {
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: trim_trailing_slash(url.into()),
            api_key: api_key.into(),
        }
    }
}

/// Connection parameters for the SQL Server backend.
#[derive(Debug, Clone)]
pub struct RelationalOptions {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub encrypt: bool,
    pub trust_cert: bool,
    /// Public base URL files are served from; the relational backend stores
    /// file metadata only and derives URLs by convention.
    pub file_base_url: String,
    pub max_pool_size: usize,
}

impl RelationalOptions {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            port: 1433,
            encrypt: false,
            trust_cert: true,
            file_base_url: String::new(),
            max_pool_size: 20,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_encryption(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn with_file_base_url(mut self, url: impl Into<String>) -> Self {
        self.file_base_url = trim_trailing_slash(url.into());
        self
    }

    #[must_use]
    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }
}

/// Tagged configuration union: one branch per backend kind.
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    Platform(PlatformOptions),
    Relational(RelationalOptions),
}

impl DatabaseConfig {
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Platform(_) => BackendKind::Platform,
            Self::Relational(_) => BackendKind::Relational,
        }
    }

    /// Read the full configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `DatastoreError::Config` when the selector is absent or the
    /// selected branch is missing a required parameter.
    pub fn from_env() -> Result<Self, DatastoreError> {
        match require(BACKEND_VAR)?.as_str() {
            "platform" => Ok(Self::Platform(PlatformOptions::new(
                require("DATASTORE_PLATFORM_URL")?,
                require("DATASTORE_PLATFORM_KEY")?,
            ))),
            "relational" => {
                let mut opts = RelationalOptions::new(
                    require("DATASTORE_SQL_HOST")?,
                    require("DATASTORE_SQL_DATABASE")?,
                    require("DATASTORE_SQL_USER")?,
                    require("DATASTORE_SQL_PASSWORD")?,
                );
                if let Some(port) = optional("DATASTORE_SQL_PORT") {
                    opts.port = port.parse().map_err(|_| {
                        DatastoreError::Config(format!("DATASTORE_SQL_PORT is not a port: {port}"))
                    })?;
                }
                if let Some(encrypt) = optional("DATASTORE_SQL_ENCRYPT") {
                    opts.encrypt = parse_bool("DATASTORE_SQL_ENCRYPT", &encrypt)?;
                }
                if let Some(trust) = optional("DATASTORE_SQL_TRUST_CERT") {
                    opts.trust_cert = parse_bool("DATASTORE_SQL_TRUST_CERT", &trust)?;
                }
                if let Some(url) = optional("DATASTORE_SQL_FILE_BASE_URL") {
                    opts.file_base_url = trim_trailing_slash(url);
                }
                Ok(Self::Relational(opts))
            }
            other => Err(DatastoreError::Config(format!(
                "{BACKEND_VAR} must be 'platform' or 'relational', got '{other}'"
            ))),
        }
    }
}

fn require(var: &str) -> Result<String, DatastoreError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(DatastoreError::Config(format!("{var} is not set"))),
    }
}

fn optional(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn parse_bool(var: &str, value: &str) -> Result<bool, DatastoreError> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(DatastoreError::Config(format!(
            "{var} must be a boolean, got '{value}'"
        ))),
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}
