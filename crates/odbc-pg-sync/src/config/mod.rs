//! Configuration loading and validation.
//!
//! Configuration comes from a YAML file, from `ODBC_PG_SYNC_*` environment
//! variables, or from both (environment values override file values).

mod types;
mod validation;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "ODBC_PG_SYNC_";

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from `ODBC_PG_SYNC_*` environment variables alone.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ODBC_PG_SYNC_*` environment variables on top of this config.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.apply_env_overrides(|key| std::env::var(key).ok())?;
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from `lookup`, which maps a full variable name to its value.
    ///
    /// Recognized variables (all prefixed with `ODBC_PG_SYNC_`):
    /// - `SOURCE_DSN`, `SOURCE_CONNECTION_STRING`, `SOURCE_USER`, `SOURCE_PASSWORD`
    /// - `TARGET_HOST`, `TARGET_PORT`, `TARGET_DATABASE`, `TARGET_USER`,
    ///   `TARGET_PASSWORD`, `TARGET_SCHEMA`, `TARGET_SSL_MODE`
    /// - `TABLE_LIST`, `ON_EMPTY_TABLE`, `CHUNK_SIZE`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(dsn) = var("SOURCE_DSN") {
            self.source.dsn = dsn;
        }
        if let Some(conn_str) = var("SOURCE_CONNECTION_STRING") {
            self.source.connection_string = Some(conn_str);
        }
        if let Some(user) = var("SOURCE_USER") {
            self.source.user = Some(user);
        }
        if let Some(password) = var("SOURCE_PASSWORD") {
            self.source.password = Some(password);
        }

        if let Some(host) = var("TARGET_HOST") {
            self.target.host = host;
        }
        if let Some(port) = var("TARGET_PORT") {
            self.target.port = port.parse().map_err(|_| {
                SyncError::Config(format!("Invalid {}TARGET_PORT value: {}", ENV_PREFIX, port))
            })?;
        }
        if let Some(database) = var("TARGET_DATABASE") {
            self.target.database = database;
        }
        if let Some(user) = var("TARGET_USER") {
            self.target.user = user;
        }
        if let Some(password) = var("TARGET_PASSWORD") {
            self.target.password = password;
        }
        if let Some(schema) = var("TARGET_SCHEMA") {
            self.target.schema = schema;
        }
        if let Some(ssl_mode) = var("TARGET_SSL_MODE") {
            self.target.ssl_mode = ssl_mode;
        }

        if let Some(path) = var("TABLE_LIST") {
            self.sync.table_list = PathBuf::from(path);
        }
        if let Some(policy) = var("ON_EMPTY_TABLE") {
            self.sync.on_empty_table = policy.parse().map_err(SyncError::Config)?;
        }
        if let Some(chunk) = var("CHUNK_SIZE") {
            self.sync.chunk_size = chunk.parse().map_err(|_| {
                SyncError::Config(format!("Invalid {}CHUNK_SIZE value: {}", ENV_PREFIX, chunk))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Build the ODBC connection string.
    ///
    /// An explicit `connection_string` is used verbatim. Otherwise the string
    /// is `DSN=<dsn>;` followed by `UID`/`PWD` when credentials are set.
    pub fn connection_string(&self) -> String {
        if let Some(conn_str) = &self.connection_string {
            return conn_str.clone();
        }

        let mut conn_str = format!("DSN={};", escape_attribute(&self.dsn));
        if let Some(user) = &self.user {
            conn_str.push_str(&format!("UID={};", escape_attribute(user)));
        }
        if let Some(password) = &self.password {
            conn_str.push_str(&format!("PWD={};", escape_attribute(password)));
        }
        conn_str
    }

    /// Name of the source for messages, without credentials.
    pub fn describe(&self) -> String {
        if self.dsn.is_empty() {
            "ODBC connection string".to_string()
        } else {
            format!("ODBC DSN '{}'", self.dsn)
        }
    }
}

impl TargetConfig {
    /// Name of the destination for messages, without credentials.
    pub fn describe(&self) -> String {
        if self.host.contains(':') {
            format!("PostgreSQL [{}]:{}/{}", self.host, self.port, self.database)
        } else {
            format!("PostgreSQL {}:{}/{}", self.host, self.port, self.database)
        }
    }
}

/// Brace-quote an ODBC attribute value that would otherwise end the attribute.
fn escape_attribute(value: &str) -> String {
    if value.contains([';', '{', '}']) || value.starts_with(' ') || value.ends_with(' ') {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}
