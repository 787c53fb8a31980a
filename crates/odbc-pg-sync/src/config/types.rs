//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_HEADER_PREFIXES;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// ODBC source configuration.
    pub source: SourceConfig,

    /// Destination database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Sync behavior configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// ODBC source configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Data source name registered with the ODBC driver manager.
    #[serde(default)]
    pub dsn: String,

    /// Full ODBC connection string. Overrides `dsn` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    /// Username, appended as `UID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password, appended as `PWD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Rows fetched per ODBC batch (default: 1000).
    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,

    /// Maximum bytes fetched per text cell (default: 65536).
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            connection_string: None,
            user: None,
            password: None,
            fetch_batch_size: default_fetch_batch_size(),
            max_text_len: default_max_text_len(),
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("dsn", &self.dsn)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("fetch_batch_size", &self.fetch_batch_size)
            .field("max_text_len", &self.max_text_len)
            .finish()
    }
}

/// Destination database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    #[serde(default = "default_localhost")]
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Destination schema (default: "public").
    #[serde(default = "default_public_schema")]
    pub schema: String,

    /// SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,

    /// Connect timeout in seconds (default: 30).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_localhost(),
            port: default_pg_port(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
            schema: default_public_schema(),
            ssl_mode: default_disable(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Sync behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Path of the table list file (default: "QuickBooks_Tables_List.txt").
    #[serde(default = "default_table_list")]
    pub table_list: PathBuf,

    /// What to do with source tables that have no rows.
    #[serde(default)]
    pub on_empty_table: EmptyTablePolicy,

    /// Rows per COPY buffer flush (default: 1000).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Table list lines starting with one of these are skipped.
    #[serde(default = "default_header_prefixes")]
    pub header_prefixes: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            table_list: default_table_list(),
            on_empty_table: EmptyTablePolicy::default(),
            chunk_size: default_chunk_size(),
            header_prefixes: default_header_prefixes(),
        }
    }
}

/// Handling of source tables that return zero rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTablePolicy {
    /// Replace the destination table with an empty one that has the source
    /// columns.
    #[default]
    CreateSchemaOnly,

    /// Leave the destination untouched and count the table as succeeded.
    Skip,
}

impl std::str::FromStr for EmptyTablePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "create_schema_only" | "schema_only" | "create" => Ok(EmptyTablePolicy::CreateSchemaOnly),
            "skip" => Ok(EmptyTablePolicy::Skip),
            other => Err(format!(
                "unknown empty-table policy '{}' (expected create_schema_only or skip)",
                other
            )),
        }
    }
}

impl fmt::Display for EmptyTablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyTablePolicy::CreateSchemaOnly => write!(f, "create_schema_only"),
            EmptyTablePolicy::Skip => write!(f, "skip"),
        }
    }
}

// Default value functions for serde
fn default_fetch_batch_size() -> usize {
    1000
}

fn default_max_text_len() -> usize {
    65536
}

fn default_localhost() -> String {
    "localhost".to_string()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_public_schema() -> String {
    "public".to_string()
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_table_list() -> PathBuf {
    PathBuf::from("QuickBooks_Tables_List.txt")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_header_prefixes() -> Vec<String> {
    DEFAULT_HEADER_PREFIXES.iter().map(|p| p.to_string()).collect()
}
