//! Error types for the sync library.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration errors (bad YAML, missing fields).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when the table list cannot be read.
pub const EXIT_CATALOG_ERROR: u8 = 2;
/// Exit code when the source or destination cannot be reached.
pub const EXIT_CONNECTION_ERROR: u8 = 3;
/// Exit code when `--strict` is set and at least one table failed.
pub const EXIT_TABLES_FAILED: u8 = 4;
/// Exit code for an extraction or load error outside the per-table loop.
pub const EXIT_TABLE_ERROR: u8 = 5;
/// Exit code for file-system errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code after SIGINT/SIGTERM.
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table list file is missing or unreadable. Raised before connecting.
    #[error("Table list error ({}): {message}", .path.display())]
    Catalog { path: PathBuf, message: String },

    /// Source or destination could not be reached. Fatal to the run.
    #[error("Connection to {resource} failed: {message}")]
    Connection { resource: String, message: String },

    /// Query against a single source table failed.
    #[error("Extraction failed for table {table}: {message}")]
    Extraction { table: String, message: String },

    /// Writing a single destination table failed.
    #[error("Load failed for table {table}: {message}")]
    Load { table: String, message: String },

    /// One or more tables failed and the caller asked for a strict outcome.
    #[error("{} table(s) failed: {}", .failed.len(), .failed.join(", "))]
    TablesFailed { failed: Vec<String> },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run was cancelled (SIGINT, etc.)
    #[error("Sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Create a Catalog error for the given table-list path.
    pub fn catalog(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SyncError::Catalog {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a Connection error naming the unreachable resource.
    pub fn connection(resource: impl Into<String>, message: impl ToString) -> Self {
        SyncError::Connection {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    /// Create an Extraction error
    pub fn extraction(table: impl Into<String>, message: impl ToString) -> Self {
        SyncError::Extraction {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a Load error
    pub fn load(table: impl Into<String>, message: impl ToString) -> Self {
        SyncError::Load {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) | SyncError::Yaml(_) | SyncError::Json(_) => EXIT_CONFIG_ERROR,
            SyncError::Catalog { .. } => EXIT_CATALOG_ERROR,
            SyncError::Connection { .. } => EXIT_CONNECTION_ERROR,
            SyncError::TablesFailed { .. } => EXIT_TABLES_FAILED,
            SyncError::Extraction { .. } | SyncError::Load { .. } => EXIT_TABLE_ERROR,
            SyncError::Io(_) => EXIT_IO_ERROR,
            SyncError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
