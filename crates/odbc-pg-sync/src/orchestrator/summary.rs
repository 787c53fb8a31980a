//! Run and per-table results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Terminal state of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Succeeded,
    Failed,
}

/// What happened to the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TableLoad {
    /// Replaced with the extracted rows.
    Loaded { rows: u64 },
    /// Source was empty; replaced with an empty table carrying the source columns.
    SchemaOnly,
    /// Source was empty; destination left untouched.
    SkippedEmpty,
    /// Nothing was written (the table failed).
    NotLoaded,
}

impl TableLoad {
    pub fn rows(&self) -> u64 {
        match self {
            TableLoad::Loaded { rows } => *rows,
            _ => 0,
        }
    }
}

/// Outcome of one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOutcome {
    /// Name as listed in the catalog.
    pub table: String,

    /// Destination table name (lowercase).
    pub destination: String,

    pub status: TableStatus,

    pub load: TableLoad,

    /// Error message for failed tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,
}

impl TableOutcome {
    pub fn succeeded(table: &str, destination: &str, load: TableLoad, duration_ms: u64) -> Self {
        Self {
            table: table.to_string(),
            destination: destination.to_string(),
            status: TableStatus::Succeeded,
            load,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(table: &str, destination: &str, error: &SyncError, duration_ms: u64) -> Self {
        Self {
            table: table.to_string(),
            destination: destination.to_string(),
            status: TableStatus::Failed,
            load: TableLoad::NotLoaded,
            error: Some(error.to_string()),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TableStatus::Succeeded
    }

    /// Console line for this outcome, e.g. `[3/40] ✅ Success: Invoice (1200 rows)`.
    pub fn progress_line(&self, index: usize, total: usize) -> String {
        let prefix = format!("[{}/{}]", index, total);
        match (self.status, self.load) {
            (TableStatus::Succeeded, TableLoad::Loaded { rows }) => {
                format!("{} ✅ Success: {} ({} rows)", prefix, self.table, rows)
            }
            (TableStatus::Succeeded, TableLoad::SchemaOnly) => {
                format!("{} ✅ Created: {} (0 rows, schema only)", prefix, self.table)
            }
            (TableStatus::Succeeded, _) => {
                format!("{} ⚠️  Skipped: {} (No Data)", prefix, self.table)
            }
            (TableStatus::Failed, _) => format!(
                "{} ❌ Failed: {}\n   {}",
                prefix,
                self.table,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// A failed catalog entry and its error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTable {
    pub table: String,
    pub error: String,
}

/// Result of a sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Catalog length.
    pub tables_total: usize,

    /// Catalog entries processed. Equals `tables_total` unless cancelled.
    pub tables_attempted: usize,

    pub tables_succeeded: usize,

    pub tables_failed: usize,

    /// Rows written across all tables.
    pub rows_loaded: u64,

    /// Whether the run stopped early on a cancellation request.
    pub cancelled: bool,

    pub failed_tables: Vec<FailedTable>,

    /// Per-table outcomes in catalog order.
    pub tables: Vec<TableOutcome>,
}

impl RunSummary {
    /// Summary for a run that has not processed anything yet.
    pub fn new(tables_total: usize) -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: now,
            completed_at: now,
            duration_seconds: 0.0,
            tables_total,
            tables_attempted: 0,
            tables_succeeded: 0,
            tables_failed: 0,
            rows_loaded: 0,
            cancelled: false,
            failed_tables: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Summary of a run over an empty catalog.
    pub fn empty() -> Self {
        let mut summary = Self::new(0);
        summary.finish(false);
        summary
    }

    pub(crate) fn record(&mut self, outcome: TableOutcome) {
        self.tables_attempted += 1;
        match outcome.status {
            TableStatus::Succeeded => {
                self.tables_succeeded += 1;
                self.rows_loaded += outcome.load.rows();
            }
            TableStatus::Failed => {
                self.tables_failed += 1;
                self.failed_tables.push(FailedTable {
                    table: outcome.table.clone(),
                    error: outcome.error.clone().unwrap_or_default(),
                });
            }
        }
        self.tables.push(outcome);
    }

    pub(crate) fn finish(&mut self, cancelled: bool) {
        self.completed_at = Utc::now();
        self.duration_seconds =
            (self.completed_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        self.cancelled = cancelled;
    }

    /// True when every attempted table succeeded and the run was not cancelled.
    pub fn is_success(&self) -> bool {
        self.tables_failed == 0 && !self.cancelled
    }

    pub fn failed_table_names(&self) -> Vec<String> {
        self.failed_tables.iter().map(|f| f.table.clone()).collect()
    }

    /// Error for `--strict` runs: cancellation, or the list of failed tables.
    pub fn into_strict_result(self) -> Result<Self> {
        if self.cancelled {
            return Err(SyncError::Cancelled);
        }
        if self.tables_failed > 0 {
            return Err(SyncError::TablesFailed {
                failed: self.failed_table_names(),
            });
        }
        Ok(self)
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
