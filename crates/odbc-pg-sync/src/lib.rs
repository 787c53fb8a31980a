//! # odbc-pg-sync
//!
//! Full-refresh replication of a fixed list of tables from an ODBC data source
//! (typically a QuickBooks company file behind a CData ODBC DSN) into
//! PostgreSQL.
//!
//! For each table in the table list the library:
//!
//! - **Extracts** every row with `SELECT * FROM "<table>"` over ODBC
//! - **Normalizes** column names to lowercase
//! - **Replaces** the destination table (drop, create, COPY) in one transaction
//! - **Isolates failures**, so one bad table never stops the run
//!
//! Empty source tables are either materialized schema-only or skipped,
//! depending on [`EmptyTablePolicy`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use odbc_pg_sync::{Config, Orchestrator, TableCatalog};
//!
//! #[tokio::main]
//! async fn main() -> odbc_pg_sync::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let catalog = TableCatalog::load(&config.sync.table_list, &config.sync.header_prefixes)?;
//!     let orchestrator = Orchestrator::connect(&config).await?;
//!     let summary = orchestrator.run(&catalog, None).await;
//!     println!("Loaded {} rows", summary.rows_loaded);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod source;
pub mod target;
pub mod typemap;

// Re-exports for convenient access
pub use catalog::{write_catalog, TableCatalog};
pub use config::{Config, EmptyTablePolicy, SourceConfig, SyncConfig, TargetConfig};
pub use crate::core::{Column, ColumnType, NormalizedRowset, Rowset, SqlValue, TableSink, TableSource};
pub use error::{Result, SyncError};
pub use normalize::normalize;
pub use orchestrator::{
    health_check, HealthCheckResult, Orchestrator, ProgressUpdate, RowCountCheck, RunSummary,
    TableLoad, TableOutcome, TableStatus,
};
pub use source::OdbcSource;
pub use target::PgSink;
