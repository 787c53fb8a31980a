//! Trait seams between the orchestrator and the two endpoints.
//!
//! - [`TableSource`]: reads whole tables from the upstream catalog
//! - [`TableSink`]: replaces whole tables in the destination
//!
//! The orchestrator only sees these traits, so the per-table loop can be
//! exercised against in-memory implementations.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::{NormalizedRowset, Rowset};

/// Read tables from the source system.
///
/// Implementations hold one open session for their whole lifetime. Errors
/// from `extract*` are reported as [`crate::SyncError::Extraction`].
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Read every row of `table` (`SELECT * FROM "<table>"`).
    async fn extract(&self, table: &str) -> Result<Rowset>;

    /// Read the column metadata of `table` without transferring rows.
    async fn extract_schema_only(&self, table: &str) -> Result<Rowset>;

    /// Count rows in `table`.
    async fn row_count(&self, table: &str) -> Result<i64>;

    /// Human-readable description of the endpoint for diagnostics.
    fn describe(&self) -> String;

    /// Release the session.
    async fn close(&self);
}

/// Materialize tables in the destination.
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Drop `table` if it exists, recreate it from the rowset header, and
    /// insert every row. A rowset with no rows leaves an empty table with the
    /// correct columns. Returns the number of rows written.
    ///
    /// Errors are reported as [`crate::SyncError::Load`] and leave any
    /// previous copy of the table in place.
    async fn replace_table(&self, table: &str, rowset: NormalizedRowset) -> Result<u64>;

    /// Row count of `table`, or `None` when it does not exist.
    async fn row_count(&self, table: &str) -> Result<Option<i64>>;

    /// Human-readable description of the endpoint for diagnostics.
    fn describe(&self) -> String;

    /// Release the connection.
    async fn close(&self);
}
