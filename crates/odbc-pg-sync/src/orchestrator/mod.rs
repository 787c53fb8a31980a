//! Sync orchestrator: the sequential per-table loop.
//!
//! Every catalog entry goes through
//! `Pending -> Extracting -> (Empty -> SchemaOnlyExtract ->) Loading -> Done`,
//! or ends in `Failed` from any step. A failed table is recorded and the loop
//! moves on; nothing a single table does can stop the run.

mod summary;

pub use summary::{FailedTable, RunSummary, TableLoad, TableOutcome, TableStatus};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::catalog::TableCatalog;
use crate::config::{Config, EmptyTablePolicy};
use crate::core::{TableSink, TableSource};
use crate::error::{Result, SyncError};
use crate::normalize::{destination_table_name, normalize};
use crate::source::OdbcSource;
use crate::target::PgSink;

/// Per-table processing step, traced at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePhase {
    Pending,
    Extracting,
    Empty,
    SchemaOnlyExtract,
    Loading,
    Done,
    Failed,
}

/// Sent after each catalog entry reaches a terminal state.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// 1-based position in the catalog.
    pub index: usize,
    pub total: usize,
    pub outcome: TableOutcome,
}

/// Source and destination row counts for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCountCheck {
    pub table: String,
    pub destination: String,
    pub source_rows: Option<i64>,
    /// `None` when the destination table does not exist.
    pub destination_rows: Option<i64>,
    pub matches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of probing both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

/// Sync orchestrator.
pub struct Orchestrator {
    source: Box<dyn TableSource>,
    sink: Box<dyn TableSink>,
    on_empty_table: EmptyTablePolicy,
    progress_tx: Option<mpsc::Sender<ProgressUpdate>>,
}

impl Orchestrator {
    /// Open the ODBC source and the PostgreSQL destination.
    ///
    /// Connection failures are fatal and returned before any table is touched.
    pub async fn connect(config: &Config) -> Result<Self> {
        let source = OdbcSource::open(&config.source).await?;
        let sink = match PgSink::connect(&config.target, config.sync.chunk_size).await {
            Ok(sink) => sink,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        Ok(Self::with_endpoints(
            Box::new(source),
            Box::new(sink),
            config.sync.on_empty_table,
        ))
    }

    /// Build an orchestrator over already-open endpoints.
    pub fn with_endpoints(
        source: Box<dyn TableSource>,
        sink: Box<dyn TableSink>,
        on_empty_table: EmptyTablePolicy,
    ) -> Self {
        Self {
            source,
            sink,
            on_empty_table,
            progress_tx: None,
        }
    }

    /// Set progress channel for updates.
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressUpdate>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Send progress update if channel is configured.
    async fn send_progress(&self, update: ProgressUpdate) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(update).await;
        }
    }

    /// Sync every catalog entry in order, then close both endpoints.
    ///
    /// Per-table errors are recorded in the summary, never returned. When
    /// `cancel` fires, the table in flight finishes, the remaining entries are
    /// not attempted, and the summary is marked cancelled.
    pub async fn run(self, catalog: &TableCatalog, cancel: Option<CancellationToken>) -> RunSummary {
        let total = catalog.len();
        let mut summary = RunSummary::new(total);
        let mut cancelled = false;

        info!(
            "Starting sync run {}: {} tables from {} to {} (empty tables: {})",
            summary.run_id,
            total,
            self.source.describe(),
            self.sink.describe(),
            self.on_empty_table
        );

        for (i, table) in catalog.iter().enumerate() {
            if cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                warn!(
                    "Sync cancelled; {} of {} tables not attempted",
                    total - i,
                    total
                );
                cancelled = true;
                break;
            }

            let span = info_span!("table", table = %table, index = i + 1, total);
            let outcome = self.process_table(table).instrument(span).await;

            self.send_progress(ProgressUpdate {
                index: i + 1,
                total,
                outcome: outcome.clone(),
            })
            .await;
            summary.record(outcome);
        }

        self.close().await;
        summary.finish(cancelled);

        info!(
            "Sync run {} finished in {:.1}s: {} attempted, {} succeeded, {} failed, {} rows",
            summary.run_id,
            summary.duration_seconds,
            summary.tables_attempted,
            summary.tables_succeeded,
            summary.tables_failed,
            summary.rows_loaded
        );
        summary
    }

    /// Run one catalog entry to a terminal state.
    async fn process_table(&self, table: &str) -> TableOutcome {
        let started = Instant::now();
        let destination = destination_table_name(table);
        debug!(phase = ?TablePhase::Pending);

        match self.sync_table(table, &destination).await {
            Ok(load) => {
                debug!(phase = ?TablePhase::Done);
                info!("{} -> {}: {:?}", table, destination, load);
                TableOutcome::succeeded(table, &destination, load, elapsed_ms(started))
            }
            Err(e) => {
                debug!(phase = ?TablePhase::Failed);
                error!("Table {} failed: {}", table, e);
                TableOutcome::failed(table, &destination, &e, elapsed_ms(started))
            }
        }
    }

    async fn sync_table(&self, table: &str, destination: &str) -> Result<TableLoad> {
        debug!(phase = ?TablePhase::Extracting);
        let rowset = normalize(self.source.extract(table).await?);

        if !rowset.is_empty() {
            debug!(phase = ?TablePhase::Loading, rows = rowset.row_count());
            let rows = self.sink.replace_table(destination, rowset).await?;
            return Ok(TableLoad::Loaded { rows });
        }

        debug!(phase = ?TablePhase::Empty);
        match self.on_empty_table {
            EmptyTablePolicy::Skip => Ok(TableLoad::SkippedEmpty),
            EmptyTablePolicy::CreateSchemaOnly => {
                debug!(phase = ?TablePhase::SchemaOnlyExtract);
                let schema = normalize(self.source.extract_schema_only(table).await?);
                if schema.columns().is_empty() {
                    return Err(SyncError::extraction(
                        table,
                        "schema-only query reported no columns",
                    ));
                }
                debug!(phase = ?TablePhase::Loading, rows = 0);
                self.sink.replace_table(destination, schema).await?;
                Ok(TableLoad::SchemaOnly)
            }
        }
    }

    /// Compare source `COUNT(*)` with the destination row count for each table.
    pub async fn validate(&self, catalog: &TableCatalog) -> Vec<RowCountCheck> {
        let mut results = Vec::with_capacity(catalog.len());

        for table in catalog.iter() {
            let destination = destination_table_name(table);
            let mut errors = Vec::new();

            let source_rows = match self.source.row_count(table).await {
                Ok(n) => Some(n),
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            };
            let destination_rows = match self.sink.row_count(&destination).await {
                Ok(n) => n,
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            };

            let matches = source_rows.is_some() && source_rows == destination_rows;
            if matches {
                info!("{}: {} rows (match)", table, source_rows.unwrap_or_default());
            } else {
                warn!(
                    "{}: source={:?} destination={:?} (MISMATCH)",
                    table, source_rows, destination_rows
                );
            }

            results.push(RowCountCheck {
                table: table.to_string(),
                destination,
                source_rows,
                destination_rows,
                matches,
                error: (!errors.is_empty()).then(|| errors.join("; ")),
            });
        }

        results
    }

    /// Close both endpoints.
    pub async fn close(&self) {
        self.source.close().await;
        self.sink.close().await;
    }
}

/// Open each endpoint independently and report reachability.
///
/// Neither endpoint is modified: the destination gets `SELECT 1` only.
pub async fn health_check(config: &Config) -> HealthCheckResult {
    let started = Instant::now();
    let (source_connected, source_error) = match OdbcSource::open(&config.source).await {
        Ok(source) => {
            source.close().await;
            (true, None)
        }
        Err(e) => (false, Some(e.to_string())),
    };
    let source_latency_ms = elapsed_ms(started);

    let started = Instant::now();
    let (target_connected, target_error) =
        match PgSink::open(&config.target, config.sync.chunk_size).await {
            Ok(sink) => {
                sink.close().await;
                (true, None)
            }
            Err(e) => (false, Some(e.to_string())),
        };
    let target_latency_ms = elapsed_ms(started);

    HealthCheckResult {
        source_connected,
        source_latency_ms,
        source_error,
        target_connected,
        target_latency_ms,
        target_error,
        healthy: source_connected && target_connected,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, ColumnType, NormalizedRowset, Rowset, SqlValue};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemorySource {
        tables: HashMap<String, Rowset>,
        closed: Arc<AtomicBool>,
    }

    impl MemorySource {
        fn with_table(mut self, name: &str, headers: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
            let columns = headers
                .iter()
                .map(|h| Column::new(*h, ColumnType::Text))
                .collect();
            self.tables.insert(name.to_string(), Rowset::new(columns, rows));
            self
        }

        fn lookup(&self, table: &str) -> Result<&Rowset> {
            self.tables
                .get(table)
                .ok_or_else(|| SyncError::extraction(table, "table not found"))
        }
    }

    #[async_trait]
    impl TableSource for MemorySource {
        async fn extract(&self, table: &str) -> Result<Rowset> {
            self.lookup(table).cloned()
        }

        async fn extract_schema_only(&self, table: &str) -> Result<Rowset> {
            Ok(Rowset::schema_only(self.lookup(table)?.columns.clone()))
        }

        async fn row_count(&self, table: &str) -> Result<i64> {
            Ok(self.lookup(table)?.row_count() as i64)
        }

        fn describe(&self) -> String {
            "memory source".to_string()
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    type SinkTables = Arc<Mutex<HashMap<String, NormalizedRowset>>>;

    #[derive(Default)]
    struct MemorySink {
        tables: SinkTables,
        fail_on: HashSet<String>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl TableSink for MemorySink {
        async fn replace_table(&self, table: &str, rowset: NormalizedRowset) -> Result<u64> {
            if self.fail_on.contains(table) {
                return Err(SyncError::load(table, "permission denied"));
            }
            let rows = rowset.row_count() as u64;
            self.tables
                .lock()
                .unwrap()
                .insert(table.to_string(), rowset);
            Ok(rows)
        }

        async fn row_count(&self, table: &str) -> Result<Option<i64>> {
            Ok(self
                .tables
                .lock()
                .unwrap()
                .get(table)
                .map(|r| r.row_count() as i64))
        }

        fn describe(&self) -> String {
            "memory sink".to_string()
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    /// Serves fetched text through the same typed conversion as the ODBC source.
    struct TextSource {
        columns: Vec<Column>,
        rows: Vec<Vec<Option<String>>>,
    }

    #[async_trait]
    impl TableSource for TextSource {
        async fn extract(&self, table: &str) -> Result<Rowset> {
            crate::source::odbc::rowset_from_text(table, self.columns.clone(), self.rows.clone())
        }

        async fn extract_schema_only(&self, _table: &str) -> Result<Rowset> {
            Ok(Rowset::schema_only(self.columns.clone()))
        }

        async fn row_count(&self, _table: &str) -> Result<i64> {
            Ok(self.rows.len() as i64)
        }

        fn describe(&self) -> String {
            "text source".to_string()
        }

        async fn close(&self) {}
    }

    fn row(values: &[&str]) -> Vec<SqlValue> {
        values.iter().map(|v| SqlValue::from(*v)).collect()
    }

    fn sample_source() -> MemorySource {
        MemorySource::default()
            .with_table(
                "Invoice",
                &["TxnID", "CustomerRef_FullName", "Amount"],
                vec![row(&["1", "Acme", "10.00"]), row(&["2", "Globex", "5.50"])],
            )
            .with_table("Customer", &["ListID", "FullName"], vec![row(&["80000001", "Acme"])])
            .with_table("Bill", &["TxnID", "VendorRef_FullName"], vec![])
    }

    fn orchestrator(source: MemorySource, sink: MemorySink, policy: EmptyTablePolicy) -> Orchestrator {
        Orchestrator::with_endpoints(Box::new(source), Box::new(sink), policy)
    }

    #[tokio::test]
    async fn test_every_entry_reaches_one_terminal_state() {
        let catalog = TableCatalog::new(["Invoice", "Missing", "Customer", "Bill"]);
        let summary = orchestrator(
            sample_source(),
            MemorySink::default(),
            EmptyTablePolicy::CreateSchemaOnly,
        )
        .run(&catalog, None)
        .await;

        assert_eq!(summary.tables_total, 4);
        assert_eq!(summary.tables_attempted, 4);
        assert_eq!(summary.tables.len(), 4);
        assert_eq!(summary.tables_succeeded + summary.tables_failed, 4);
        assert_eq!(summary.tables_succeeded, 3);
        assert_eq!(summary.failed_table_names(), vec!["Missing".to_string()]);
        assert_eq!(summary.rows_loaded, 3);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_destination_headers_are_lowercase() {
        let sink = MemorySink::default();
        let tables = sink.tables.clone();
        let catalog = TableCatalog::new(["Invoice"]);

        orchestrator(sample_source(), sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;

        let tables = tables.lock().unwrap();
        let invoice = tables.get("invoice").expect("destination table is lowercase");
        assert_eq!(
            invoice.column_names(),
            vec!["txnid", "customerref_fullname", "amount"]
        );
        assert_eq!(invoice.rows()[0][1], SqlValue::from("Acme"));
    }

    #[tokio::test]
    async fn test_empty_table_creates_schema_only() {
        let sink = MemorySink::default();
        let tables = sink.tables.clone();
        let catalog = TableCatalog::new(["Bill"]);

        let summary = orchestrator(sample_source(), sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;

        assert_eq!(summary.tables[0].load, TableLoad::SchemaOnly);
        assert!(summary.tables[0].is_success());

        let tables = tables.lock().unwrap();
        let bill = tables.get("bill").unwrap();
        assert_eq!(bill.row_count(), 0);
        assert_eq!(bill.column_names(), vec!["txnid", "vendorref_fullname"]);
    }

    #[tokio::test]
    async fn test_skip_policy_leaves_destination_untouched() {
        let sink = MemorySink::default();
        let tables = sink.tables.clone();
        let catalog = TableCatalog::new(["Bill", "Customer"]);

        let summary = orchestrator(sample_source(), sink, EmptyTablePolicy::Skip)
            .run(&catalog, None)
            .await;

        assert_eq!(summary.tables_succeeded, 2);
        assert_eq!(summary.tables[0].load, TableLoad::SkippedEmpty);
        let tables = tables.lock().unwrap();
        assert!(!tables.contains_key("bill"));
        assert!(tables.contains_key("customer"));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let sink_tables: SinkTables = Arc::default();
        let catalog = TableCatalog::new(["Invoice", "Customer", "Bill"]);

        let first_sink = MemorySink {
            tables: sink_tables.clone(),
            ..MemorySink::default()
        };
        orchestrator(sample_source(), first_sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;
        let after_first = sink_tables.lock().unwrap().clone();

        let second_sink = MemorySink {
            tables: sink_tables.clone(),
            ..MemorySink::default()
        };
        orchestrator(sample_source(), second_sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;
        let after_second = sink_tables.lock().unwrap().clone();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_extraction_failure_does_not_stop_later_tables() {
        let sink = MemorySink::default();
        let tables = sink.tables.clone();
        let catalog = TableCatalog::new(["DoesNotExist", "Customer"]);

        let summary = orchestrator(sample_source(), sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;

        assert_eq!(summary.tables[0].status, TableStatus::Failed);
        assert_eq!(summary.tables[0].load, TableLoad::NotLoaded);
        assert!(summary.tables[0]
            .error
            .as_deref()
            .unwrap()
            .contains("DoesNotExist"));
        assert_eq!(summary.tables[1].status, TableStatus::Succeeded);
        assert!(tables.lock().unwrap().contains_key("customer"));
    }

    #[tokio::test]
    async fn test_load_failure_is_isolated() {
        let sink = MemorySink {
            fail_on: HashSet::from(["invoice".to_string()]),
            ..MemorySink::default()
        };
        let tables = sink.tables.clone();
        let catalog = TableCatalog::new(["Invoice", "Customer"]);

        let summary = orchestrator(sample_source(), sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;

        assert_eq!(summary.tables_failed, 1);
        assert!(summary.failed_tables[0].error.contains("permission denied"));
        assert_eq!(summary.tables_succeeded, 1);
        assert!(tables.lock().unwrap().contains_key("customer"));
    }

    #[tokio::test]
    async fn test_type_conflict_fails_table_without_writing() {
        let source = TextSource {
            columns: vec![
                Column::new("TxnLineID", ColumnType::Text),
                Column::new("Quantity", ColumnType::Integer),
            ],
            rows: vec![
                vec![Some("L1".to_string()), Some("3".to_string())],
                vec![Some("L2".to_string()), Some("12.5".to_string())],
            ],
        };
        let sink = MemorySink::default();
        let tables = sink.tables.clone();

        let summary = Orchestrator::with_endpoints(
            Box::new(source),
            Box::new(sink),
            EmptyTablePolicy::CreateSchemaOnly,
        )
        .run(&TableCatalog::new(["InvoiceLine"]), None)
        .await;

        assert_eq!(summary.tables_failed, 1);
        assert_eq!(summary.tables[0].status, TableStatus::Failed);
        assert_eq!(summary.tables[0].load, TableLoad::NotLoaded);
        let error = summary.tables[0].error.as_deref().unwrap();
        assert!(error.contains("cannot parse"), "{}", error);
        assert!(error.contains("Quantity"), "{}", error);
        assert_eq!(summary.rows_loaded, 0);
        assert!(tables.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_schema_only_without_columns_fails() {
        let source = sample_source().with_table("Headless", &[], vec![]);
        let sink = MemorySink::default();
        let tables = sink.tables.clone();
        let catalog = TableCatalog::new(["Headless", "Customer"]);

        let summary = orchestrator(source, sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, None)
            .await;

        assert_eq!(summary.tables[0].status, TableStatus::Failed);
        assert!(summary.tables[0]
            .error
            .as_deref()
            .unwrap()
            .contains("no columns"));
        assert_eq!(summary.tables[1].status, TableStatus::Succeeded);

        let tables = tables.lock().unwrap();
        assert!(!tables.contains_key("headless"));
        assert!(tables.contains_key("customer"));
    }

    #[tokio::test]
    async fn test_duplicate_entries_processed_independently() {
        let catalog = TableCatalog::new(["Customer", "Customer"]);
        let summary = orchestrator(
            sample_source(),
            MemorySink::default(),
            EmptyTablePolicy::CreateSchemaOnly,
        )
        .run(&catalog, None)
        .await;

        assert_eq!(summary.tables_attempted, 2);
        assert_eq!(summary.tables_succeeded, 2);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let source = sample_source();
        let source_closed = source.closed.clone();
        let summary = orchestrator(source, MemorySink::default(), EmptyTablePolicy::CreateSchemaOnly)
            .run(&TableCatalog::default(), None)
            .await;

        assert_eq!(summary.tables_attempted, 0);
        assert_eq!(summary.tables_succeeded, 0);
        assert_eq!(summary.tables_failed, 0);
        assert!(source_closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_attempts_nothing() {
        let source = sample_source();
        let sink = MemorySink::default();
        let source_closed = source.closed.clone();
        let sink_closed = sink.closed.clone();
        let tables = sink.tables.clone();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let catalog = TableCatalog::new(["Invoice", "Customer"]);
        let summary = orchestrator(source, sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&catalog, Some(cancel))
            .await;

        assert!(summary.cancelled);
        assert_eq!(summary.tables_total, 2);
        assert_eq!(summary.tables_attempted, 0);
        assert!(tables.lock().unwrap().is_empty());
        assert!(source_closed.load(Ordering::SeqCst));
        assert!(sink_closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_endpoints_closed_after_run() {
        let source = sample_source();
        let sink = MemorySink::default();
        let source_closed = source.closed.clone();
        let sink_closed = sink.closed.clone();

        orchestrator(source, sink, EmptyTablePolicy::CreateSchemaOnly)
            .run(&TableCatalog::new(["Missing"]), None)
            .await;

        assert!(source_closed.load(Ordering::SeqCst));
        assert!(sink_closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_progress_updates() {
        let (tx, mut rx) = mpsc::channel(16);
        let catalog = TableCatalog::new(["Invoice", "Missing", "Bill"]);

        orchestrator(
            sample_source(),
            MemorySink::default(),
            EmptyTablePolicy::CreateSchemaOnly,
        )
        .with_progress(tx)
        .run(&catalog, None)
        .await;

        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].index, 1);
        assert_eq!(updates[2].total, 3);
        assert_eq!(
            updates[0].outcome.progress_line(updates[0].index, updates[0].total),
            "[1/3] ✅ Success: Invoice (2 rows)"
        );
        assert_eq!(updates[1].outcome.status, TableStatus::Failed);
    }

    #[tokio::test]
    async fn test_validate_compares_row_counts() {
        let sink = MemorySink::default();
        let tables = sink.tables.clone();
        let orch = orchestrator(sample_source(), sink, EmptyTablePolicy::CreateSchemaOnly);

        let customer = normalize(sample_source().tables["Customer"].clone());
        tables.lock().unwrap().insert("customer".to_string(), customer);

        let checks = orch
            .validate(&TableCatalog::new(["Customer", "Invoice", "Missing"]))
            .await;

        assert!(checks[0].matches);
        assert_eq!(checks[0].source_rows, Some(1));

        assert!(!checks[1].matches);
        assert_eq!(checks[1].source_rows, Some(2));
        assert_eq!(checks[1].destination_rows, None);

        assert!(!checks[2].matches);
        assert!(checks[2].error.is_some());
    }
}
