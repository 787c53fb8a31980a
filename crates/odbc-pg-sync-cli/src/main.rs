//! odbc-pg-sync CLI - full-refresh table sync from an ODBC DSN into PostgreSQL.

use clap::{Parser, Subcommand};
use odbc_pg_sync::{
    health_check, write_catalog, Config, EmptyTablePolicy, OdbcSource, Orchestrator,
    ProgressUpdate, RunSummary, SyncError, TableCatalog, TableSource,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "odbc-pg-sync")]
#[command(about = "Full-refresh sync of ODBC (QuickBooks) tables into PostgreSQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Build configuration from ODBC_PG_SYNC_* environment variables instead of a file
    #[arg(long)]
    from_env: bool,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace every table in the table list with a fresh copy from the source
    Run {
        /// Override the table list file
        #[arg(long)]
        table_list: Option<PathBuf>,

        /// What to do with empty source tables: create_schema_only or skip
        #[arg(long)]
        on_empty_table: Option<EmptyTablePolicy>,

        /// Exit non-zero when any table fails
        #[arg(long)]
        strict: bool,
    },

    /// Write the source's table names to a table list file
    ListTables {
        /// Output file (defaults to the configured table list)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the first rows of one source table
    Probe {
        /// Source table name
        #[arg(long, short)]
        table: String,

        /// Number of rows to fetch
        #[arg(long, default_value = "1")]
        rows: usize,
    },

    /// Compare source and destination row counts for every listed table
    Validate {
        /// Override the table list file
        #[arg(long)]
        table_list: Option<PathBuf>,
    },

    /// Test connectivity to both endpoints
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SyncError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = if cli.from_env {
        Config::from_env()?
    } else {
        let config = Config::load(&cli.config)?.with_env_overrides()?;
        info!("Loaded configuration from {:?}", cli.config);
        config
    };

    let cancel_token = setup_signal_handler();

    match cli.command {
        Commands::Run {
            table_list,
            on_empty_table,
            strict,
        } => {
            if let Some(path) = table_list {
                config.sync.table_list = path;
            }
            if let Some(policy) = on_empty_table {
                config.sync.on_empty_table = policy;
            }

            let catalog = load_catalog(&config)?;
            if catalog.is_empty() {
                warn!("Table list {:?} contains no tables", config.sync.table_list);
                print_summary(&RunSummary::empty(), cli.output_json)?;
                return Ok(());
            }
            info!(
                "Syncing {} tables (empty tables: {})",
                catalog.len(),
                config.sync.on_empty_table
            );

            let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(64);
            let quiet = cli.output_json;
            let printer = tokio::spawn(async move {
                while let Some(update) = rx.recv().await {
                    if !quiet {
                        println!("{}", update.outcome.progress_line(update.index, update.total));
                    }
                }
            });

            let orchestrator = Orchestrator::connect(&config).await?.with_progress(tx);
            let summary = orchestrator.run(&catalog, Some(cancel_token)).await;
            // The orchestrator owned the only sender, so the printer drains and exits.
            let _ = printer.await;

            print_summary(&summary, cli.output_json)?;

            if summary.cancelled {
                return Err(SyncError::Cancelled);
            }
            if strict {
                summary.into_strict_result()?;
            }
        }

        Commands::ListTables { output } => {
            let output = output.unwrap_or_else(|| config.sync.table_list.clone());

            let source = OdbcSource::open(&config.source).await?;
            let listed = source.list_tables().await;
            source.close().await;
            let tables = listed?;

            write_catalog(&output, &config.source.describe(), &tables)?;

            if cli.output_json {
                let json = serde_json::json!({
                    "output": output,
                    "tables": tables,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("Wrote {} tables to {}", tables.len(), output.display());
            }
        }

        Commands::Probe { table, rows } => {
            let source = OdbcSource::open(&config.source).await?;
            let sampled = source.sample(&table, rows).await;
            source.close().await;
            let rowset = sampled?;

            if cli.output_json {
                let rows: Vec<Vec<String>> = rowset
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|v| v.to_string()).collect())
                    .collect();
                let json = serde_json::json!({
                    "table": table,
                    "columns": rowset.columns,
                    "rows": rows,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{} ({} columns)", table, rowset.columns.len());
                for column in &rowset.columns {
                    println!("  {} {:?}", column.name, column.data_type);
                }
                if rowset.rows.is_empty() {
                    println!("\n  (no rows)");
                }
                for (i, row) in rowset.rows.iter().enumerate() {
                    println!("\nRow {}:", i + 1);
                    for (column, value) in rowset.columns.iter().zip(row) {
                        println!("  {} = {}", column.name, value);
                    }
                }
            }
        }

        Commands::Validate { table_list } => {
            if let Some(path) = table_list {
                config.sync.table_list = path;
            }
            let catalog = load_catalog(&config)?;

            let orchestrator = Orchestrator::connect(&config).await?;
            let checks = orchestrator.validate(&catalog).await;
            orchestrator.close().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&checks)?);
            } else {
                println!("Row Count Validation:");
                for check in &checks {
                    println!(
                        "  {} {}: source={} destination={}",
                        if check.matches { "OK      " } else { "MISMATCH" },
                        check.table,
                        format_count(check.source_rows),
                        format_count(check.destination_rows)
                    );
                    if let Some(ref err) = check.error {
                        println!("    Error: {}", err);
                    }
                }
            }

            let failed: Vec<String> = checks
                .iter()
                .filter(|c| !c.matches)
                .map(|c| c.table.clone())
                .collect();
            if !failed.is_empty() {
                return Err(SyncError::TablesFailed { failed });
            }
        }

        Commands::HealthCheck => {
            let result = health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source ({}): {} ({}ms)",
                    config.source.describe(),
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target ({}): {} ({}ms)",
                    config.target.describe(),
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(SyncError::connection("health check", "one or more endpoints unreachable"));
            }
        }
    }

    Ok(())
}

fn load_catalog(config: &Config) -> Result<TableCatalog, SyncError> {
    TableCatalog::load(&config.sync.table_list, &config.sync.header_prefixes)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<(), SyncError> {
    if json {
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    let status_msg = if summary.cancelled {
        "Sync cancelled!"
    } else {
        "Sync completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", summary.run_id);
    println!("  Duration: {:.2}s", summary.duration_seconds);
    println!("  Attempted: {}/{}", summary.tables_attempted, summary.tables_total);
    println!("  Succeeded: {}", summary.tables_succeeded);
    println!("  Failed: {}", summary.tables_failed);
    println!("  Rows: {}", summary.rows_loaded);
    if !summary.failed_tables.is_empty() {
        println!("  Failed tables: {:?}", summary.failed_table_names());
    }
    Ok(())
}

fn format_count(count: Option<i64>) -> String {
    count.map_or_else(|| "-".to_string(), |n| n.to_string())
}

/// Logs go to stderr so `--output-json` keeps stdout parseable.
fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Cancel the returned token on SIGINT or SIGTERM.
///
/// The table in flight finishes; no further tables are started.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, label) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to install {} handler: {}", label, e);
                    return;
                }
            };
            stream.recv().await;
            eprintln!(
                "\nReceived {}. Finishing the current table, then stopping...",
                label
            );
            token.cancel();
        });
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            return;
        }
        eprintln!("\nReceived Ctrl-C. Finishing the current table, then stopping...");
        token.cancel();
    });

    cancel_token
}
