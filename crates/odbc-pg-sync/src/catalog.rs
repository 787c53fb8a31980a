//! Table list file: the catalog of tables to sync.
//!
//! The file is newline-delimited text, one table name per line. It is usually
//! produced by `list-tables`, which writes a two-line human-readable header:
//!
//! ```text
//! List of Tables in QuickBooks Data
//! ========================================
//! Account
//! Bill
//! ```
//!
//! Lines starting with one of the configured header prefixes are skipped,
//! blank lines are ignored, and surrounding whitespace is trimmed.

use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SyncError};

/// Header prefixes recognized when none are configured.
pub const DEFAULT_HEADER_PREFIXES: &[&str] = &["List of", "=="];

/// Width of the `=` rule written under the header line.
const HEADER_RULE_WIDTH: usize = 40;

/// Ordered list of table names for one run.
///
/// Duplicates are kept; each occurrence is processed on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCatalog {
    tables: Vec<String>,
}

impl TableCatalog {
    /// Build a catalog from names, dropping entries that are blank after trimming.
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tables: tables
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Read the table list file.
    ///
    /// A missing or unreadable file is a [`SyncError::Catalog`]; there is no
    /// fallback catalog.
    pub fn load<P: AsRef<Path>, S: AsRef<str>>(path: P, header_prefixes: &[S]) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SyncError::catalog(
                path,
                "file not found; create it with `list-tables` or point sync.table_list at it",
            ));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::catalog(path, e.to_string()))?;
        let catalog = Self::parse(&content, header_prefixes);

        info!("Loaded {} tables from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse table list content.
    pub fn parse<S: AsRef<str>>(content: &str, header_prefixes: &[S]) -> Self {
        let mut tables = Vec::new();
        for line in content.lines() {
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if header_prefixes
                .iter()
                .any(|p| !p.as_ref().is_empty() && name.starts_with(p.as_ref()))
            {
                debug!("Skipping header line: {}", name);
                continue;
            }
            tables.push(name.to_string());
        }
        Self { tables }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }
}

/// Render a table list file with its header.
pub fn render_catalog(source_name: &str, tables: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "List of Tables in {}", source_name);
    let _ = writeln!(out, "{}", "=".repeat(HEADER_RULE_WIDTH));
    for table in tables {
        let _ = writeln!(out, "{}", table);
    }
    out
}

/// Write a table list file that [`TableCatalog::load`] reads back with the
/// default header prefixes.
pub fn write_catalog<P: AsRef<Path>>(path: P, source_name: &str, tables: &[String]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_catalog(source_name, tables))?;
    info!("Wrote {} table names to {}", tables.len(), path.display());
    Ok(())
}
