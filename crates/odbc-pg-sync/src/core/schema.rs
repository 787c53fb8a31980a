//! Column metadata and the per-table rowset extracted from the source.

use serde::{Deserialize, Serialize};

use super::value::SqlValue;

/// Column type class as reported by the ODBC driver.
///
/// This is the only type information the sync uses: destination column types
/// are inferred from it, never configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ColumnType {
    Bool,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric { precision: u32, scale: u32 },
    Text,
    Binary,
    Date,
    Time,
    Timestamp,
    Unknown,
}

/// Column definition. Destination columns are always nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, case as reported by the source (or lowercased once normalized).
    pub name: String,

    /// Driver-reported type.
    pub data_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Result of extracting one source table: header plus rows.
///
/// Every row has exactly `columns.len()` values in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rowset {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Rowset {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// A rowset that carries only column metadata.
    pub fn schema_only(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A [`Rowset`] whose header entries are lowercase.
///
/// Only [`crate::normalize::normalize`] builds one, so holding a value of this
/// type means the header has been canonicalized. Header length, column order,
/// and row contents are those of the original rowset.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRowset {
    inner: Rowset,
}

impl NormalizedRowset {
    pub(crate) fn from_rowset(inner: Rowset) -> Self {
        Self { inner }
    }

    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.inner.rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.inner.column_names()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    /// Consume into header and rows for writing.
    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<SqlValue>>) {
        (self.inner.columns, self.inner.rows)
    }
}
