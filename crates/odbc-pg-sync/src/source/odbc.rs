//! ODBC source connector.
//!
//! Reads whole tables through a DSN registered with the ODBC driver manager
//! (for QuickBooks, the CData QuickBooks driver). Values are fetched as text
//! in row batches and converted to [`SqlValue`] using the column type the
//! driver reports.
//!
//! One connection is opened per run. ODBC calls are blocking and are
//! serialized behind a mutex.

use std::sync::OnceLock;

use async_trait::async_trait;
use odbc_api::buffers::TextRowSet;
use odbc_api::{Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::identifier::quote_ident;
use crate::core::{Column, ColumnType, Rowset, SqlValue, TableSource};
use crate::error::{Result, SyncError};

/// Process-wide ODBC environment. Connections borrow it for `'static`.
static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

fn odbc_environment() -> Result<&'static Environment> {
    if let Some(env) = ODBC_ENV.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        SyncError::connection(
            "ODBC environment",
            format!(
                "{}. Make sure an ODBC driver manager (unixODBC or the Windows ODBC \
                 administrator) is installed",
                e
            ),
        )
    })?;
    Ok(ODBC_ENV.get_or_init(|| env))
}

/// `SELECT * FROM "<table>"`.
pub fn select_all_sql(table: &str) -> Result<String> {
    Ok(format!("SELECT * FROM {}", quote_ident(table)?))
}

/// The full-table query with an always-false predicate: returns column
/// metadata and no rows.
pub fn schema_only_sql(table: &str) -> Result<String> {
    Ok(format!("{} WHERE 1=0", select_all_sql(table)?))
}

pub fn count_sql(table: &str) -> Result<String> {
    Ok(format!("SELECT COUNT(*) FROM {}", quote_ident(table)?))
}

/// ODBC-backed [`TableSource`].
pub struct OdbcSource {
    conn: Mutex<Option<Connection<'static>>>,
    name: String,
    fetch_batch_size: usize,
    max_text_len: usize,
}

impl OdbcSource {
    /// Open a session to the configured DSN.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connection`] if the ODBC environment cannot be
    /// created, the DSN is not registered, or the credentials are rejected.
    pub async fn open(config: &SourceConfig) -> Result<Self> {
        let name = config.describe();
        let env = odbc_environment()?;

        debug!("Opening ODBC connection to {}", name);
        let conn = env
            .connect_with_connection_string(&config.connection_string(), ConnectionOptions::default())
            .map_err(|e| SyncError::connection(name.clone(), e))?;

        info!("Connected to {}", name);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            name,
            fetch_batch_size: config.fetch_batch_size,
            max_text_len: config.max_text_len,
        })
    }

    /// Run `f` against the open connection.
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection<'static>) -> Result<T>,
    {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| SyncError::connection(self.name.clone(), "connection already closed"))?;
        f(conn)
    }

    /// Names of all tables the driver exposes, sorted alphabetically.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let batch_size = self.fetch_batch_size;
        let max_text_len = self.max_text_len;
        let resource = self.name.clone();

        let mut tables = self
            .with_connection(move |conn| {
                let cursor = conn
                    .tables("", "", "", "TABLE")
                    .map_err(|e| SyncError::connection(resource.clone(), e))?;
                let rows = read_text_rows(cursor, batch_size, max_text_len, None)
                    .map_err(|e| SyncError::connection(resource, e))?;
                // TABLE_NAME is the third column of the SQLTables result set.
                Ok(rows
                    .into_iter()
                    .filter_map(|row| row.into_iter().nth(2).flatten())
                    .filter(|name| !name.trim().is_empty())
                    .collect::<Vec<_>>())
            })
            .await?;

        tables.sort();
        info!("Found {} tables in {}", tables.len(), self.name);
        Ok(tables)
    }

    /// At most `limit` rows of `table`.
    pub async fn sample(&self, table: &str, limit: usize) -> Result<Rowset> {
        let sql = select_all_sql(table).map_err(|e| SyncError::extraction(table, e))?;
        let batch_size = self.fetch_batch_size.min(limit.max(1));
        let max_text_len = self.max_text_len;
        self.with_connection(|conn| {
            query_rowset(conn, table, &sql, batch_size, max_text_len, Some(limit))
        })
        .await
    }

    async fn query(&self, table: &str, sql: String) -> Result<Rowset> {
        debug!("{}: {}", table, sql);
        let batch_size = self.fetch_batch_size;
        let max_text_len = self.max_text_len;
        self.with_connection(|conn| query_rowset(conn, table, &sql, batch_size, max_text_len, None))
            .await
    }
}

#[async_trait]
impl TableSource for OdbcSource {
    async fn extract(&self, table: &str) -> Result<Rowset> {
        let sql = select_all_sql(table).map_err(|e| SyncError::extraction(table, e))?;
        let rowset = self.query(table, sql).await?;
        debug!(
            "Extracted {} rows x {} columns from {}",
            rowset.row_count(),
            rowset.columns.len(),
            table
        );
        Ok(rowset)
    }

    async fn extract_schema_only(&self, table: &str) -> Result<Rowset> {
        let sql = schema_only_sql(table).map_err(|e| SyncError::extraction(table, e))?;
        let rowset = self.query(table, sql).await?;
        Ok(Rowset::schema_only(rowset.columns))
    }

    async fn row_count(&self, table: &str) -> Result<i64> {
        let sql = count_sql(table).map_err(|e| SyncError::extraction(table, e))?;
        let max_text_len = self.max_text_len;
        self.with_connection(|conn| {
            let cursor = conn
                .execute(&sql, ())
                .map_err(|e| SyncError::extraction(table, e))?
                .ok_or_else(|| SyncError::extraction(table, "COUNT(*) returned no result set"))?;
            let rows = read_text_rows(cursor, 1, max_text_len, Some(1))
                .map_err(|e| SyncError::extraction(table, e))?;
            rows.first()
                .and_then(|r| r.first())
                .and_then(|v| v.as_deref())
                .and_then(|s| s.trim().parse::<i64>().ok())
                .ok_or_else(|| SyncError::extraction(table, "COUNT(*) returned no value"))
        })
        .await
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            debug!("Closed {}", self.name);
        }
    }
}

/// Failure while fetching text cells.
#[derive(Debug, Error)]
enum FetchError {
    #[error(transparent)]
    Odbc(#[from] odbc_api::Error),

    #[error(
        "row {row}, column {column}: value is not valid UTF-8; configure the DSN to return \
         UTF-8 text"
    )]
    InvalidUtf8 { row: usize, column: usize },
}

/// Execute `sql` and collect its result set, converting cells by column type.
fn query_rowset(
    conn: &Connection<'_>,
    table: &str,
    sql: &str,
    batch_size: usize,
    max_text_len: usize,
    limit: Option<usize>,
) -> Result<Rowset> {
    let fetch = || -> std::result::Result<_, FetchError> {
        let Some(mut cursor) = conn.execute(sql, ())? else {
            return Ok((Vec::new(), Vec::new()));
        };
        let columns = column_metadata(&mut cursor)?;
        if columns.is_empty() {
            return Ok((columns, Vec::new()));
        }
        let rows = read_text_rows(cursor, batch_size, max_text_len, limit)?;
        Ok((columns, rows))
    };

    let (columns, rows) = fetch().map_err(|e| SyncError::extraction(table, e))?;
    rowset_from_text(table, columns, rows)
}

/// Convert fetched text rows by column type.
///
/// A value that does not parse as its column type fails the whole table with
/// a load error naming the column; nothing is written for that table.
pub fn rowset_from_text(
    table: &str,
    columns: Vec<Column>,
    rows: Vec<Vec<Option<String>>>,
) -> Result<Rowset> {
    let rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&columns)
                .map(|(text, column)| {
                    convert_text(text, column.data_type)
                        .map_err(|e| SyncError::load(table, format!("column {}: {}", column.name, e)))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Rowset::new(columns, rows))
}

fn column_metadata(
    cursor: &mut impl ResultSetMetadata,
) -> std::result::Result<Vec<Column>, odbc_api::Error> {
    let num_cols = cursor.num_result_cols()?.max(0) as u16;
    let mut columns = Vec::with_capacity(num_cols as usize);
    for col in 1..=num_cols {
        let name = cursor.col_name(col)?;
        let data_type = column_type_from_odbc(cursor.col_data_type(col)?);
        columns.push(Column::new(name, data_type));
    }
    Ok(columns)
}

/// Fetch every row of `cursor` as optional text, up to `limit` rows.
///
/// A value longer than its buffer is an error rather than a truncated cell.
fn read_text_rows<C: Cursor>(
    mut cursor: C,
    batch_size: usize,
    max_text_len: usize,
    limit: Option<usize>,
) -> std::result::Result<Vec<Vec<Option<String>>>, FetchError> {
    let num_cols = cursor.num_result_cols()?.max(0) as usize;
    let mut rows = Vec::new();
    if num_cols == 0 {
        return Ok(rows);
    }

    let mut buffers = TextRowSet::for_cursor(batch_size, &mut cursor, Some(max_text_len))?;
    let mut row_cursor = cursor.bind_buffer(&mut buffers)?;

    'fetch: while let Some(batch) = row_cursor.fetch_with_truncation_check(true)? {
        for row_idx in 0..batch.num_rows() {
            if limit.is_some_and(|max| rows.len() >= max) {
                break 'fetch;
            }
            let row_number = rows.len() + 1;
            let row = (0..num_cols)
                .map(|col| {
                    batch
                        .at(col, row_idx)
                        .map(|bytes| cell_text(bytes, row_number, col + 1))
                        .transpose()
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Decode one cell. `row` and `column` are 1-based and only used for the error.
fn cell_text(bytes: &[u8], row: usize, column: usize) -> std::result::Result<String, FetchError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| FetchError::InvalidUtf8 { row, column })
}

/// Map the driver-reported SQL type to a [`ColumnType`].
fn column_type_from_odbc(data_type: DataType) -> ColumnType {
    match data_type {
        DataType::Bit => ColumnType::Bool,
        DataType::TinyInt | DataType::SmallInt => ColumnType::SmallInt,
        DataType::Integer => ColumnType::Integer,
        DataType::BigInt => ColumnType::BigInt,
        DataType::Real => ColumnType::Real,
        DataType::Float { .. } | DataType::Double => ColumnType::Double,
        DataType::Numeric { precision, scale } | DataType::Decimal { precision, scale } => {
            ColumnType::Numeric {
                precision: precision as u32,
                scale: scale.max(0) as u32,
            }
        }
        DataType::Char { .. }
        | DataType::WChar { .. }
        | DataType::Varchar { .. }
        | DataType::WVarchar { .. }
        | DataType::LongVarchar { .. } => ColumnType::Text,
        DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. } => {
            ColumnType::Binary
        }
        DataType::Date => ColumnType::Date,
        DataType::Time { .. } => ColumnType::Time,
        DataType::Timestamp { .. } => ColumnType::Timestamp,
        _ => ColumnType::Unknown,
    }
}

/// A source value that does not parse as its column's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {value:?} as {data_type:?}")]
pub struct ConversionError {
    pub value: String,
    pub data_type: ColumnType,
}

/// Convert a text cell to a [`SqlValue`] for its column type.
pub fn convert_text(
    text: Option<String>,
    data_type: ColumnType,
) -> std::result::Result<SqlValue, ConversionError> {
    let Some(s) = text else {
        return Ok(SqlValue::Null);
    };

    let trimmed = s.trim();
    let value = match data_type {
        ColumnType::Bool => match trimmed.to_lowercase().as_str() {
            "1" | "true" | "t" | "yes" => Some(SqlValue::Bool(true)),
            "0" | "false" | "f" | "no" => Some(SqlValue::Bool(false)),
            _ => None,
        },
        ColumnType::SmallInt => trimmed.parse::<i16>().ok().map(SqlValue::I16),
        ColumnType::Integer => trimmed.parse::<i32>().ok().map(SqlValue::I32),
        ColumnType::BigInt => trimmed.parse::<i64>().ok().map(SqlValue::I64),
        ColumnType::Real => trimmed.parse::<f32>().ok().map(SqlValue::F32),
        ColumnType::Double => trimmed.parse::<f64>().ok().map(SqlValue::F64),
        ColumnType::Numeric { .. } => {
            // Currency columns may come back formatted.
            let cleaned = trimmed.replace(['$', ','], "");
            cleaned
                .parse::<rust_decimal::Decimal>()
                .or_else(|_| rust_decimal::Decimal::from_scientific(&cleaned))
                .ok()
                .map(SqlValue::Decimal)
        }
        ColumnType::Date => chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| {
                // Some drivers report dates with a midnight time part.
                chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
                    .map(|dt| dt.date())
            })
            .ok()
            .map(SqlValue::Date),
        ColumnType::Time => chrono::NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
            .ok()
            .map(SqlValue::Time),
        ColumnType::Timestamp => parse_timestamp(trimmed).map(SqlValue::DateTime),
        ColumnType::Binary => {
            // Text buffers hold binary columns as hex digits.
            let hex_str = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            hex::decode(hex_str).ok().map(SqlValue::Bytes)
        }
        ColumnType::Text | ColumnType::Unknown => return Ok(SqlValue::String(s)),
    };

    value.ok_or(ConversionError {
        value: s,
        data_type,
    })
}

fn parse_timestamp(s: &str) -> Option<chrono::NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
