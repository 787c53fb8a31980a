//! PostgreSQL sink writer.
//!
//! Each table is replaced inside one transaction: drop, create from the
//! normalized header, then `COPY ... FROM STDIN` in text format. A failure at
//! any step rolls back, leaving the previous copy of the table in place.
//! The drop does not cascade, so a table that views or foreign keys depend on
//! fails instead of taking its dependents with it.

pub mod tls;

use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use futures::SinkExt;
use tokio_postgres::{Config as PgConfig, NoTls};
use tracing::{debug, info};

use crate::config::TargetConfig;
use crate::core::identifier::{qualify_pg, quote_pg_ident};
use crate::core::{Column, NormalizedRowset, SqlValue, TableSink};
use crate::error::{Result, SyncError};
use crate::typemap::column_type_to_postgres;

use self::tls::{make_tls_connect, SslMode};

/// Initial capacity of the COPY buffer.
const COPY_BUFFER_BYTES: usize = 1024 * 1024;

/// PostgreSQL-backed [`TableSink`].
pub struct PgSink {
    pool: Pool,
    schema: String,
    chunk_size: usize,
    name: String,
}

/// Connection settings for tokio-postgres, built field by field so hosts
/// (including IPv6 literals) and credentials need no URI escaping.
pub fn pg_config(config: &TargetConfig) -> PgConfig {
    let mut pg_config = PgConfig::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .dbname(&config.database)
        .user(&config.user)
        .password(config.password.as_bytes())
        .application_name("odbc-pg-sync")
        .keepalives(true)
        .keepalives_idle(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    pg_config
}

/// `CREATE SCHEMA IF NOT EXISTS` for a non-`public` destination schema.
pub fn create_schema_sql(schema: &str) -> Result<Option<String>> {
    if schema == "public" {
        return Ok(None);
    }
    Ok(Some(format!(
        "CREATE SCHEMA IF NOT EXISTS {}",
        quote_pg_ident(schema)?
    )))
}

/// `DROP TABLE IF EXISTS` without `CASCADE`.
pub fn drop_table_sql(schema: &str, table: &str) -> Result<String> {
    Ok(format!("DROP TABLE IF EXISTS {}", qualify_pg(schema, table)?))
}

impl PgSink {
    /// Connect to the destination database and make sure the configured
    /// schema exists.
    ///
    /// Uses a single pooled connection for the whole run.
    pub async fn connect(config: &TargetConfig, chunk_size: usize) -> Result<Self> {
        let sink = Self::open(config, chunk_size).await?;
        sink.ensure_schema().await?;
        info!("Connected to {} (schema {})", sink.name, sink.schema);
        Ok(sink)
    }

    /// Connect and round-trip `SELECT 1` without changing the destination.
    pub async fn open(config: &TargetConfig, chunk_size: usize) -> Result<Self> {
        let name = config.describe();

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        let mgr = match make_tls_connect(ssl_mode)? {
            Some(tls) => Manager::from_config(pg_config(config), tls, mgr_config),
            None => Manager::from_config(pg_config(config), NoTls, mgr_config),
        };
        let pool = Pool::builder(mgr)
            .max_size(1)
            .build()
            .map_err(|e| SyncError::connection(name.clone(), e))?;

        let sink = Self {
            pool,
            schema: config.schema.clone(),
            chunk_size: chunk_size.max(1),
            name,
        };
        sink.ping().await?;
        Ok(sink)
    }

    async fn ensure_schema(&self) -> Result<()> {
        let Some(sql) = create_schema_sql(&self.schema)? else {
            return Ok(());
        };
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SyncError::connection(self.name.clone(), e))?;
        client
            .batch_execute(&sql)
            .await
            .map_err(|e| SyncError::connection(self.name.clone(), e))
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SyncError::connection(self.name.clone(), e))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| SyncError::connection(self.name.clone(), e))?;
        Ok(())
    }

    async fn copy_rows(
        &self,
        tx: &tokio_postgres::Transaction<'_>,
        table: &str,
        copy_stmt: &str,
        rows: &[Vec<SqlValue>],
    ) -> Result<u64> {
        let sink = tx
            .copy_in(copy_stmt)
            .await
            .map_err(|e| SyncError::load(table, e))?;
        futures::pin_mut!(sink);

        let mut buf = BytesMut::with_capacity(COPY_BUFFER_BYTES);
        let row_count = rows.len();

        for (i, row) in rows.iter().enumerate() {
            encode_copy_row(&mut buf, row);

            if (i + 1) % self.chunk_size == 0 || i + 1 == row_count {
                sink.send(buf.split().freeze())
                    .await
                    .map_err(|e| SyncError::load(table, format!("COPY send failed: {}", e)))?;
            }
        }

        sink.finish().await.map_err(|e| SyncError::load(table, e))
    }
}

#[async_trait]
impl TableSink for PgSink {
    async fn replace_table(&self, table: &str, rowset: NormalizedRowset) -> Result<u64> {
        let (columns, rows) = rowset.into_parts();
        let drop = drop_table_sql(&self.schema, table).map_err(|e| SyncError::load(table, e))?;
        let ddl = generate_ddl(&self.schema, table, &columns).map_err(|e| SyncError::load(table, e))?;

        let mut client = self
            .pool
            .get()
            .await
            .map_err(|e| SyncError::load(table, e))?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| SyncError::load(table, e))?;

        debug!("{}: {}", table, drop);
        tx.batch_execute(&drop)
            .await
            .map_err(|e| SyncError::load(table, e))?;
        tx.batch_execute(&ddl)
            .await
            .map_err(|e| SyncError::load(table, e))?;

        let written = if rows.is_empty() {
            0
        } else {
            let copy_stmt =
                copy_statement(&self.schema, table, &columns).map_err(|e| SyncError::load(table, e))?;
            self.copy_rows(&tx, table, &copy_stmt, &rows).await?
        };

        tx.commit().await.map_err(|e| SyncError::load(table, e))?;

        debug!("{}: committed {} rows", table, written);
        Ok(written)
    }

    async fn row_count(&self, table: &str) -> Result<Option<i64>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| SyncError::connection(self.name.clone(), e))?;

        let exists: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_name = $2)",
                &[&self.schema, &table],
            )
            .await
            .map_err(|e| SyncError::load(table, e))?
            .get(0);
        if !exists {
            return Ok(None);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {}",
            qualify_pg(&self.schema, table).map_err(|e| SyncError::load(table, e))?
        );
        let row = client
            .query_one(sql.as_str(), &[])
            .await
            .map_err(|e| SyncError::load(table, e))?;
        Ok(Some(row.get(0)))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn close(&self) {
        self.pool.close();
        debug!("Closed {}", self.name);
    }
}

/// `CREATE TABLE` for a normalized header. Every column is nullable.
///
/// A header with no columns is an error: the destination must carry the
/// source's column set even when it holds no rows.
pub fn generate_ddl(schema: &str, table: &str, columns: &[Column]) -> Result<String> {
    if columns.is_empty() {
        return Err(SyncError::Config(format!(
            "table {} has no columns to create",
            table
        )));
    }

    let mut ddl = format!("CREATE TABLE {} (", qualify_pg(schema, table)?);

    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            ddl.push(',');
        }
        ddl.push_str(&format!(
            "\n    {} {}",
            quote_pg_ident(&col.name)?,
            column_type_to_postgres(&col.data_type)
        ));
    }

    ddl.push_str("\n)");
    Ok(ddl)
}

/// `COPY ... FROM STDIN` for the header, in header order.
pub fn copy_statement(schema: &str, table: &str, columns: &[Column]) -> Result<String> {
    let col_list = columns
        .iter()
        .map(|c| quote_pg_ident(&c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    Ok(format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT text)",
        qualify_pg(schema, table)?,
        col_list
    ))
}

/// Append one tab-separated, newline-terminated COPY row to `buf`.
fn encode_copy_row(buf: &mut BytesMut, row: &[SqlValue]) {
    for (j, value) in row.iter().enumerate() {
        if j > 0 {
            buf.put_u8(b'\t');
        }
        buf.extend_from_slice(sql_value_to_copy_text(value).as_bytes());
    }
    buf.put_u8(b'\n');
}

/// Render a value in COPY text format. NULL is `\N`.
fn sql_value_to_copy_text(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "\\N".to_string(),
        SqlValue::Bool(b) => if *b { "t" } else { "f" }.to_string(),
        SqlValue::I16(n) => n.to_string(),
        SqlValue::I32(n) => n.to_string(),
        SqlValue::I64(n) => n.to_string(),
        SqlValue::F32(n) => float_to_copy_text(f64::from(*n), n.to_string()),
        SqlValue::F64(n) => float_to_copy_text(*n, n.to_string()),
        SqlValue::Decimal(d) => d.to_string(),
        SqlValue::String(s) => escape_copy_text(s),
        SqlValue::Bytes(b) => format!("\\\\x{}", hex::encode(b)),
        SqlValue::Date(d) => d.to_string(),
        SqlValue::Time(t) => t.to_string(),
        SqlValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
    }
}

fn float_to_copy_text(n: f64, rendered: String) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        rendered
    }
}

/// Escape special characters for COPY text format.
fn escape_copy_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\t' => result.push_str("\\t"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ColumnType;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("txnid", ColumnType::Text),
            Column::new("amount", ColumnType::Numeric { precision: 18, scale: 2 }),
            Column::new("sales tax code", ColumnType::Bool),
        ]
    }

    #[test]
    fn test_generate_ddl() {
        let ddl = generate_ddl("public", "invoice", &columns()).unwrap();
        assert_eq!(
            ddl,
            "CREATE TABLE \"public\".\"invoice\" (\n    \"txnid\" text,\n    \"amount\" numeric(18,2),\n    \"sales tax code\" boolean\n)"
        );
        assert!(!ddl.contains("NOT NULL"));
    }

    #[test]
    fn test_generate_ddl_requires_columns() {
        let err = generate_ddl("public", "ghost", &[]).unwrap_err();
        assert!(err.to_string().contains("no columns"));
    }

    #[test]
    fn test_drop_does_not_cascade() {
        let sql = drop_table_sql("public", "invoice").unwrap();
        assert_eq!(sql, "DROP TABLE IF EXISTS \"public\".\"invoice\"");
        assert!(!sql.contains("CASCADE"));
    }

    #[test]
    fn test_create_schema_only_for_custom_schema() {
        assert_eq!(create_schema_sql("public").unwrap(), None);
        assert_eq!(
            create_schema_sql("quickbooks").unwrap().as_deref(),
            Some("CREATE SCHEMA IF NOT EXISTS \"quickbooks\"")
        );
    }

    #[test]
    fn test_pg_config_accepts_ipv6_host_and_raw_password() {
        let target = TargetConfig {
            host: "::1".to_string(),
            port: 6543,
            database: "Internal".to_string(),
            user: "sync".to_string(),
            password: "p@ss:w/rd#1".to_string(),
            ..TargetConfig::default()
        };
        let config = pg_config(&target);
        assert_eq!(
            config.get_hosts(),
            &[tokio_postgres::config::Host::Tcp("::1".to_string())]
        );
        assert_eq!(config.get_ports(), &[6543]);
        assert_eq!(config.get_dbname(), Some("Internal"));
        assert_eq!(config.get_user(), Some("sync"));
        assert_eq!(config.get_password(), Some(&b"p@ss:w/rd#1"[..]));
    }

    #[test]
    fn test_generate_ddl_rejects_empty_column_name() {
        let cols = vec![Column::new("", ColumnType::Integer)];
        assert!(generate_ddl("public", "t", &cols).is_err());
    }

    #[test]
    fn test_copy_statement() {
        assert_eq!(
            copy_statement("qb", "invoice", &columns()).unwrap(),
            "COPY \"qb\".\"invoice\" (\"txnid\", \"amount\", \"sales tax code\") FROM STDIN WITH (FORMAT text)"
        );
    }

    #[test]
    fn test_escape_copy_text() {
        assert_eq!(escape_copy_text("plain"), "plain");
        assert_eq!(escape_copy_text("a\\b"), "a\\\\b");
        assert_eq!(escape_copy_text("a\tb"), "a\\tb");
        assert_eq!(escape_copy_text("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_copy_text("cr\r"), "cr\\r");
    }

    #[test]
    fn test_copy_text_values() {
        assert_eq!(sql_value_to_copy_text(&SqlValue::Null), "\\N");
        assert_eq!(sql_value_to_copy_text(&SqlValue::Bool(true)), "t");
        assert_eq!(sql_value_to_copy_text(&SqlValue::Bool(false)), "f");
        assert_eq!(sql_value_to_copy_text(&SqlValue::I64(-7)), "-7");
        assert_eq!(
            sql_value_to_copy_text(&SqlValue::Decimal(Decimal::from_str("1234.56").unwrap())),
            "1234.56"
        );
        assert_eq!(
            sql_value_to_copy_text(&SqlValue::Bytes(vec![0xDE, 0xAD])),
            "\\\\xdead"
        );
        assert_eq!(
            sql_value_to_copy_text(&SqlValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())),
            "2024-02-29"
        );
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(3, 4, 5).unwrap());
        assert_eq!(
            sql_value_to_copy_text(&SqlValue::DateTime(dt)),
            "2024-01-02 03:04:05.000000"
        );
    }

    #[test]
    fn test_copy_text_special_floats() {
        assert_eq!(sql_value_to_copy_text(&SqlValue::F64(f64::NAN)), "NaN");
        assert_eq!(sql_value_to_copy_text(&SqlValue::F64(f64::INFINITY)), "Infinity");
        assert_eq!(sql_value_to_copy_text(&SqlValue::F32(f32::NEG_INFINITY)), "-Infinity");
        assert_eq!(sql_value_to_copy_text(&SqlValue::F64(1.5)), "1.5");
    }

    #[test]
    fn test_encode_copy_row() {
        let mut buf = BytesMut::new();
        encode_copy_row(
            &mut buf,
            &[
                SqlValue::String("Acme\tInc".into()),
                SqlValue::Null,
                SqlValue::I32(3),
            ],
        );
        assert_eq!(&buf[..], b"Acme\\tInc\t\\N\t3\n");
    }
}
