//! Identifier checks and quoting for dynamically built SQL.
//!
//! Table and column names cannot be bound as statement parameters, so every
//! name that reaches a query string goes through this module. Both the ODBC
//! source (CData drivers accept ANSI quoting for names with spaces or reserved
//! words) and PostgreSQL use double quotes with embedded quotes doubled.

use crate::error::{Result, SyncError};

/// PostgreSQL silently truncates longer names (NAMEDATALEN - 1), which would
/// let two source names collide in the destination.
pub const PG_MAX_IDENTIFIER_BYTES: usize = 63;

/// Reject names no database will accept: empty, or carrying NUL or other
/// control characters.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SyncError::Config("identifier is empty".to_string()));
    }

    if let Some(c) = name.chars().find(|c| c.is_control()) {
        return Err(SyncError::Config(format!(
            "identifier {:?} contains control character {:?}",
            name, c
        )));
    }

    Ok(())
}

/// Double-quote a name for either endpoint.
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Double-quote a destination name, refusing names PostgreSQL would truncate.
pub fn quote_pg_ident(name: &str) -> Result<String> {
    if name.len() > PG_MAX_IDENTIFIER_BYTES {
        return Err(SyncError::Config(format!(
            "identifier {:?} is {} bytes; PostgreSQL keeps only the first {}",
            name,
            name.len(),
            PG_MAX_IDENTIFIER_BYTES
        )));
    }
    quote_ident(name)
}

/// `"schema"."table"` for the destination.
pub fn qualify_pg(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_pg_ident(schema)?, quote_pg_ident(table)?))
}
