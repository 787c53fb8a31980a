//! Type mapping from driver-reported column types to PostgreSQL.
//!
//! Destination types are inferred from what the ODBC driver reports; there is
//! no per-table override.

use crate::core::ColumnType;

/// Largest precision PostgreSQL accepts for `numeric(p,s)`.
const MAX_NUMERIC_PRECISION: u32 = 1000;

/// Map a column type to a PostgreSQL column type.
pub fn column_type_to_postgres(data_type: &ColumnType) -> String {
    match data_type {
        ColumnType::Bool => "boolean".to_string(),

        ColumnType::SmallInt => "smallint".to_string(),
        ColumnType::Integer => "integer".to_string(),
        ColumnType::BigInt => "bigint".to_string(),

        ColumnType::Real => "real".to_string(),
        ColumnType::Double => "double precision".to_string(),

        ColumnType::Numeric { precision, scale } => {
            if *precision > 0 && *precision <= MAX_NUMERIC_PRECISION && scale <= precision {
                format!("numeric({},{})", precision, scale)
            } else {
                "numeric".to_string()
            }
        }

        // Driver-reported lengths are unreliable for CData text columns.
        ColumnType::Text => "text".to_string(),

        ColumnType::Binary => "bytea".to_string(),

        ColumnType::Date => "date".to_string(),
        ColumnType::Time => "time".to_string(),
        ColumnType::Timestamp => "timestamp".to_string(),

        // Values of unknown columns are carried as text.
        ColumnType::Unknown => "text".to_string(),
    }
}
