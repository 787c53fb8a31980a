//! Core abstractions shared by the source, the sink, and the orchestrator.
//!
//! - [`schema`]: column metadata, [`Rowset`] and [`NormalizedRowset`]
//! - [`value`]: typed cell values
//! - [`traits`]: [`TableSource`] and [`TableSink`]
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{Column, ColumnType, NormalizedRowset, Rowset};
pub use traits::{TableSink, TableSource};
pub use value::SqlValue;
