//! Source connector.
//!
//! [`OdbcSource`] implements [`crate::core::TableSource`] over an ODBC DSN.

pub mod odbc;

pub use odbc::OdbcSource;
