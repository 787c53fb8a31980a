//! Column-name normalization.
//!
//! PostgreSQL folds unquoted identifiers to lowercase, so tables and columns
//! are created lowercase to stay queryable without quoting.

use crate::core::{NormalizedRowset, Rowset};

/// Lowercase every header entry of `rowset`.
///
/// Row values are untouched and header entries are neither deduplicated nor
/// validated: `Id` and `ID` both become `id`, and the destination rejects the
/// duplicate when the table is created.
pub fn normalize(mut rowset: Rowset) -> NormalizedRowset {
    for column in &mut rowset.columns {
        column.name = column.name.to_lowercase();
    }
    NormalizedRowset::from_rowset(rowset)
}

/// Destination table name for a source table name.
pub fn destination_table_name(source_table: &str) -> String {
    source_table.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, ColumnType, SqlValue};

    fn rowset(headers: &[&str], rows: Vec<Vec<SqlValue>>) -> Rowset {
        Rowset::new(
            headers
                .iter()
                .map(|h| Column::new(*h, ColumnType::Text))
                .collect(),
            rows,
        )
    }

    #[test]
    fn test_lowercases_all_casings() {
        let normalized = normalize(rowset(
            &["CustomerID", "FullName", "ALLCAPS", "already_lower", "Sales Tax Code"],
            vec![],
        ));
        assert_eq!(
            normalized.column_names(),
            vec!["customerid", "fullname", "allcaps", "already_lower", "sales tax code"]
        );
    }

    #[test]
    fn test_row_values_unchanged() {
        let rows = vec![
            vec![SqlValue::from("MixedCase Value"), SqlValue::I32(7)],
            vec![SqlValue::Null, SqlValue::I32(8)],
        ];
        let normalized = normalize(rowset(&["Name", "Qty"], rows.clone()));
        assert_eq!(normalized.rows(), rows.as_slice());
    }

    #[test]
    fn test_preserves_length_and_order() {
        let normalized = normalize(rowset(&["B", "A", "C"], vec![]));
        assert_eq!(normalized.column_names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_case_collisions_are_kept() {
        let normalized = normalize(rowset(&["Id", "ID"], vec![]));
        assert_eq!(normalized.column_names(), vec!["id", "id"]);
    }

    #[test]
    fn test_preserves_column_types() {
        let mut input = rowset(&["Amount"], vec![]);
        input.columns[0].data_type = ColumnType::Numeric { precision: 18, scale: 2 };
        let normalized = normalize(input);
        assert_eq!(
            normalized.columns()[0].data_type,
            ColumnType::Numeric { precision: 18, scale: 2 }
        );
    }

    #[test]
    fn test_destination_table_name() {
        assert_eq!(destination_table_name("SalesOrderLine"), "salesorderline");
        assert_eq!(destination_table_name("Sales Order"), "sales order");
    }
}
