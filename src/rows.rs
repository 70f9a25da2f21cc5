//! Composite row keys for hash matching and grouping

use crate::comparator::ColumnComparators;
use crate::index_map::IndexMap;
use crate::table::Table;

/// Which side of the comparison a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Baseline,
    Candidate,
}

impl Side {
    pub(crate) fn column_index(self, column: &IndexMap) -> Option<usize> {
        match self {
            Side::Baseline => column.baseline_index(),
            Side::Candidate => column.candidate_index(),
        }
    }
}

/// Builds the composite key of one row: a blake3 digest over the formatted
/// values of the given columns, in column order. Only columns present on both
/// sides should be passed in so that the same row content produces the same
/// key on either side.
pub(crate) fn row_key(
    table: &dyn Table,
    side: Side,
    row: usize,
    columns: &[IndexMap],
    comparators: &ColumnComparators,
) -> String {
    let mut hasher = blake3::Hasher::new();
    for column in columns {
        let column_index = side
            .column_index(column)
            .expect("row keys are built over matched columns");
        let comparator = comparators.comparator_for(table.column_name(column_index));
        let formatted = comparator.formatter().format(&table.value_at(row, column_index));
        hasher.update(formatted.as_bytes());
        hasher.update(b"|"); // separator to avoid boundary collisions
    }
    hasher.finalize().to_hex().to_string()
}

/// Formatted value of one row at one aligned column, used for grouping keys
/// and selectivity sets during partial matching.
pub(crate) fn formatted_value(
    table: &dyn Table,
    side: Side,
    row: usize,
    column: &IndexMap,
    comparators: &ColumnComparators,
) -> String {
    let column_index = side
        .column_index(column)
        .expect("grouping runs over matched columns");
    let comparator = comparators.comparator_for(table.column_name(column_index));
    comparator.formatter().format(&table.value_at(row, column_index))
}
