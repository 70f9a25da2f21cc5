//! Common test utilities and helpers

use tabrecon::{ListTable, ResultCell, ResultTable, Value};

/// Initializes logging for tests that want to inspect phase output.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a list table from headers and rows.
pub fn table(headers: Vec<&str>, rows: Vec<Vec<Value>>) -> ListTable {
    ListTable::new(headers, rows)
}

/// Short tag for a cell's classification, for grid assertions.
pub fn cell_kind(cell: &ResultCell) -> &'static str {
    match cell {
        ResultCell::Matched { .. } => "pass",
        ResultCell::OutOfOrder { .. } => "order",
        ResultCell::Failed { .. } => "fail",
        ResultCell::Missing { .. } => "missing",
        ResultCell::Surplus { .. } => "surplus",
        ResultCell::Custom { .. } => "custom",
        ResultCell::Summary { .. } => "summary",
    }
}

/// The whole grid, header row included, as classification tags.
pub fn kind_grid(result: &ResultTable) -> Vec<Vec<&'static str>> {
    result
        .rows()
        .iter()
        .map(|row| row.iter().map(cell_kind).collect())
        .collect()
}

/// Data rows only (header row stripped) as classification tags.
pub fn data_kind_grid(result: &ResultTable) -> Vec<Vec<&'static str>> {
    kind_grid(result).split_off(1)
}

/// Asserts that no cell in the grid failed or was missing/surplus.
pub fn assert_all_pass(result: &ResultTable) {
    for row in kind_grid(result) {
        for kind in row {
            assert!(
                kind == "pass" || kind == "order",
                "expected only passing cells, found {:?}",
                kind
            );
        }
    }
}
