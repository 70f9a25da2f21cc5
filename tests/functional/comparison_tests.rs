//! End-to-end comparison scenarios

use crate::common::*;
use tabrecon::{ColumnRenameTable, ResultCell, TableComparator, Value};

#[test]
fn test_reordered_rows_pass_when_row_order_ignored() {
    init_logging();
    let baseline = table(
        vec!["Letter", "Number"],
        vec![
            vec!["A".into(), 1.into()],
            vec!["B".into(), 2.into()],
        ],
    );
    let candidate = table(
        vec!["Letter", "Number"],
        vec![
            vec!["B".into(), 2.into()],
            vec!["A".into(), 1.into()],
        ],
    );

    let result = TableComparator::new()
        .with_compare_row_order(false)
        .compare(&baseline, &candidate)
        .unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["pass", "pass"], vec!["pass", "pass"]]
    );
    assert!(result.is_success());
}

#[test]
fn test_reordered_rows_flagged_when_row_order_compared() {
    let baseline = table(
        vec!["Letter", "Number"],
        vec![
            vec!["A".into(), 1.into()],
            vec!["B".into(), 2.into()],
        ],
    );
    let candidate = table(
        vec!["Letter", "Number"],
        vec![
            vec!["B".into(), 2.into()],
            vec!["A".into(), 1.into()],
        ],
    );

    let result = TableComparator::new()
        .with_compare_row_order(true)
        .compare(&baseline, &candidate)
        .unwrap();
    // the row appearing before its turn is flagged; nothing fails
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["order", "order"], vec!["pass", "pass"]]
    );
    assert_eq!(result.passed_cell_count(), result.total_cell_count());
}

#[test]
fn test_tolerance_accepts_and_rejects_around_threshold() {
    let baseline = table(vec!["Name", "Age"], vec![vec!["Alice".into(), Value::Float(21.3)]]);
    let candidate = table(vec!["Name", "Age"], vec![vec!["Alice".into(), Value::Float(21.2)]]);

    let loose = TableComparator::new()
        .with_column_tolerance("Age", 0.2)
        .compare(&baseline, &candidate)
        .unwrap();
    assert!(loose.is_success());

    let tight = TableComparator::new()
        .with_column_tolerance("Age", 0.05)
        .compare(&baseline, &candidate)
        .unwrap();
    assert!(!tight.is_success());
    match &tight.rows()[1][1] {
        ResultCell::Failed { difference, .. } => {
            assert!((difference.unwrap() - 0.1).abs() < 1.0e-9);
        }
        other => panic!("expected failed Age cell, got {:?}", other),
    }
}

#[test]
fn test_unrelated_extra_candidate_rows_are_surplus() {
    let baseline = table(
        vec!["Id", "Qty"],
        vec![
            vec!["a".into(), 1.into()],
            vec!["b".into(), 2.into()],
            vec!["c".into(), 3.into()],
        ],
    );
    let candidate = table(
        vec!["Id", "Qty"],
        vec![
            vec!["a".into(), 1.into()],
            vec!["b".into(), 2.into()],
            vec!["c".into(), 3.into()],
            vec!["x".into(), 98.into()],
            vec!["y".into(), 99.into()],
        ],
    );

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    let grid = data_kind_grid(&result);
    assert_eq!(grid.len(), 5);
    assert_eq!(
        grid.iter().filter(|row| row[0] == "surplus").count(),
        2
    );
    assert_eq!(grid.iter().filter(|row| row[0] == "missing").count(), 0);
    assert_eq!(grid.iter().filter(|row| row[0] == "pass").count(), 3);
}

#[test]
fn test_missing_column_yields_missing_cells_on_matched_rows() {
    let baseline = table(
        vec!["A", "B", "C"],
        vec![vec!["1".into(), "2".into(), "3".into()]],
    );
    let candidate = table(vec!["A", "C"], vec![vec!["1".into(), "3".into()]]);

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(kind_grid(&result)[0], vec!["pass", "missing", "pass"]);
    assert_eq!(data_kind_grid(&result), vec![vec!["pass", "missing", "pass"]]);
    assert!(!result.is_success());
}

#[test]
fn test_ignore_missing_columns_drops_them_from_the_grid() {
    let baseline = table(
        vec!["A", "B", "C"],
        vec![vec!["1".into(), "2".into(), "3".into()]],
    );
    let candidate = table(vec!["A", "C"], vec![vec!["1".into(), "3".into()]]);

    let result = TableComparator::new()
        .with_ignore_missing_columns()
        .compare(&baseline, &candidate)
        .unwrap();
    assert_eq!(kind_grid(&result)[0].len(), 2);
    assert!(result.is_success());
}

#[test]
fn test_ignore_missing_and_surplus_rows() {
    let baseline = table(
        vec!["Id"],
        vec![vec!["shared".into()], vec!["baseline-only".into()]],
    );
    let candidate = table(
        vec!["Id"],
        vec![vec!["shared".into()], vec!["candidate-only".into()]],
    );

    let result = TableComparator::new()
        .with_ignore_missing_rows()
        .with_ignore_surplus_rows()
        .compare(&baseline, &candidate)
        .unwrap();
    assert_eq!(data_kind_grid(&result), vec![vec!["pass"]]);
    assert!(result.is_success());
}

#[test]
fn test_formatting_equality_across_value_types() {
    // an integer and its textual rendering compare equal through formatting
    let baseline = table(vec!["N"], vec![vec![Value::Integer(42)]]);
    let candidate = table(vec!["N"], vec![vec![Value::Text("42".into())]]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert!(result.is_success());
}

#[test]
fn test_changed_rows_in_the_middle_pair_up_as_failures() {
    init_logging();
    let baseline = table(
        vec!["Id", "Amount"],
        vec![
            vec!["r1".into(), 10.into()],
            vec!["r2".into(), 20.into()],
            vec!["r3".into(), 30.into()],
        ],
    );
    let candidate = table(
        vec!["Id", "Amount"],
        vec![
            vec!["r1".into(), 10.into()],
            vec!["r2".into(), 21.into()],
            vec!["r3".into(), 30.into()],
        ],
    );

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    // the changed middle row is best-matched into one failed row
    assert_eq!(
        data_kind_grid(&result),
        vec![
            vec!["pass", "pass"],
            vec!["pass", "fail"],
            vec!["pass", "pass"],
        ]
    );
}

#[test]
fn test_rename_adapter_aligns_prefixed_headers() {
    let baseline = table(vec!["Name"], vec![vec!["a".into()]]);
    let candidate = table(vec!["Env Name"], vec![vec!["a".into()]]);
    let adapted = ColumnRenameTable::new(&candidate, |name| {
        name.trim_start_matches("Env ").to_string()
    });
    let result = TableComparator::new().compare(&baseline, &adapted).unwrap();
    assert!(result.is_success());
}

#[test]
fn test_matched_columns_ahead_hint() {
    let baseline = table(
        vec!["A", "B", "C"],
        vec![vec!["1".into(), "2".into(), "3".into()]],
    );
    let candidate = table(
        vec!["A", "B", "C"],
        vec![vec!["x".into(), "2".into(), "3".into()]],
    );
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(result.matched_columns_ahead(0), 0);
    assert_eq!(result.matched_columns_ahead(1), 1);
    assert_eq!(result.matched_columns_ahead(2), 0);
}
