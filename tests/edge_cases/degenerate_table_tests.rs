//! Degenerate and boundary-shaped inputs

use crate::common::*;
use tabrecon::{ListTable, TableComparator, TabreconError};

#[test]
fn test_zero_column_tables_are_rejected() {
    let empty = ListTable::new(Vec::<String>::new(), Vec::new());
    let normal = table(vec!["A"], vec![vec!["x".into()]]);
    let comparator = TableComparator::new();

    assert!(matches!(
        comparator.compare(&empty, &normal),
        Err(TabreconError::NoColumns { .. })
    ));
    assert!(matches!(
        comparator.compare(&normal, &empty),
        Err(TabreconError::NoColumns { .. })
    ));
    assert!(matches!(
        comparator.baseline_only(&empty),
        Err(TabreconError::NoColumns { .. })
    ));
}

#[test]
fn test_tables_with_no_rows() {
    let baseline = table(vec!["A", "B"], vec![]);
    let candidate = table(vec!["A", "B"], vec![]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(result.rows().len(), 1);
    assert!(result.is_success());
}

#[test]
fn test_empty_baseline_makes_every_candidate_row_surplus() {
    let baseline = table(vec!["A"], vec![]);
    let candidate = table(vec!["A"], vec![vec!["x".into()], vec!["y".into()]]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["surplus"], vec!["surplus"]]
    );
}

#[test]
fn test_empty_candidate_makes_every_baseline_row_missing() {
    let baseline = table(vec!["A"], vec![vec!["x".into()], vec!["y".into()]]);
    let candidate = table(vec!["A"], vec![]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["missing"], vec!["missing"]]
    );
}

#[test]
fn test_single_cell_tables() {
    let baseline = table(vec!["A"], vec![vec!["x".into()]]);
    let candidate = table(vec!["A"], vec![vec!["y".into()]]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    // no shared column values at all: the rows stay unmatched
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["surplus"], vec!["missing"]]
    );
}

#[test]
fn test_disjoint_column_sets() {
    let baseline = table(vec!["A"], vec![vec!["1".into()]]);
    let candidate = table(vec!["B"], vec![vec!["1".into()]]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    // every column is one-sided, so rows can neither match nor fail
    assert_eq!(kind_grid(&result)[0], vec!["surplus", "missing"]);
    assert!(!result.is_success());
}

#[test]
fn test_duplicate_column_names_align_positionally() {
    let baseline = table(
        vec!["X", "X"],
        vec![vec!["left".into(), "right".into()]],
    );
    let candidate = table(
        vec!["X", "X"],
        vec![vec!["left".into(), "right".into()]],
    );
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert!(result.is_success());
    assert_eq!(data_kind_grid(&result), vec![vec!["pass", "pass"]]);
}

#[test]
fn test_whitespace_variants_of_column_names_align() {
    let baseline = table(vec![" Name ", "Age"], vec![vec!["a".into(), 1.into()]]);
    let candidate = table(vec!["Name", "Age"], vec![vec!["a".into(), 1.into()]]);
    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert!(result.is_success());
}
