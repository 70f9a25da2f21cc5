//! Fuzzy matching of leftover rows through the whole engine

use crate::common::*;
use tabrecon::{ListTable, TableComparator, Value};

#[test]
fn test_key_column_pairs_changed_row_into_one_failure() {
    init_logging();
    // (Smith, 30) disappeared and (Smith, 31) appeared; Name is the key
    let baseline = table(
        vec!["Name", "Age"],
        vec![
            vec!["Jones".into(), 25.into()],
            vec!["Smith".into(), 30.into()],
        ],
    );
    let candidate = ListTable::new(
        vec!["Name", "Age"],
        vec![
            vec!["Jones".into(), 25.into()],
            vec!["Smith".into(), 31.into()],
        ],
    )
    .with_key_columns(vec!["Name"]);

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["pass", "pass"], vec!["pass", "fail"]]
    );
}

#[test]
fn test_rows_outside_shared_key_groups_stay_unmatched() {
    let baseline = table(
        vec!["Name", "Age"],
        vec![
            vec!["anchor".into(), 1.into()],
            vec!["Jones".into(), 40.into()],
        ],
    );
    let candidate = ListTable::new(
        vec!["Name", "Age"],
        vec![
            vec!["anchor".into(), 1.into()],
            vec!["Brown".into(), 40.into()],
        ],
    )
    .with_key_columns(vec!["Name"]);

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    // ages agree but the keys differ, so no fuzzy pairing happens
    assert_eq!(
        data_kind_grid(&result),
        vec![
            vec!["pass", "pass"],
            vec!["surplus", "surplus"],
            vec!["missing", "missing"],
        ]
    );
}

#[test]
fn test_best_match_resolves_renamed_row_without_keys() {
    let baseline = table(
        vec!["Id", "Payload", "Flag"],
        vec![
            vec!["anchor".into(), "p".into(), "y".into()],
            vec!["row-7".into(), "data-7".into(), "y".into()],
        ],
    );
    let candidate = table(
        vec!["Id", "Payload", "Flag"],
        vec![
            vec!["anchor".into(), "p".into(), "y".into()],
            vec!["row-7-renamed".into(), "data-7".into(), "y".into()],
        ],
    );

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    // the renamed row still shares Payload and Flag, enough for a pairing
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["pass", "pass", "pass"], vec!["fail", "pass", "pass"]]
    );
}

#[test]
fn test_adaptive_grouping_matches_within_groups_only() {
    // force grouping by shrinking the exhaustive threshold to zero
    let baseline = table(
        vec!["Region", "Qty"],
        vec![
            vec!["east".into(), 1.into()],
            vec!["west".into(), 2.into()],
        ],
    );
    let candidate = table(
        vec!["Region", "Qty"],
        vec![
            vec!["west".into(), 3.into()],
            vec!["east".into(), 4.into()],
        ],
    );

    let result = TableComparator::new()
        .with_best_match_threshold(0)
        .with_compare_row_order(false)
        .compare(&baseline, &candidate)
        .unwrap();
    // every baseline row finds its regional counterpart as a failed pairing
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["pass", "fail"], vec!["pass", "fail"]]
    );
}

#[test]
fn test_unmatchable_rows_remain_missing_and_surplus() {
    let baseline = table(
        vec!["A", "B"],
        vec![
            vec!["anchor".into(), "1".into()],
            vec!["only-here".into(), "2".into()],
        ],
    );
    let candidate = table(
        vec!["A", "B"],
        vec![
            vec!["anchor".into(), "1".into()],
            vec!["unrelated".into(), "3".into()],
        ],
    );

    let result = TableComparator::new().compare(&baseline, &candidate).unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![
            vec!["pass", "pass"],
            vec!["surplus", "surplus"],
            vec!["missing", "missing"],
        ]
    );
}

#[test]
fn test_disabled_timeout_still_matches() {
    let baseline = table(
        vec!["Id", "V"],
        vec![
            vec!["a".into(), 1.into()],
            vec!["k".into(), 2.into()],
        ],
    );
    let candidate = table(
        vec!["Id", "V"],
        vec![
            vec!["a".into(), 1.into()],
            vec!["k".into(), 3.into()],
        ],
    );
    let result = TableComparator::new()
        .without_partial_match_timeout()
        .compare(&baseline, &candidate)
        .unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["pass", "pass"], vec!["pass", "fail"]]
    );
}

#[test]
fn test_tolerant_column_participates_in_scoring() {
    // Amount differs within tolerance, so it contributes to the match score
    // even though the exact values differ
    let baseline = table(
        vec!["Id", "Amount"],
        vec![
            vec!["anchor".into(), Value::Float(5.0)],
            vec!["x".into(), Value::Float(10.0)],
        ],
    );
    let candidate = table(
        vec!["Id", "Amount"],
        vec![
            vec!["anchor".into(), Value::Float(5.0)],
            vec!["renamed".into(), Value::Float(10.05)],
        ],
    );
    let result = TableComparator::new()
        .with_column_tolerance("Amount", 0.1)
        .compare(&baseline, &candidate)
        .unwrap();
    assert_eq!(
        data_kind_grid(&result),
        vec![vec!["pass", "pass"], vec!["fail", "pass"]]
    );
}
