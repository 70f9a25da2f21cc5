//! Comparison orchestration
//!
//! [`TableComparator`] runs the phases of one reconciliation in order: column
//! alignment, forward and reverse fast-path scans, hash matching of the
//! middle region, the partial matcher chain over leftover rows, out-of-order
//! detection, and result assembly. Each phase consumes the previous phase's
//! output; the whole pipeline is synchronous and single-threaded.

use crate::aligner::align;
use crate::comparator::{ColumnComparators, ColumnComparatorsBuilder};
use crate::error::{Result, TabreconError};
use crate::index_map::{identify_out_of_order, IndexMap, RowHandle, UnmatchedPool};
use crate::partial::{
    AdaptivePartialMatcher, KeyColumnPartialMatcher, MatchBudget, PartialMatcher,
    TimeBoundPartialMatcher,
};
use crate::result::{ResultCell, ResultTable};
use crate::rows::{row_key, Side};
use crate::table::{has_key_columns, Table, Value};
use crate::{DEFAULT_BEST_MATCH_THRESHOLD, DEFAULT_PARTIAL_MATCH_TIMEOUT};
use log::{debug, info};
use std::time::Duration;

/// Reconciles a candidate table against a baseline table.
///
/// A fluent interface combines configuration options; the comparator itself
/// holds no per-comparison state, so one configured instance can run any
/// number of independent comparisons.
#[derive(Debug, Clone)]
pub struct TableComparator {
    comparators: ColumnComparatorsBuilder,
    compare_row_order: bool,
    ignore_surplus_rows: bool,
    ignore_missing_rows: bool,
    ignore_surplus_columns: bool,
    ignore_missing_columns: bool,
    best_match_threshold: u64,
    partial_match_timeout: Option<Duration>,
    use_fast_path: bool,
}

impl Default for TableComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl TableComparator {
    pub fn new() -> Self {
        Self {
            comparators: ColumnComparatorsBuilder::default(),
            compare_row_order: true,
            ignore_surplus_rows: false,
            ignore_missing_rows: false,
            ignore_surplus_columns: false,
            ignore_missing_columns: false,
            best_match_threshold: DEFAULT_BEST_MATCH_THRESHOLD,
            partial_match_timeout: Some(DEFAULT_PARTIAL_MATCH_TIMEOUT),
            use_fast_path: true,
        }
    }

    /// Whether row order is compared. When disabled a check passes if the
    /// cells match even though rows appear in a different order on each side.
    pub fn with_compare_row_order(mut self, compare_row_order: bool) -> Self {
        self.compare_row_order = compare_row_order;
        self
    }

    /// Numeric tolerance applied when matching floating-point values in all
    /// columns. Setting tolerance per column is generally preferable.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.comparators.with_tolerance(tolerance);
        self
    }

    /// Numeric tolerance for one column.
    pub fn with_column_tolerance(mut self, column_name: impl Into<String>, tolerance: f64) -> Self {
        self.comparators.with_column_tolerance(column_name, tolerance);
        self
    }

    /// Variance threshold (relative percentage difference) applied when
    /// matching floating-point values in all columns.
    pub fn with_variance_threshold(mut self, variance_threshold: f64) -> Self {
        self.comparators.with_variance_threshold(variance_threshold);
        self
    }

    /// Variance threshold for one column.
    pub fn with_column_variance_threshold(
        mut self,
        column_name: impl Into<String>,
        variance_threshold: f64,
    ) -> Self {
        self.comparators
            .with_column_variance_threshold(column_name, variance_threshold);
        self
    }

    /// Whether formatted numbers carry thousands separators.
    pub fn with_number_grouping(mut self, grouping: bool) -> Self {
        self.comparators.with_number_grouping(grouping);
        self
    }

    /// Excludes surplus rows from the result grid.
    pub fn with_ignore_surplus_rows(mut self) -> Self {
        self.ignore_surplus_rows = true;
        self
    }

    /// Excludes missing rows from the result grid.
    pub fn with_ignore_missing_rows(mut self) -> Self {
        self.ignore_missing_rows = true;
        self
    }

    /// Excludes surplus columns from the comparison entirely.
    pub fn with_ignore_surplus_columns(mut self) -> Self {
        self.ignore_surplus_columns = true;
        self
    }

    /// Excludes missing columns from the comparison entirely.
    pub fn with_ignore_missing_columns(mut self) -> Self {
        self.ignore_missing_columns = true;
        self
    }

    /// Largest missing x surplus product handled by the exhaustive
    /// best-match scorer without grouping first.
    pub fn with_best_match_threshold(mut self, best_match_threshold: u64) -> Self {
        self.best_match_threshold = best_match_threshold;
        self
    }

    /// Wall-clock budget for the partial matching phase. On expiry the
    /// remaining unresolved rows are reported missing/surplus instead of
    /// failing the comparison.
    pub fn with_partial_match_timeout(mut self, timeout: Duration) -> Self {
        self.partial_match_timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    /// Disables the partial match timeout.
    pub fn without_partial_match_timeout(mut self) -> Self {
        self.partial_match_timeout = None;
        self
    }

    /// Disables the prefix/suffix exact-match scans, forcing every row
    /// through hash matching. A diagnostic knob: the final classification
    /// must not depend on it.
    pub fn with_fast_path(mut self, use_fast_path: bool) -> Self {
        self.use_fast_path = use_fast_path;
        self
    }

    /// Compares `candidate` against `baseline`.
    pub fn compare(&self, baseline: &dyn Table, candidate: &dyn Table) -> Result<ResultTable> {
        ensure_columns(baseline, "baseline")?;
        ensure_columns(candidate, "candidate")?;
        let comparators = self.comparators.build()?;

        info!(
            "Comparing {} col {} row candidate against {} col {} row baseline",
            candidate.column_count(),
            candidate.row_count(),
            baseline.column_count(),
            baseline.row_count()
        );

        debug!("Generating column indices");
        let mut columns = self.align_columns(baseline, candidate, &comparators);
        identify_out_of_order(&mut columns, 0);

        let key_columns: Vec<bool> = columns
            .iter()
            .map(|column| {
                column
                    .candidate_index()
                    .is_some_and(|index| candidate.is_key_column(index))
            })
            .collect();

        let mut results: Vec<Vec<ResultCell>> = Vec::with_capacity(candidate.row_count() + 1);
        results.push(header_row(&columns, baseline, candidate, &comparators));

        debug!("Starting forward fast path");
        if self.use_fast_path {
            collect_matching_rows(&columns, &mut results, baseline, candidate, &comparators);
        }
        let first_unmatched = results.len() - 1;
        if first_unmatched == baseline.row_count() && first_unmatched == candidate.row_count() {
            debug!("Fast path matched everything");
            return Ok(ResultTable::new(key_columns, results));
        }
        debug!("Matched {} rows on the forward fast path", first_unmatched);

        debug!("Starting reverse fast path");
        let reverse_results = if self.use_fast_path {
            collect_reverse_matching_rows(&columns, baseline, candidate, &comparators, first_unmatched)
        } else {
            Vec::new()
        };
        let reverse_matched = reverse_results.len();
        debug!("Matched {} rows on the reverse fast path", reverse_matched);

        debug!("Generating row indices from index {}", first_unmatched);
        let matched_columns: Vec<IndexMap> =
            columns.iter().filter(|c| c.is_matched()).cloned().collect();
        let baseline_keys: Vec<String> = (first_unmatched..baseline.row_count() - reverse_matched)
            .map(|row| row_key(baseline, Side::Baseline, row, &matched_columns, &comparators))
            .collect();
        let candidate_keys: Vec<String> = (first_unmatched..candidate.row_count() - reverse_matched)
            .map(|row| row_key(candidate, Side::Candidate, row, &matched_columns, &comparators))
            .collect();
        let alignment = align(&baseline_keys, &candidate_keys, first_unmatched);

        let mut final_rows = alignment.matched;
        debug!("Matched a further {} rows using row hashing", final_rows.len());

        let mut pool = UnmatchedPool::new();
        let missing_handles: Vec<RowHandle> = alignment
            .missing
            .iter()
            .map(|&row| pool.add_missing(row))
            .collect();
        let surplus_handles: Vec<RowHandle> = alignment
            .surplus
            .iter()
            .map(|&row| pool.add_surplus(row))
            .collect();

        debug!(
            "Partial-matching {} missing and {} surplus rows",
            missing_handles.len(),
            surplus_handles.len()
        );
        let mut matcher: Box<dyn PartialMatcher + '_> = Box::new(AdaptivePartialMatcher::new(
            baseline,
            candidate,
            &comparators,
            self.best_match_threshold,
        ));
        if has_key_columns(candidate) {
            matcher = Box::new(KeyColumnPartialMatcher::new(
                baseline,
                candidate,
                &comparators,
                matcher,
            ));
        }
        if let Some(timeout) = self.partial_match_timeout {
            matcher = Box::new(TimeBoundPartialMatcher::new(matcher, timeout));
        }
        matcher.match_rows(
            &missing_handles,
            &surplus_handles,
            &matched_columns,
            &mut pool,
            &MatchBudget::unbounded(),
        );

        debug!("Merging partial matches and remaining missing/surplus rows");
        for &handle in &missing_handles {
            match pool.best_mutual_match(handle) {
                Some(peer) => final_rows.push(IndexMap::matched(
                    pool.entry(handle).baseline_index().unwrap(),
                    pool.entry(peer).candidate_index().unwrap(),
                )),
                None => final_rows.push(pool.entry(handle).clone()),
            }
        }
        for &handle in &surplus_handles {
            if pool.best_mutual_match(handle).is_none() {
                final_rows.push(pool.entry(handle).clone());
            }
        }
        final_rows.sort();

        if self.compare_row_order {
            debug!("Looking for out of order rows");
            identify_out_of_order(&mut final_rows, first_unmatched);
        }

        debug!("Generating final results");
        for row_map in &final_rows {
            if let Some(cells) =
                self.build_result_row(row_map, &columns, baseline, candidate, &comparators)
            {
                results.push(cells);
            }
        }
        for cells in reverse_results.into_iter().rev() {
            results.push(cells);
        }
        debug!("Done");

        Ok(ResultTable::new(key_columns, results))
    }

    /// Renders a baseline that has no candidate counterpart: every cell,
    /// headers included, is missing.
    pub fn baseline_only(&self, baseline: &dyn Table) -> Result<ResultTable> {
        ensure_columns(baseline, "baseline")?;
        let comparators = self.comparators.build()?;
        single_sided(baseline, &comparators, |formatter, value| {
            ResultCell::missing(formatter, value)
        })
    }

    /// Renders a candidate that has no baseline counterpart: every cell,
    /// headers included, is surplus.
    pub fn candidate_only(&self, candidate: &dyn Table) -> Result<ResultTable> {
        ensure_columns(candidate, "candidate")?;
        let comparators = self.comparators.build()?;
        single_sided(candidate, &comparators, |formatter, value| {
            ResultCell::surplus(formatter, value)
        })
    }

    fn align_columns(
        &self,
        baseline: &dyn Table,
        candidate: &dyn Table,
        comparators: &ColumnComparators,
    ) -> Vec<IndexMap> {
        let formatter = comparators.default_comparator().formatter();
        let baseline_headings: Vec<String> = (0..baseline.column_count())
            .map(|c| formatter.format(&Value::Text(baseline.column_name(c).to_string())))
            .collect();
        let candidate_headings: Vec<String> = (0..candidate.column_count())
            .map(|c| formatter.format(&Value::Text(candidate.column_name(c).to_string())))
            .collect();
        let mut columns = align(&baseline_headings, &candidate_headings, 0).into_sorted_entries();
        columns.retain(|column| {
            if column.is_missing() {
                return !self.ignore_missing_columns;
            }
            if column.is_surplus() {
                return !self.ignore_surplus_columns;
            }
            true
        });
        columns
    }

    fn build_result_row(
        &self,
        row: &IndexMap,
        columns: &[IndexMap],
        baseline: &dyn Table,
        candidate: &dyn Table,
        comparators: &ColumnComparators,
    ) -> Option<Vec<ResultCell>> {
        if row.is_missing() {
            if self.ignore_missing_rows {
                return None;
            }
            let baseline_row = row.baseline_index().unwrap();
            return Some(
                columns
                    .iter()
                    .map(|column| missing_cell(column, baseline, baseline_row, comparators))
                    .collect(),
            );
        }
        if row.is_surplus() {
            if self.ignore_surplus_rows {
                return None;
            }
            let candidate_row = row.candidate_index().unwrap();
            return Some(
                columns
                    .iter()
                    .map(|column| surplus_cell(column, candidate, candidate_row, comparators))
                    .collect(),
            );
        }
        let baseline_row = row.baseline_index().unwrap();
        let candidate_row = row.candidate_index().unwrap();
        let cells = columns
            .iter()
            .map(|column| {
                if column.is_missing() {
                    return missing_cell(column, baseline, baseline_row, comparators);
                }
                if column.is_surplus() {
                    return surplus_cell(column, candidate, candidate_row, comparators);
                }
                let baseline_index = column.baseline_index().unwrap();
                let candidate_index = column.candidate_index().unwrap();
                let comparator = comparators.comparator_for(baseline.column_name(baseline_index));
                let baseline_value = baseline.value_at(baseline_row, baseline_index);
                let candidate_value = candidate.value_at(candidate_row, candidate_index);
                let cell = ResultCell::compared(comparator, &candidate_value, &baseline_value);
                // out-of-order status never overrides a genuine mismatch
                if (row.is_out_of_order() || column.is_out_of_order()) && cell.is_pass() {
                    return ResultCell::out_of_order(comparator.formatter(), &candidate_value);
                }
                cell
            })
            .collect();
        Some(cells)
    }
}

fn ensure_columns(table: &dyn Table, side: &str) -> Result<()> {
    if table.column_count() == 0 {
        return Err(TabreconError::no_columns(side));
    }
    Ok(())
}

fn header_row(
    columns: &[IndexMap],
    baseline: &dyn Table,
    candidate: &dyn Table,
    comparators: &ColumnComparators,
) -> Vec<ResultCell> {
    let comparator = comparators.default_comparator();
    columns
        .iter()
        .map(|column| {
            if column.is_missing() {
                let name = baseline.column_name(column.baseline_index().unwrap());
                return ResultCell::missing(comparator.formatter(), &Value::Text(name.to_string()));
            }
            if column.is_surplus() {
                let name = candidate.column_name(column.candidate_index().unwrap());
                return ResultCell::surplus(comparator.formatter(), &Value::Text(name.to_string()));
            }
            let baseline_name = Value::Text(
                baseline
                    .column_name(column.baseline_index().unwrap())
                    .to_string(),
            );
            let candidate_name = Value::Text(
                candidate
                    .column_name(column.candidate_index().unwrap())
                    .to_string(),
            );
            if column.is_out_of_order() {
                return ResultCell::out_of_order(comparator.formatter(), &candidate_name);
            }
            ResultCell::compared(comparator, &candidate_name, &baseline_name)
        })
        .collect()
}

fn collect_matching_rows(
    columns: &[IndexMap],
    results: &mut Vec<Vec<ResultCell>>,
    baseline: &dyn Table,
    candidate: &dyn Table,
    comparators: &ColumnComparators,
) {
    let min_rows = baseline.row_count().min(candidate.row_count());
    for row in 0..min_rows {
        match try_match_row(columns, baseline, candidate, comparators, row, row) {
            Some(cells) => results.push(cells),
            None => return,
        }
    }
}

fn collect_reverse_matching_rows(
    columns: &[IndexMap],
    baseline: &dyn Table,
    candidate: &dyn Table,
    comparators: &ColumnComparators,
    first_unmatched: usize,
) -> Vec<Vec<ResultCell>> {
    let mut collected = Vec::new();
    let mut baseline_row = baseline.row_count();
    let mut candidate_row = candidate.row_count();
    // never re-enter the forward-consumed region nor the first unmatched row
    while baseline_row > first_unmatched + 1 && candidate_row > first_unmatched + 1 {
        match try_match_row(
            columns,
            baseline,
            candidate,
            comparators,
            baseline_row - 1,
            candidate_row - 1,
        ) {
            Some(cells) => {
                collected.push(cells);
                baseline_row -= 1;
                candidate_row -= 1;
            }
            None => break,
        }
    }
    collected
}

/// Compares one baseline row against one candidate row across all aligned
/// columns. Returns the row's cells when every matched column passes; a
/// single mismatch abandons the row. Missing and surplus columns contribute
/// their cells but cannot fail the row.
fn try_match_row(
    columns: &[IndexMap],
    baseline: &dyn Table,
    candidate: &dyn Table,
    comparators: &ColumnComparators,
    baseline_row: usize,
    candidate_row: usize,
) -> Option<Vec<ResultCell>> {
    let mut cells = Vec::with_capacity(columns.len());
    for column in columns {
        if column.is_missing() {
            cells.push(missing_cell(column, baseline, baseline_row, comparators));
            continue;
        }
        if column.is_surplus() {
            cells.push(surplus_cell(column, candidate, candidate_row, comparators));
            continue;
        }
        let baseline_index = column.baseline_index().unwrap();
        let candidate_index = column.candidate_index().unwrap();
        let comparator = comparators.comparator_for(baseline.column_name(baseline_index));
        let baseline_value = baseline.value_at(baseline_row, baseline_index);
        let candidate_value = candidate.value_at(candidate_row, candidate_index);
        let cell = ResultCell::compared(comparator, &candidate_value, &baseline_value);
        if !cell.is_pass() {
            return None;
        }
        if column.is_out_of_order() {
            cells.push(ResultCell::out_of_order(comparator.formatter(), &candidate_value));
        } else {
            cells.push(cell);
        }
    }
    Some(cells)
}

fn missing_cell(
    column: &IndexMap,
    baseline: &dyn Table,
    baseline_row: usize,
    comparators: &ColumnComparators,
) -> ResultCell {
    match column.baseline_index() {
        Some(index) => {
            let comparator = comparators.comparator_for(baseline.column_name(index));
            ResultCell::missing(
                comparator.formatter(),
                &baseline.value_at(baseline_row, index),
            )
        }
        None => ResultCell::missing(comparators.default_comparator().formatter(), &Value::Null),
    }
}

fn surplus_cell(
    column: &IndexMap,
    candidate: &dyn Table,
    candidate_row: usize,
    comparators: &ColumnComparators,
) -> ResultCell {
    match column.candidate_index() {
        Some(index) => {
            let comparator = comparators.comparator_for(candidate.column_name(index));
            ResultCell::surplus(
                comparator.formatter(),
                &candidate.value_at(candidate_row, index),
            )
        }
        None => ResultCell::surplus(comparators.default_comparator().formatter(), &Value::Null),
    }
}

fn single_sided(
    table: &dyn Table,
    comparators: &ColumnComparators,
    cell: impl Fn(&crate::formatter::CellFormatter, &Value) -> ResultCell,
) -> Result<ResultTable> {
    let mut results = Vec::with_capacity(table.row_count() + 1);
    let headers = (0..table.column_count())
        .map(|c| {
            let comparator = comparators.comparator_for(table.column_name(c));
            cell(
                comparator.formatter(),
                &Value::Text(table.column_name(c).to_string()),
            )
        })
        .collect();
    results.push(headers);
    for row in 0..table.row_count() {
        results.push(
            (0..table.column_count())
                .map(|c| {
                    let comparator = comparators.comparator_for(table.column_name(c));
                    cell(comparator.formatter(), &table.value_at(row, c))
                })
                .collect(),
        );
    }
    Ok(ResultTable::new(
        vec![false; table.column_count()],
        results,
    ))
}
