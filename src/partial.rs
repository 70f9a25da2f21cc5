//! Heuristic fuzzy matching of leftover rows
//!
//! After hash matching, rows left missing or surplus are handed to a chain of
//! partial matchers: a time-bound wrapper, key-column grouping when the
//! candidate table declares key columns, adaptive selectivity grouping for
//! large groups, and an exhaustive best-match scorer at the leaves. Rows the
//! chain cannot bind stay classified missing or surplus; that is an expected
//! outcome of the heuristic, not an error.

use crate::comparator::ColumnComparators;
use crate::index_map::{IndexMap, RowHandle, UnmatchedPool};
use crate::rows::{formatted_value, row_key, Side};
use crate::table::Table;
use indexmap::IndexMap as OrderedMap;
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Cooperative deadline for the partial matching phase.
///
/// Checked at phase-entry granularity only: before each grouping step and
/// before each exhaustive leaf invocation. A leaf already in progress runs to
/// completion, so wall-clock usage can exceed the budget by one leaf.
#[derive(Debug, Clone, Copy)]
pub struct MatchBudget {
    deadline: Option<Instant>,
}

impl MatchBudget {
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    pub fn expires_in(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// A stage of the partial matching chain.
pub trait PartialMatcher {
    fn match_rows(
        &self,
        missing: &[RowHandle],
        surplus: &[RowHandle],
        matched_columns: &[IndexMap],
        pool: &mut UnmatchedPool,
        budget: &MatchBudget,
    );
}

/// Starts the cooperative deadline and delegates to the inner chain.
pub struct TimeBoundPartialMatcher<'a> {
    inner: Box<dyn PartialMatcher + 'a>,
    timeout: Duration,
}

impl<'a> TimeBoundPartialMatcher<'a> {
    pub fn new(inner: Box<dyn PartialMatcher + 'a>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl PartialMatcher for TimeBoundPartialMatcher<'_> {
    fn match_rows(
        &self,
        missing: &[RowHandle],
        surplus: &[RowHandle],
        matched_columns: &[IndexMap],
        pool: &mut UnmatchedPool,
        _budget: &MatchBudget,
    ) {
        let budget = MatchBudget::expires_in(self.timeout);
        self.inner
            .match_rows(missing, surplus, matched_columns, pool, &budget);
    }
}

/// Groups missing and surplus rows by the formatted values of the candidate
/// table's key columns and matches each shared group independently. Rows
/// outside any shared key group are left unmatched.
pub struct KeyColumnPartialMatcher<'a> {
    baseline: &'a dyn Table,
    candidate: &'a dyn Table,
    comparators: &'a ColumnComparators,
    inner: Box<dyn PartialMatcher + 'a>,
}

impl<'a> KeyColumnPartialMatcher<'a> {
    pub fn new(
        baseline: &'a dyn Table,
        candidate: &'a dyn Table,
        comparators: &'a ColumnComparators,
        inner: Box<dyn PartialMatcher + 'a>,
    ) -> Self {
        Self {
            baseline,
            candidate,
            comparators,
            inner,
        }
    }
}

impl PartialMatcher for KeyColumnPartialMatcher<'_> {
    fn match_rows(
        &self,
        missing: &[RowHandle],
        surplus: &[RowHandle],
        matched_columns: &[IndexMap],
        pool: &mut UnmatchedPool,
        budget: &MatchBudget,
    ) {
        let key_columns: Vec<IndexMap> = matched_columns
            .iter()
            .filter(|column| {
                column.is_matched() && self.candidate.is_key_column(column.candidate_index().unwrap())
            })
            .cloned()
            .collect();
        if key_columns.is_empty() {
            warn!("No key columns found!");
            return;
        }

        let mut missing_by_key: OrderedMap<String, Vec<RowHandle>> = OrderedMap::new();
        for &handle in missing {
            let row = pool.entry(handle).baseline_index().unwrap();
            let key = row_key(self.baseline, Side::Baseline, row, &key_columns, self.comparators);
            missing_by_key.entry(key).or_default().push(handle);
        }
        let mut surplus_by_key: OrderedMap<String, Vec<RowHandle>> = OrderedMap::new();
        for &handle in surplus {
            let row = pool.entry(handle).candidate_index().unwrap();
            let key = row_key(self.candidate, Side::Candidate, row, &key_columns, self.comparators);
            surplus_by_key.entry(key).or_default().push(handle);
        }

        for (key, missing_group) in &missing_by_key {
            if budget.is_expired() {
                warn!("Partial match timeout exceeded, abandoning key-column matching");
                return;
            }
            if let Some(surplus_group) = surplus_by_key.get(key) {
                self.inner
                    .match_rows(missing_group, surplus_group, matched_columns, pool, budget);
            }
        }
    }
}

/// Work item of the adaptive matcher: a missing/surplus group and the depth
/// into the selectivity-ordered column list already used to form it.
struct GroupWork {
    missing: Vec<RowHandle>,
    surplus: Vec<RowHandle>,
    depth: usize,
}

/// Partitions oversized groups by their most selective column before handing
/// them to the exhaustive best-match scorer.
///
/// Selectivity of a column is the number of distinct formatted values shared
/// between the missing and surplus sides. Floating-point columns are skipped:
/// exact value grouping is unlikely to hold for them and would undermine
/// tolerant matching. Groups are processed from an explicit worklist rather
/// than by recursion, and a column used at one level is never reused deeper.
pub struct AdaptivePartialMatcher<'a> {
    baseline: &'a dyn Table,
    candidate: &'a dyn Table,
    comparators: &'a ColumnComparators,
    best_match_threshold: u64,
}

impl<'a> AdaptivePartialMatcher<'a> {
    pub fn new(
        baseline: &'a dyn Table,
        candidate: &'a dyn Table,
        comparators: &'a ColumnComparators,
        best_match_threshold: u64,
    ) -> Self {
        Self {
            baseline,
            candidate,
            comparators,
            best_match_threshold,
        }
    }

    fn table_for(&self, side: Side) -> &'a dyn Table {
        match side {
            Side::Baseline => self.baseline,
            Side::Candidate => self.candidate,
        }
    }

    fn row_index(&self, pool: &UnmatchedPool, side: Side, handle: RowHandle) -> usize {
        match side {
            Side::Baseline => pool.entry(handle).baseline_index().unwrap(),
            Side::Candidate => pool.entry(handle).candidate_index().unwrap(),
        }
    }

    fn distinct_values(
        &self,
        rows: &[RowHandle],
        side: Side,
        column: &IndexMap,
        pool: &UnmatchedPool,
    ) -> HashSet<String> {
        let table = self.table_for(side);
        let Some(&first) = rows.first() else {
            return HashSet::new();
        };
        let first_row = self.row_index(pool, side, first);
        let column_index = side.column_index(column).unwrap();
        if table.value_at(first_row, column_index).is_float() {
            return HashSet::new();
        }
        rows.iter()
            .map(|&handle| {
                let row = self.row_index(pool, side, handle);
                formatted_value(table, side, row, column, self.comparators)
            })
            .collect()
    }

    fn columns_by_selectivity(
        &self,
        missing: &[RowHandle],
        surplus: &[RowHandle],
        matched_columns: &[IndexMap],
        pool: &UnmatchedPool,
    ) -> Vec<IndexMap> {
        info!("Calculating column selectivity");
        let mut selectivities: Vec<(IndexMap, usize)> = Vec::new();
        for column in matched_columns {
            let missing_values = self.distinct_values(missing, Side::Baseline, column, pool);
            let surplus_values = self.distinct_values(surplus, Side::Candidate, column, pool);
            let selectivity = missing_values.intersection(&surplus_values).count();
            if selectivity > 0 {
                selectivities.push((column.clone(), selectivity));
            }
        }
        // stable sort keeps original column order on selectivity ties
        selectivities.sort_by(|a, b| b.1.cmp(&a.1));
        selectivities.into_iter().map(|(column, _)| column).collect()
    }

    fn group_by_column(
        &self,
        rows: &[RowHandle],
        side: Side,
        column: &IndexMap,
        pool: &UnmatchedPool,
    ) -> OrderedMap<String, Vec<RowHandle>> {
        let table = self.table_for(side);
        let mut groups: OrderedMap<String, Vec<RowHandle>> = OrderedMap::new();
        for &handle in rows {
            let row = self.row_index(pool, side, handle);
            let key = formatted_value(table, side, row, column, self.comparators);
            groups.entry(key).or_default().push(handle);
        }
        groups
    }
}

impl PartialMatcher for AdaptivePartialMatcher<'_> {
    fn match_rows(
        &self,
        missing: &[RowHandle],
        surplus: &[RowHandle],
        matched_columns: &[IndexMap],
        pool: &mut UnmatchedPool,
        budget: &MatchBudget,
    ) {
        let leaf = BestMatchPartialMatcher::new(self.baseline, self.candidate, self.comparators);
        let mut ordered_columns: Option<Vec<IndexMap>> = None;
        let mut worklist = VecDeque::new();
        worklist.push_back(GroupWork {
            missing: missing.to_vec(),
            surplus: surplus.to_vec(),
            depth: 0,
        });

        while let Some(work) = worklist.pop_front() {
            if budget.is_expired() {
                warn!(
                    "Partial match timeout exceeded, abandoning {} remaining groups",
                    worklist.len() + 1
                );
                return;
            }
            if (work.missing.len() as u64) * (work.surplus.len() as u64) <= self.best_match_threshold
            {
                debug!(
                    "Matching {} missing and {} surplus rows using best-match algorithm",
                    work.missing.len(),
                    work.surplus.len()
                );
                leaf.match_rows(&work.missing, &work.surplus, matched_columns, pool, budget);
                continue;
            }
            if ordered_columns.is_none() {
                ordered_columns = Some(self.columns_by_selectivity(
                    &work.missing,
                    &work.surplus,
                    matched_columns,
                    pool,
                ));
            }
            let columns = ordered_columns.as_deref().unwrap_or_default();
            if work.depth >= columns.len() {
                info!(
                    "Matching remaining {} missing and {} surplus rows using best-match algorithm",
                    work.missing.len(),
                    work.surplus.len()
                );
                leaf.match_rows(&work.missing, &work.surplus, matched_columns, pool, budget);
                continue;
            }
            let column = columns[work.depth].clone();
            info!(
                "Grouping by '{}' column",
                self.candidate.column_name(column.candidate_index().unwrap())
            );
            let missing_groups = self.group_by_column(&work.missing, Side::Baseline, &column, pool);
            let mut surplus_groups =
                self.group_by_column(&work.surplus, Side::Candidate, &column, pool);
            for (key, missing_group) in missing_groups {
                debug!("Matching '{}'", key);
                if let Some(surplus_group) = surplus_groups.swap_remove(&key) {
                    worklist.push_back(GroupWork {
                        missing: missing_group,
                        surplus: surplus_group,
                        depth: work.depth + 1,
                    });
                }
            }
        }
    }
}

/// Exhaustively scores every missing x surplus pair within a group and binds
/// mutually-best pairs.
///
/// A pair's score sums, over the matched columns whose values agree per that
/// column's comparator, the square of the column's distance from the end of
/// the alignment: columns earlier in alignment order weigh quadratically
/// more, biasing toward likely key columns. The greedy mutual-best resolution
/// is a heuristic, not an optimal assignment; ties with no mutual maximum
/// stay unmatched.
pub struct BestMatchPartialMatcher<'a> {
    baseline: &'a dyn Table,
    candidate: &'a dyn Table,
    comparators: &'a ColumnComparators,
}

impl<'a> BestMatchPartialMatcher<'a> {
    pub fn new(
        baseline: &'a dyn Table,
        candidate: &'a dyn Table,
        comparators: &'a ColumnComparators,
    ) -> Self {
        Self {
            baseline,
            candidate,
            comparators,
        }
    }
}

impl PartialMatcher for BestMatchPartialMatcher<'_> {
    fn match_rows(
        &self,
        missing: &[RowHandle],
        surplus: &[RowHandle],
        matched_columns: &[IndexMap],
        pool: &mut UnmatchedPool,
        budget: &MatchBudget,
    ) {
        if budget.is_expired() {
            warn!(
                "Partial match timeout exceeded, leaving {} missing and {} surplus rows unmatched",
                missing.len(),
                surplus.len()
            );
            return;
        }
        for &missing_handle in missing {
            let baseline_row = pool.entry(missing_handle).baseline_index().unwrap();
            for &surplus_handle in surplus {
                let candidate_row = pool.entry(surplus_handle).candidate_index().unwrap();
                let mut score: i64 = 0;
                for (position, column) in matched_columns.iter().enumerate() {
                    let baseline_index = column.baseline_index().unwrap();
                    let candidate_index = column.candidate_index().unwrap();
                    let baseline_value = self.baseline.value_at(baseline_row, baseline_index);
                    let candidate_value = self.candidate.value_at(candidate_row, candidate_index);
                    let comparator = self
                        .comparators
                        .comparator_for(self.baseline.column_name(baseline_index));
                    if comparator.equals(&candidate_value, &baseline_value) {
                        let inverse_column_number = (matched_columns.len() - position) as i64;
                        score += inverse_column_number * inverse_column_number;
                    }
                }
                if score > 0 {
                    pool.add_candidate(missing_handle, score, surplus_handle);
                }
            }
        }
        pool.link_best_matches(missing);
    }
}
