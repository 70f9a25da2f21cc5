//! Generic duplicate-aware sequence alignment
//!
//! Pairs two ordered sequences of keyed items in O(n + m): a FIFO queue of
//! positions per distinct key is built from the candidate sequence, then one
//! walk over the baseline pops the earliest unconsumed candidate position
//! sharing each item's key. The same routine aligns column-name sequences and
//! row-hash sequences.

use crate::index_map::IndexMap;
use indexmap::IndexMap as OrderedMap;
use std::collections::VecDeque;
use std::hash::Hash;

/// Outcome of aligning two keyed sequences.
///
/// `matched` is in baseline walk order; `missing` holds baseline positions in
/// ascending order; `surplus` holds unconsumed candidate positions in
/// ascending order. Together they partition both index spaces.
#[derive(Debug)]
pub struct SequenceAlignment {
    pub matched: Vec<IndexMap>,
    pub missing: Vec<usize>,
    pub surplus: Vec<usize>,
}

impl SequenceAlignment {
    /// All entries as index maps, sorted by the final presentation order.
    pub fn into_sorted_entries(self) -> Vec<IndexMap> {
        let mut all = self.matched;
        all.extend(self.missing.into_iter().map(IndexMap::missing));
        all.extend(self.surplus.into_iter().map(IndexMap::surplus));
        all.sort();
        all
    }
}

/// Aligns `baseline` against `candidate`, numbering both sides starting at
/// `initial_index` so that a sub-range of table rows keeps its table indices.
///
/// Duplicate keys pair first-occurrence-to-first-occurrence: a key occurring
/// k times on the baseline side and m times on the candidate side yields
/// exactly min(k, m) matches.
pub fn align<K: Eq + Hash>(
    baseline: &[K],
    candidate: &[K],
    initial_index: usize,
) -> SequenceAlignment {
    let mut positions: OrderedMap<&K, VecDeque<usize>> = OrderedMap::new();
    for (offset, key) in candidate.iter().enumerate() {
        positions
            .entry(key)
            .or_default()
            .push_back(initial_index + offset);
    }

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut consumed = vec![false; candidate.len()];
    for (offset, key) in baseline.iter().enumerate() {
        let baseline_index = initial_index + offset;
        match positions.get_mut(key).and_then(VecDeque::pop_front) {
            Some(candidate_index) => {
                consumed[candidate_index - initial_index] = true;
                matched.push(IndexMap::matched(baseline_index, candidate_index));
            }
            None => missing.push(baseline_index),
        }
    }

    let surplus = consumed
        .iter()
        .enumerate()
        .filter(|(_, &used)| !used)
        .map(|(offset, _)| initial_index + offset)
        .collect();

    SequenceAlignment {
        matched,
        missing,
        surplus,
    }
}
