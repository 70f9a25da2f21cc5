//! Index pairings between baseline and candidate positions
//!
//! An [`IndexMap`] describes how one row (or column) of the baseline aligns
//! with one row (or column) of the candidate. Exactly one side may be absent:
//! baseline-only entries are missing, candidate-only entries are surplus.
//! The same type serves column alignment and row alignment.

use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMap {
    baseline: Option<usize>,
    candidate: Option<usize>,
    out_of_order: bool,
}

impl IndexMap {
    pub fn matched(baseline: usize, candidate: usize) -> Self {
        Self {
            baseline: Some(baseline),
            candidate: Some(candidate),
            out_of_order: false,
        }
    }

    pub fn missing(baseline: usize) -> Self {
        Self {
            baseline: Some(baseline),
            candidate: None,
            out_of_order: false,
        }
    }

    pub fn surplus(candidate: usize) -> Self {
        Self {
            baseline: None,
            candidate: Some(candidate),
            out_of_order: false,
        }
    }

    pub fn baseline_index(&self) -> Option<usize> {
        self.baseline
    }

    pub fn candidate_index(&self) -> Option<usize> {
        self.candidate
    }

    pub fn is_matched(&self) -> bool {
        self.baseline.is_some() && self.candidate.is_some()
    }

    pub fn is_missing(&self) -> bool {
        self.baseline.is_some() && self.candidate.is_none()
    }

    pub fn is_surplus(&self) -> bool {
        self.candidate.is_some() && self.baseline.is_none()
    }

    pub fn is_out_of_order(&self) -> bool {
        self.out_of_order
    }

    pub(crate) fn set_out_of_order(&mut self) {
        self.out_of_order = true;
    }

    /// Index used for final ordering: matched and surplus entries sort by
    /// candidate position, missing entries by baseline position.
    fn sort_index(&self) -> usize {
        if self.is_missing() {
            self.baseline.unwrap()
        } else {
            self.candidate.unwrap()
        }
    }

    /// Tie rank on equal sort indices: surplus sorts before missing, and
    /// one-sided entries slot in ahead of a matched entry sharing the index.
    fn sort_rank(&self) -> u8 {
        if self.is_surplus() {
            0
        } else if self.is_missing() {
            1
        } else {
            2
        }
    }
}

impl Ord for IndexMap {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_index()
            .cmp(&other.sort_index())
            .then_with(|| self.sort_rank().cmp(&other.sort_rank()))
            .then_with(|| self.baseline.cmp(&other.baseline))
            .then_with(|| self.candidate.cmp(&other.candidate))
            .then_with(|| self.out_of_order.cmp(&other.out_of_order))
    }
}

impl PartialOrd for IndexMap {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Flags entries whose baseline position violates strictly ascending order.
///
/// Walks the entries tracking the set of baseline indices still expected; an
/// entry is in order only if it carries the next unconsumed baseline index,
/// with the pointer advancing past gaps left by indices no longer present.
/// Entries appearing before their turn are flagged without aborting the scan.
pub(crate) fn identify_out_of_order(entries: &mut [IndexMap], mut next_baseline: usize) {
    let mut pending: HashSet<usize> = entries
        .iter()
        .filter(|e| !e.is_surplus())
        .map(|e| e.baseline_index().unwrap())
        .collect();
    for entry in entries.iter_mut().filter(|e| !e.is_surplus()) {
        let baseline = entry.baseline_index().unwrap();
        pending.remove(&baseline);
        if baseline == next_baseline {
            while !pending.contains(&next_baseline) && !pending.is_empty() {
                next_baseline += 1;
            }
        } else {
            entry.set_out_of_order();
        }
    }
}

/// Handle into an [`UnmatchedPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(usize);

#[derive(Debug, Clone, Copy)]
struct MatchCandidate {
    score: i64,
    peer: RowHandle,
}

#[derive(Debug)]
struct UnmatchedRow {
    entry: IndexMap,
    candidates: Vec<MatchCandidate>,
    best_mutual: Option<RowHandle>,
}

/// Arena of rows left missing or surplus after hash matching.
///
/// Partial matchers record scored candidate edges between missing and surplus
/// rows here; [`UnmatchedPool::link_best_matches`] then resolves them into
/// permanent mutual-best pairings. Candidate edges and resolved matches are
/// only ever touched by the single matching thread.
#[derive(Debug, Default)]
pub struct UnmatchedPool {
    rows: Vec<UnmatchedRow>,
}

impl UnmatchedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_missing(&mut self, baseline: usize) -> RowHandle {
        self.add(IndexMap::missing(baseline))
    }

    pub fn add_surplus(&mut self, candidate: usize) -> RowHandle {
        self.add(IndexMap::surplus(candidate))
    }

    fn add(&mut self, entry: IndexMap) -> RowHandle {
        let handle = RowHandle(self.rows.len());
        self.rows.push(UnmatchedRow {
            entry,
            candidates: Vec::new(),
            best_mutual: None,
        });
        handle
    }

    pub fn entry(&self, handle: RowHandle) -> &IndexMap {
        &self.rows[handle.0].entry
    }

    pub fn best_mutual_match(&self, handle: RowHandle) -> Option<RowHandle> {
        self.rows[handle.0].best_mutual
    }

    /// Records a scored candidate pairing on both rows.
    pub fn add_candidate(&mut self, missing: RowHandle, score: i64, surplus: RowHandle) {
        debug_assert!(self.rows[missing.0].entry.is_missing());
        debug_assert!(self.rows[surplus.0].entry.is_surplus());
        self.rows[missing.0].candidates.push(MatchCandidate {
            score,
            peer: surplus,
        });
        self.rows[surplus.0].candidates.push(MatchCandidate {
            score,
            peer: missing,
        });
    }

    /// Repeatedly binds mutually-best candidate pairs until a full pass over
    /// the missing rows produces no new binding. Ties on score prefer the
    /// peer with the larger row index; rows without a mutual best remain
    /// unmatched.
    pub fn link_best_matches(&mut self, missing: &[RowHandle]) {
        let own_index: Vec<usize> = self.rows.iter().map(|row| row.entry.sort_index()).collect();
        for row in &mut self.rows {
            row.candidates.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then_with(|| own_index[b.peer.0].cmp(&own_index[a.peer.0]))
            });
        }
        let mut keep_matching = true;
        while keep_matching {
            keep_matching = false;
            for &handle in missing {
                keep_matching |= self.bind_if_mutual(handle);
            }
        }
    }

    fn bind_if_mutual(&mut self, handle: RowHandle) -> bool {
        if self.rows[handle.0].best_mutual.is_some() {
            return false;
        }
        let Some(this_best) = self.best_candidate(handle) else {
            return false;
        };
        if self.best_candidate(this_best) == Some(handle) {
            self.rows[handle.0].best_mutual = Some(this_best);
            self.rows[handle.0].candidates.clear();
            self.rows[this_best.0].best_mutual = Some(handle);
            self.rows[this_best.0].candidates.clear();
            return true;
        }
        false
    }

    /// Highest-ranked candidate whose peer has not been bound yet.
    fn best_candidate(&self, handle: RowHandle) -> Option<RowHandle> {
        self.rows[handle.0]
            .candidates
            .iter()
            .find(|c| self.rows[c.peer.0].best_mutual.is_none())
            .map(|c| c.peer)
    }
}
