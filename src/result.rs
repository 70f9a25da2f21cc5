//! Result cells and the assembled result grid
//!
//! Every cell of the reconciled grid is classified by a [`ResultCell`]
//! variant. All consumers (aggregation, reporting layers) match exhaustively
//! over exactly these cases.

use crate::comparator::{difference, variance_percent, CellComparator};
use crate::formatter::CellFormatter;
use crate::table::Value;
use serde::{Deserialize, Serialize};

/// Classification of a single cell in the result grid.
///
/// Formatted strings are carried rather than raw values so that the grid is
/// self-contained for downstream reporting; failed numeric cells additionally
/// carry the signed difference and the relative variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultCell {
    /// Values agree on a row and column present on both sides.
    Matched { value: String },
    /// Values agree but the row or column position diverges from the
    /// baseline order.
    OutOfOrder { value: String },
    /// Values disagree.
    Failed {
        baseline: String,
        candidate: String,
        difference: Option<f64>,
        variance: Option<f64>,
    },
    /// Present in the baseline only.
    Missing { baseline: String },
    /// Present in the candidate only.
    Surplus { candidate: String },
    /// Free-form text injected by an external layer.
    Custom { text: String },
    /// Aggregated distinct-value counts, produced by external reducers that
    /// summarize many comparisons.
    Summary {
        occurrences: Vec<(String, usize)>,
        truncated: bool,
    },
}

impl ResultCell {
    /// Compares a candidate value against a baseline value with the given
    /// comparator, yielding a `Matched` or `Failed` cell.
    pub fn compared(comparator: &CellComparator, candidate: &Value, baseline: &Value) -> Self {
        let formatter = comparator.formatter();
        if comparator.equals(candidate, baseline) {
            return ResultCell::Matched {
                value: formatter.format(candidate),
            };
        }
        let numeric = match (candidate.as_f64(), baseline.as_f64()) {
            (Some(c), Some(b)) if candidate.is_number() && baseline.is_number() => Some((c, b)),
            _ => None,
        };
        ResultCell::Failed {
            baseline: formatter.format(baseline),
            candidate: formatter.format(candidate),
            difference: numeric.map(|(c, b)| difference(c, b)),
            variance: numeric.map(|(c, b)| variance_percent(c, b)),
        }
    }

    pub fn missing(formatter: &CellFormatter, baseline: &Value) -> Self {
        ResultCell::Missing {
            baseline: formatter.format(baseline),
        }
    }

    pub fn surplus(formatter: &CellFormatter, candidate: &Value) -> Self {
        ResultCell::Surplus {
            candidate: formatter.format(candidate),
        }
    }

    pub fn out_of_order(formatter: &CellFormatter, value: &Value) -> Self {
        ResultCell::OutOfOrder {
            value: formatter.format(value),
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        ResultCell::Custom { text: text.into() }
    }

    /// True for cells whose values agree, in or out of order.
    pub fn is_pass(&self) -> bool {
        matches!(self, ResultCell::Matched { .. } | ResultCell::OutOfOrder { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResultCell::Failed { .. })
    }
}

/// The reconciled grid: a header row followed by data rows, with aggregate
/// counts and a per-column presentation hint derived at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    key_columns: Vec<bool>,
    rows: Vec<Vec<ResultCell>>,
    matched_columns_ahead: Vec<usize>,
    total_cell_count: usize,
    passed_cell_count: usize,
}

impl ResultTable {
    /// Builds the table from a header row plus data rows, accumulating the
    /// pass/total counts and the matched-columns-ahead hint in one scan.
    pub fn new(key_columns: Vec<bool>, rows: Vec<Vec<ResultCell>>) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let mut fully_matched = vec![true; width];
        let mut total = 0;
        let mut passed = 0;
        let mut header_row = true;
        for row in &rows {
            for (col, cell) in row.iter().enumerate() {
                total += 1;
                let is_pass = cell.is_pass();
                if is_pass {
                    passed += 1;
                }
                // the header row requires a matching header, data rows only a
                // non-failed cell
                let column_ok = if header_row { is_pass } else { !cell.is_failed() };
                fully_matched[col] &= !key_columns[col] && column_ok;
            }
            header_row = false;
        }

        let mut matched_columns_ahead = vec![0; width];
        for col in 0..width {
            if fully_matched[col] {
                matched_columns_ahead[col] = fully_matched[col + 1..]
                    .iter()
                    .take_while(|&&matched| matched)
                    .count();
            }
        }

        Self {
            key_columns,
            rows,
            matched_columns_ahead,
            total_cell_count: total,
            passed_cell_count: passed,
        }
    }

    /// True when every cell, headers included, passed.
    pub fn is_success(&self) -> bool {
        self.total_cell_count == self.passed_cell_count
    }

    pub fn total_cell_count(&self) -> usize {
        self.total_cell_count
    }

    pub fn passed_cell_count(&self) -> usize {
        self.passed_cell_count
    }

    /// Header row (row 0).
    pub fn headers(&self) -> &[ResultCell] {
        &self.rows[0]
    }

    /// All rows including the header row.
    pub fn rows(&self) -> &[Vec<ResultCell>] {
        &self.rows
    }

    pub fn is_key_column(&self, column: usize) -> bool {
        self.key_columns[column]
    }

    /// Number of consecutive fully-matched, non-key columns immediately
    /// following `column`. A presentation hint only.
    pub fn matched_columns_ahead(&self, column: usize) -> usize {
        self.matched_columns_ahead[column]
    }
}
