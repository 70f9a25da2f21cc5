//! Per-column comparison strategies
//!
//! A [`CellComparator`] decides whether two raw values agree. The closed set
//! of strategies (default, tolerance, variance) is selected per column when
//! [`ColumnComparators`] is built, never re-dispatched per cell.

use crate::error::{Result, TabreconError};
use crate::formatter::CellFormatter;
use crate::table::Value;
use indexmap::IndexMap as OrderedMap;

/// Tolerance used for formatting precision when none is configured.
pub const DEFAULT_TOLERANCE: f64 = 1.0e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Strategy {
    /// Equal iff canonical strings are equal.
    Default,
    /// Additionally equal if both floats differ by no more than the tolerance.
    Tolerance(f64),
    /// Additionally equal if the relative percentage difference of two floats
    /// is within the threshold.
    Variance(f64),
}

/// A per-column comparison strategy paired with its formatter.
#[derive(Debug, Clone)]
pub struct CellComparator {
    strategy: Strategy,
    formatter: CellFormatter,
}

impl CellComparator {
    fn new(strategy: Strategy, formatter: CellFormatter) -> Self {
        Self {
            strategy,
            formatter,
        }
    }

    pub fn formatter(&self) -> &CellFormatter {
        &self.formatter
    }

    /// Compares a candidate value against a baseline value.
    pub fn equals(&self, candidate: &Value, baseline: &Value) -> bool {
        if self.formatter.format(candidate) == self.formatter.format(baseline) {
            return true;
        }
        match self.strategy {
            Strategy::Default => false,
            Strategy::Tolerance(tolerance) => match (candidate, baseline) {
                (Value::Float(c), Value::Float(b)) => c == b || (c - b).abs() <= tolerance,
                _ => false,
            },
            Strategy::Variance(threshold) => match (candidate, baseline) {
                (Value::Float(c), Value::Float(b)) => {
                    c == b || variance_percent(*c, *b).abs() <= threshold
                }
                _ => false,
            },
        }
    }
}

/// Signed difference reported for failed numeric cells.
pub(crate) fn difference(candidate: f64, baseline: f64) -> f64 {
    baseline - candidate
}

/// Relative percentage difference of a candidate value from its baseline.
pub(crate) fn variance_percent(candidate: f64, baseline: f64) -> f64 {
    (candidate - baseline) / baseline * 100.0
}

/// Registry of comparators: one default plus per-column overrides looked up by
/// exact column name. Built once per comparison and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ColumnComparators {
    default: CellComparator,
    by_column: OrderedMap<String, CellComparator>,
}

impl ColumnComparators {
    pub fn builder() -> ColumnComparatorsBuilder {
        ColumnComparatorsBuilder::default()
    }

    pub fn default_comparator(&self) -> &CellComparator {
        &self.default
    }

    /// Comparator for the given column, falling back to the default when no
    /// override is configured.
    pub fn comparator_for(&self, column_name: &str) -> &CellComparator {
        self.by_column.get(column_name).unwrap_or(&self.default)
    }
}

/// Collects tolerance and variance configuration before validation.
///
/// When both a tolerance and a variance threshold apply to a column the
/// variance strategy decides equality; the tolerance still drives formatting
/// precision.
#[derive(Debug, Clone, Default)]
pub struct ColumnComparatorsBuilder {
    default_tolerance: Option<f64>,
    default_variance: Option<f64>,
    tolerances: OrderedMap<String, f64>,
    variances: OrderedMap<String, f64>,
    grouping: Option<bool>,
}

impl ColumnComparatorsBuilder {
    pub fn with_tolerance(&mut self, tolerance: f64) -> &mut Self {
        self.default_tolerance = Some(tolerance);
        self
    }

    pub fn with_column_tolerance(&mut self, column_name: impl Into<String>, tolerance: f64) -> &mut Self {
        self.tolerances.insert(column_name.into(), tolerance);
        self
    }

    pub fn with_variance_threshold(&mut self, variance: f64) -> &mut Self {
        self.default_variance = Some(variance);
        self
    }

    pub fn with_column_variance_threshold(&mut self, column_name: impl Into<String>, variance: f64) -> &mut Self {
        self.variances.insert(column_name.into(), variance);
        self
    }

    pub fn with_number_grouping(&mut self, grouping: bool) -> &mut Self {
        self.grouping = Some(grouping);
        self
    }

    pub fn build(&self) -> Result<ColumnComparators> {
        for (label, threshold) in self
            .default_tolerance
            .iter()
            .chain(self.tolerances.values())
            .map(|t| ("tolerance", *t))
            .chain(
                self.default_variance
                    .iter()
                    .chain(self.variances.values())
                    .map(|v| ("variance threshold", *v)),
            )
        {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(TabreconError::config(format!(
                    "{} must be a positive finite number, got {}",
                    label, threshold
                )));
            }
        }

        let grouping = self.grouping.unwrap_or(true);
        let default = self.build_comparator(None, None, grouping);

        let mut by_column = OrderedMap::new();
        for column in self.tolerances.keys().chain(self.variances.keys()) {
            if by_column.contains_key(column) {
                continue;
            }
            by_column.insert(
                column.clone(),
                self.build_comparator(
                    self.tolerances.get(column).copied(),
                    self.variances.get(column).copied(),
                    grouping,
                ),
            );
        }

        Ok(ColumnComparators { default, by_column })
    }

    /// Column-specific settings take precedence over the defaults; at equal
    /// specificity a variance threshold decides equality while the tolerance
    /// still drives formatting precision.
    fn build_comparator(
        &self,
        column_tolerance: Option<f64>,
        column_variance: Option<f64>,
        grouping: bool,
    ) -> CellComparator {
        let formatter_tolerance = column_tolerance
            .or(self.default_tolerance)
            .unwrap_or(DEFAULT_TOLERANCE);
        let strategy = if let Some(variance) = column_variance {
            Strategy::Variance(variance)
        } else if let Some(tolerance) = column_tolerance {
            Strategy::Tolerance(tolerance)
        } else if let Some(variance) = self.default_variance {
            Strategy::Variance(variance)
        } else if let Some(tolerance) = self.default_tolerance {
            Strategy::Tolerance(tolerance)
        } else {
            Strategy::Default
        };
        CellComparator::new(strategy, CellFormatter::new(formatter_tolerance, grouping))
    }
}
