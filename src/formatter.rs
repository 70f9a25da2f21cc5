//! Canonical cell formatting
//!
//! Every value that takes part in a comparison is first rendered to a
//! canonical string: row hash keys, grouping keys, and result cells all go
//! through the same [`CellFormatter`], so two values compare equal under the
//! default strategy exactly when their canonical strings are equal.

use crate::table::Value;

/// Upper bound on fraction digits regardless of how tight the tolerance is.
const MAX_FRACTION_DIGITS: usize = 17;

/// Formats cell values into canonical strings.
///
/// Numbers are rendered with a precision derived from the tolerance: a
/// tolerance of `0.01` keeps two fraction digits, `1.0` keeps none. Trailing
/// zeros are trimmed and a bare `-0` is normalized to `0` so that values
/// rounding to zero from either side produce the same key.
#[derive(Debug, Clone)]
pub struct CellFormatter {
    tolerance: f64,
    max_fraction_digits: usize,
    grouping: bool,
}

impl CellFormatter {
    pub fn new(tolerance: f64, grouping: bool) -> Self {
        let meaningful_digits = (-tolerance.log10()).ceil();
        let max_fraction_digits = if meaningful_digits > 0.0 {
            (meaningful_digits as usize).min(MAX_FRACTION_DIGITS)
        } else {
            0
        };
        Self {
            tolerance,
            max_fraction_digits,
            grouping,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::Float(f) => self.format_float(*f),
            Value::Integer(i) => self.format_integer(*i),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Null => String::new(),
            Value::Text(s) => normalize_string(s),
        }
    }

    /// Formats a raw float, used for difference/variance payloads on failed
    /// numeric cells.
    pub fn format_f64(&self, value: f64) -> String {
        self.format_float(value)
    }

    fn format_float(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "∞" } else { "-∞" }.to_string();
        }
        let mut formatted = format!("{:.*}", self.max_fraction_digits, value);
        if formatted.contains('.') {
            formatted.truncate(formatted.trim_end_matches('0').trim_end_matches('.').len());
        }
        if formatted == "-0" {
            return "0".to_string();
        }
        if self.grouping {
            return group_number(&formatted);
        }
        formatted
    }

    fn format_integer(&self, value: i64) -> String {
        let formatted = value.to_string();
        if self.grouping {
            return group_number(&formatted);
        }
        formatted
    }
}

/// Trims the value and collapses internal whitespace runs to single spaces.
fn normalize_string(untrimmed: &str) -> String {
    let value = untrimmed.trim();
    if value.chars().all(|c| !c.is_whitespace()) {
        return value.to_string();
    }
    let mut result = String::with_capacity(value.len());
    let mut in_whitespace = false;
    for c in value.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                result.push(' ');
            }
            in_whitespace = true;
        } else {
            result.push(c);
            in_whitespace = false;
        }
    }
    result
}

/// Inserts thousands separators into the integer part of an already-formatted
/// number.
fn group_number(formatted: &str) -> String {
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(dot) => (&rest[..dot], &rest[dot..]),
        None => (rest, ""),
    };
    if int_part.len() <= 3 {
        return formatted.to_string();
    }
    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    grouped.push_str(sign);
    let offset = int_part.len() % 3;
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && i % 3 == offset % 3 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(frac_part);
    grouped
}
