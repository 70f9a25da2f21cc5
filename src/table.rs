//! Table abstraction and cell values
//!
//! Data sources must be adapted to the [`Table`] trait in order to be
//! reconciled. [`ListTable`] is a simple vec-backed implementation suitable
//! for in-memory data and tests.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single cell value.
///
/// The distinction between `Integer` and `Float` matters: numeric tolerance
/// and variance comparison apply to floating-point values only, and
/// floating-point columns are excluded from selectivity-based grouping during
/// partial matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl Value {
    /// True for `Float` values only.
    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// True for `Integer` and `Float` values.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Numeric view of this value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(d) => write!(f, "{}", d),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// The table model that [`TableComparator`](crate::TableComparator) is able to
/// reconcile.
///
/// A table must not be mutated for the duration of a single comparison.
pub trait Table {
    /// Number of data rows, excluding column headers.
    fn row_count(&self) -> usize;

    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Column name at a zero-based index.
    fn column_name(&self, column_index: usize) -> &str;

    /// Value at a zero-based row and column index.
    fn value_at(&self, row_index: usize, column_index: usize) -> Value;

    /// Whether the column at the given index is part of the table's natural
    /// key. Key columns bound the search space of partial matching and are
    /// excluded from the matched-columns-ahead presentation hint.
    fn is_key_column(&self, _column_index: usize) -> bool {
        false
    }
}

/// Returns true if any column of `table` is declared a key column.
pub(crate) fn has_key_columns(table: &dyn Table) -> bool {
    (0..table.column_count()).any(|c| table.is_key_column(c))
}

/// A vec-backed [`Table`] with optional key columns, identified by name.
#[derive(Debug, Clone)]
pub struct ListTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
    key_columns: HashSet<String>,
}

impl ListTable {
    pub fn new<S: Into<String>>(headers: Vec<S>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows,
            key_columns: HashSet::new(),
        }
    }

    /// Declares the named columns as key columns. Names that match no header
    /// are ignored.
    pub fn with_key_columns<S: Into<String>>(mut self, key_columns: Vec<S>) -> Self {
        self.key_columns = key_columns.into_iter().map(Into::into).collect();
        self
    }
}

impl Table for ListTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.headers.len()
    }

    fn column_name(&self, column_index: usize) -> &str {
        &self.headers[column_index]
    }

    fn value_at(&self, row_index: usize, column_index: usize) -> Value {
        self.rows[row_index][column_index].clone()
    }

    fn is_key_column(&self, column_index: usize) -> bool {
        self.key_columns.contains(&self.headers[column_index])
    }
}

/// A [`Table`] view that exposes a filtered subset of another table's columns.
///
/// Useful for excluding volatile columns (timestamps, run identifiers) from a
/// comparison without copying the underlying data.
pub struct ColumnFilterTable<'a> {
    inner: &'a dyn Table,
    columns: Vec<usize>,
}

impl<'a> ColumnFilterTable<'a> {
    pub fn new<F>(inner: &'a dyn Table, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let columns = (0..inner.column_count())
            .filter(|&c| keep(inner.column_name(c)))
            .collect();
        Self { inner, columns }
    }
}

impl Table for ColumnFilterTable<'_> {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, column_index: usize) -> &str {
        self.inner.column_name(self.columns[column_index])
    }

    fn value_at(&self, row_index: usize, column_index: usize) -> Value {
        self.inner.value_at(row_index, self.columns[column_index])
    }

    fn is_key_column(&self, column_index: usize) -> bool {
        self.inner.is_key_column(self.columns[column_index])
    }
}

/// A [`Table`] view that renames another table's columns, e.g. to align a
/// candidate whose headers carry an environment prefix with its baseline.
pub struct ColumnRenameTable<'a> {
    inner: &'a dyn Table,
    names: Vec<String>,
}

impl<'a> ColumnRenameTable<'a> {
    pub fn new<F>(inner: &'a dyn Table, mut rename: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        let names = (0..inner.column_count())
            .map(|c| rename(inner.column_name(c)))
            .collect();
        Self { inner, names }
    }
}

impl Table for ColumnRenameTable<'_> {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_name(&self, column_index: usize) -> &str {
        &self.names[column_index]
    }

    fn value_at(&self, row_index: usize, column_index: usize) -> Value {
        self.inner.value_at(row_index, column_index)
    }

    fn is_key_column(&self, column_index: usize) -> bool {
        self.inner.is_key_column(column_index)
    }
}
