//! # tabrecon
//!
//! A cell-level reconciliation engine for tabular datasets: compares a
//! baseline table against a candidate table and classifies every cell as
//! matched, failed, missing, surplus, or out of order, tolerating row
//! reordering, duplicate rows and columns, fuzzy row matches, and per-column
//! numeric tolerance.

pub mod aligner;
pub mod comparator;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod index_map;
pub mod partial;
pub mod result;
mod rows;
pub mod table;

pub use comparator::{CellComparator, ColumnComparators};
pub use engine::TableComparator;
pub use error::{Result, TabreconError};
pub use result::{ResultCell, ResultTable};
pub use table::{ColumnFilterTable, ColumnRenameTable, ListTable, Table, Value};

use std::time::Duration;

/// Largest missing x surplus product handed to the exhaustive best-match
/// scorer without selectivity grouping first.
pub const DEFAULT_BEST_MATCH_THRESHOLD: u64 = 1_000_000;

/// Default wall-clock budget for the partial matching phase.
pub const DEFAULT_PARTIAL_MATCH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
