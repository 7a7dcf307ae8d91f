//! `tab-sort` is an external merge sort engine for delimited tabular files.
//!
//! External sorting handles datasets larger than available memory in two
//! passes: a split pass that cuts the input into bounded-size sorted runs,
//! and a merge pass that folds the runs into a single totally-ordered output.
//! For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! `tab-sort` supports the following features:
//!
//! * **Bounded memory:**
//!   the split pass never holds more than a configured number of rows; rows
//!   stream through a min-priority buffer that drains straight to sorted run
//!   files, so no in-memory sort of the whole dataset ever happens.
//! * **Format agnostic:**
//!   the engine reads and writes rows exclusively through the
//!   [`TabularFormatter`] trait. The built-in [`SimpleCsvFormatter`] covers
//!   simplified CSV (delimited header plus fixed-width rows, no quoting);
//!   custom formats plug in the same way.
//! * **Streaming merge:**
//!   runs are folded by repeated 2-way streaming merges holding one pending
//!   row per input, cascaded over the whole run collection.
//!
//! Note that on equal sort keys a pairwise merge keeps the second input's row
//! and drops the first input's; duplicate-keyed rows across runs are collapsed
//! per fold. See [`PairMerger::merge_pair`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! fn main() {
//!     let input = Path::new("data/input.csv");
//!     let output = Path::new("data/sorted.csv");
//!
//!     let runs = tab_sort::split_sort(input, "id", 10_000).unwrap();
//!     tab_sort::merge_all(&runs.paths(), "id", output).unwrap();
//!
//!     for run in runs {
//!         std::fs::remove_file(run.path()).unwrap();
//!     }
//! }
//! ```

pub mod buffer;
pub mod error;
pub mod format;
pub mod merge;
pub mod run;
pub mod split;

pub use buffer::RunBuffer;
pub use error::{FormatError, SortError};
pub use format::{copy_table, Row, Schema, SimpleCsvFormatter, SortKey, TabularFormatter};
pub use merge::{MergeOrchestrator, PairMerger};
pub use run::{Run, RunNamer, RunSet};
pub use split::RunGenerator;

use std::path::Path;

/// Copies the table at `from` to `to` unchanged, header and rows, using the
/// default simplified CSV format.
pub fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), SortError> {
    copy_table(&SimpleCsvFormatter::default(), from.as_ref(), to.as_ref())
}

/// Splits the table at `from` into sorted runs of at most `row_ceiling` rows
/// each, sorted ascending on `column`, using the default simplified CSV
/// format. See [`RunGenerator::split_sort`].
pub fn split_sort(from: impl AsRef<Path>, column: &str, row_ceiling: usize) -> Result<RunSet, SortError> {
    RunGenerator::new(row_ceiling)?.split_sort(from.as_ref(), column)
}

/// Merges the two sorted tables at `left` and `right` into `output`, ordered
/// on `column`, using the default simplified CSV format. See
/// [`PairMerger::merge_pair`].
pub fn merge_pair(
    left: impl AsRef<Path>,
    right: impl AsRef<Path>,
    column: &str,
    output: impl AsRef<Path>,
) -> Result<(), SortError> {
    PairMerger::new().merge_pair(left.as_ref(), right.as_ref(), column, output.as_ref())
}

/// Merges the sorted runs at `runs` into a single sorted table at `output`,
/// ordered on `column`, using the default simplified CSV format. See
/// [`MergeOrchestrator::merge_all`].
pub fn merge_all<P: AsRef<Path>>(runs: &[P], column: &str, output: impl AsRef<Path>) -> Result<(), SortError> {
    MergeOrchestrator::new().merge_all(runs, column, output.as_ref())
}
