//! Run files and run naming.

use std::path::{Path, PathBuf};

/// One sorted, header-tagged run file.
///
/// Created by [`RunGenerator`](crate::RunGenerator), consumed read-only by
/// merging. Once a run has been folded into a later merge output it is
/// disposable, but deleting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    path: PathBuf,
    rows: usize,
}

impl Run {
    pub(crate) fn new(path: PathBuf, rows: usize) -> Self {
        Run { path, rows }
    }

    /// Path of the run file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows in the run, not counting the header.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Consumes the run, returning its path.
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Ordered collection of runs from one split, in creation order.
///
/// The order reflects the sequence runs were written in, nothing more; rows
/// are only sorted within each run, not across runs.
#[derive(Debug, Clone, Default)]
pub struct RunSet {
    runs: Vec<Run>,
}

impl RunSet {
    pub(crate) fn new(runs: Vec<Run>) -> Self {
        RunSet { runs }
    }

    /// Runs in creation order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Checks whether the split produced no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Paths of the run files in creation order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.runs.iter().map(|run| run.path().to_path_buf()).collect()
    }
}

impl IntoIterator for RunSet {
    type Item = Run;
    type IntoIter = <Vec<Run> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.into_iter()
    }
}

impl<'a> IntoIterator for &'a RunSet {
    type Item = &'a Run;
    type IntoIter = std::slice::Iter<'a, Run>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}

/// Deterministic run-path source: base path plus a counter.
///
/// The Nth path (counting from 0) is a sibling of the base file named
/// `temp_<NNNNN>_<base-file-name>` with N zero-padded to five digits. The
/// counter lives in this value and nowhere else.
#[derive(Debug, Clone)]
pub struct RunNamer {
    base: PathBuf,
    next: usize,
}

impl RunNamer {
    /// Creates a namer for runs split off the file at `base`.
    pub fn new(base: &Path) -> Self {
        RunNamer {
            base: base.to_path_buf(),
            next: 0,
        }
    }

    /// Returns the next run path and advances the counter.
    pub fn next_path(&mut self) -> PathBuf {
        let name = self
            .base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = self.base.with_file_name(format!("temp_{:05}_{}", self.next, name));
        self.next += 1;
        path
    }
}
