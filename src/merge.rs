//! Streaming merge of sorted runs.

use std::cmp::Ordering;
use std::io::prelude::*;
use std::path::Path;

use log;
use tempfile;

use crate::error::SortError;
use crate::format::{copy_table, create_sink, open_source, SimpleCsvFormatter, TabularFormatter};

/// Merges two sorted tables into one sorted output.
///
/// Both inputs must share the schema and be sorted ascending on the merge
/// column; the output carries the same schema, exactly one header, and the
/// sorted union of both inputs.
pub struct PairMerger<F = SimpleCsvFormatter>
where
    F: TabularFormatter,
{
    formatter: F,
}

impl PairMerger<SimpleCsvFormatter> {
    /// Creates a merger over the default simplified CSV format.
    pub fn new() -> Self {
        Self::with_formatter(SimpleCsvFormatter::default())
    }
}

impl Default for PairMerger<SimpleCsvFormatter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> PairMerger<F>
where
    F: TabularFormatter,
{
    /// Creates a merger over a custom formatter.
    pub fn with_formatter(formatter: F) -> Self {
        PairMerger { formatter }
    }

    pub(crate) fn formatter(&self) -> &F {
        &self.formatter
    }

    /// Merges the sorted tables at `left` and `right` into `output`.
    ///
    /// Holds one pending row per input and repeatedly emits the side with the
    /// smaller key. On equal keys the right row is emitted and the left row is
    /// discarded; both cursors advance. Once one side is exhausted the other
    /// side drains unchanged.
    ///
    /// A schema mismatch between the inputs fails before the output file is
    /// created, so a rejected merge writes nothing.
    pub fn merge_pair(&self, left: &Path, right: &Path, column: &str, output: &Path) -> Result<(), SortError> {
        let mut left_src = open_source(left)?;
        let mut right_src = open_source(right)?;

        let left_schema = self
            .formatter
            .read_header(&mut left_src)
            .map_err(|err| err.at(left, "read"))?;
        let right_schema = self
            .formatter
            .read_header(&mut right_src)
            .map_err(|err| err.at(right, "read"))?;

        if left_schema != right_schema {
            return Err(SortError::SchemaMismatch {
                left: left_schema.columns().to_vec(),
                right: right_schema.columns().to_vec(),
            });
        }

        let key = self.formatter.comparator(&left_schema, column)?;

        let mut sink = create_sink(output)?;
        self.formatter
            .write_header(&mut sink, &left_schema)
            .map_err(|err| SortError::io(output, "write", err))?;

        let mut pending_left = self
            .formatter
            .read_row(&mut left_src, &left_schema)
            .map_err(|err| err.at(left, "read"))?;
        let mut pending_right = self
            .formatter
            .read_row(&mut right_src, &right_schema)
            .map_err(|err| err.at(right, "read"))?;

        while let (Some(left_row), Some(right_row)) = (&pending_left, &pending_right) {
            match key.compare(left_row, right_row) {
                Ordering::Less => {
                    self.formatter
                        .write_row(&mut sink, left_row)
                        .map_err(|err| SortError::io(output, "write", err))?;
                    pending_left = self
                        .formatter
                        .read_row(&mut left_src, &left_schema)
                        .map_err(|err| err.at(left, "read"))?;
                }
                Ordering::Greater => {
                    self.formatter
                        .write_row(&mut sink, right_row)
                        .map_err(|err| SortError::io(output, "write", err))?;
                    pending_right = self
                        .formatter
                        .read_row(&mut right_src, &right_schema)
                        .map_err(|err| err.at(right, "read"))?;
                }
                Ordering::Equal => {
                    // tie: the right row wins and the left row is dropped
                    self.formatter
                        .write_row(&mut sink, right_row)
                        .map_err(|err| SortError::io(output, "write", err))?;
                    pending_left = self
                        .formatter
                        .read_row(&mut left_src, &left_schema)
                        .map_err(|err| err.at(left, "read"))?;
                    pending_right = self
                        .formatter
                        .read_row(&mut right_src, &right_schema)
                        .map_err(|err| err.at(right, "read"))?;
                }
            }
        }

        while let Some(row) = pending_left {
            self.formatter
                .write_row(&mut sink, &row)
                .map_err(|err| SortError::io(output, "write", err))?;
            pending_left = self
                .formatter
                .read_row(&mut left_src, &left_schema)
                .map_err(|err| err.at(left, "read"))?;
        }

        while let Some(row) = pending_right {
            self.formatter
                .write_row(&mut sink, &row)
                .map_err(|err| SortError::io(output, "write", err))?;
            pending_right = self
                .formatter
                .read_row(&mut right_src, &right_schema)
                .map_err(|err| err.at(right, "read"))?;
        }

        sink.flush().map_err(|err| SortError::io(output, "flush", err))
    }
}

/// Folds an ordered collection of sorted runs into a single sorted output by
/// repeated pairwise merges.
///
/// The cascade merges run 0 with run 1, the result with run 2, and so on.
/// Intermediate results alternate between two scratch paths in a temporary
/// directory; the accumulated input of a step is never the file being written
/// by that step, and only the final fold targets the caller's output path.
/// Scratch files are removed when the cascade finishes.
pub struct MergeOrchestrator<F = SimpleCsvFormatter>
where
    F: TabularFormatter,
{
    merger: PairMerger<F>,
}

impl MergeOrchestrator<SimpleCsvFormatter> {
    /// Creates an orchestrator over the default simplified CSV format.
    pub fn new() -> Self {
        Self::with_formatter(SimpleCsvFormatter::default())
    }
}

impl Default for MergeOrchestrator<SimpleCsvFormatter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> MergeOrchestrator<F>
where
    F: TabularFormatter,
{
    /// Creates an orchestrator over a custom formatter.
    pub fn with_formatter(formatter: F) -> Self {
        MergeOrchestrator {
            merger: PairMerger::with_formatter(formatter),
        }
    }

    /// Merges the sorted runs at `runs` into a single sorted table at
    /// `output`.
    ///
    /// An empty run collection is a configuration error. A single run is
    /// folded by rewriting it to the output, after `column` has been resolved
    /// against its header.
    pub fn merge_all<P: AsRef<Path>>(&self, runs: &[P], column: &str, output: &Path) -> Result<(), SortError> {
        if runs.is_empty() {
            return Err(SortError::Config("merge requires at least one run".to_string()));
        }

        if runs.len() == 1 {
            let run = runs[0].as_ref();
            let mut source = open_source(run)?;
            let schema = self
                .merger
                .formatter()
                .read_header(&mut source)
                .map_err(|err| err.at(run, "read"))?;
            self.merger.formatter().comparator(&schema, column)?;

            return copy_table(self.merger.formatter(), run, output);
        }

        let scratch = tempfile::tempdir().map_err(SortError::TempDir)?;
        let slots = [
            scratch.path().join("cascade-a.csv"),
            scratch.path().join("cascade-b.csv"),
        ];

        log::info!("merging {} runs into {}", runs.len(), output.display());

        let mut accumulated = runs[0].as_ref().to_path_buf();
        for (step, run) in runs.iter().enumerate().skip(1) {
            let target = if step + 1 == runs.len() {
                output.to_path_buf()
            } else {
                slots[(step - 1) % 2].clone()
            };

            log::debug!("cascade step {}: folding {}", step, run.as_ref().display());
            self.merger.merge_pair(&accumulated, run.as_ref(), column, &target)?;
            accumulated = target;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::{Path, PathBuf};

    use rand::seq::SliceRandom;
    use rstest::*;

    use super::{MergeOrchestrator, PairMerger};
    use crate::error::SortError;
    use crate::split::RunGenerator;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_table(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[rstest]
    fn test_merge_order_and_tie_drop(tmp_dir: tempfile::TempDir) {
        let left = write_table(tmp_dir.path(), "a.csv", &["id,val", "1,x", "3,z"]);
        let right = write_table(tmp_dir.path(), "b.csv", &["id,val", "2,y", "3,w"]);
        let output = tmp_dir.path().join("out.csv");

        PairMerger::new().merge_pair(&left, &right, "id", &output).unwrap();

        assert_eq!(read_lines(&output), ["id,val", "1,x", "2,y", "3,w"]);
    }

    #[rstest]
    fn test_exhaustion_drain(tmp_dir: tempfile::TempDir) {
        let left = write_table(tmp_dir.path(), "a.csv", &["id,val", "1,a", "2,b", "3,c"]);
        let right = write_table(tmp_dir.path(), "b.csv", &["id,val", "0,z"]);
        let output = tmp_dir.path().join("out.csv");

        PairMerger::new().merge_pair(&left, &right, "id", &output).unwrap();

        assert_eq!(read_lines(&output), ["id,val", "0,z", "1,a", "2,b", "3,c"]);
    }

    #[rstest]
    fn test_empty_side(tmp_dir: tempfile::TempDir) {
        let left = write_table(tmp_dir.path(), "a.csv", &["id,val"]);
        let right = write_table(tmp_dir.path(), "b.csv", &["id,val", "1,a", "2,b"]);
        let output = tmp_dir.path().join("out.csv");

        PairMerger::new().merge_pair(&left, &right, "id", &output).unwrap();

        assert_eq!(read_lines(&output), ["id,val", "1,a", "2,b"]);
    }

    #[rstest]
    fn test_schema_mismatch_writes_no_output(tmp_dir: tempfile::TempDir) {
        let left = write_table(tmp_dir.path(), "a.csv", &["id,val", "1,x"]);
        let right = write_table(tmp_dir.path(), "b.csv", &["id,val,extra", "1,x,y"]);
        let output = tmp_dir.path().join("out.csv");

        let result = PairMerger::new().merge_pair(&left, &right, "id", &output);

        assert!(matches!(result, Err(SortError::SchemaMismatch { .. })));
        assert!(!output.exists());
    }

    #[rstest]
    fn test_cascade_of_single_row_runs(tmp_dir: tempfile::TempDir) {
        let runs = vec![
            write_table(tmp_dir.path(), "r0.csv", &["id", "1"]),
            write_table(tmp_dir.path(), "r1.csv", &["id", "2"]),
            write_table(tmp_dir.path(), "r2.csv", &["id", "3"]),
        ];
        let output = tmp_dir.path().join("out.csv");

        MergeOrchestrator::new().merge_all(&runs, "id", &output).unwrap();

        assert_eq!(read_lines(&output), ["id", "1", "2", "3"]);
    }

    #[rstest]
    fn test_single_run_rewritten_to_output(tmp_dir: tempfile::TempDir) {
        let runs = vec![write_table(tmp_dir.path(), "r0.csv", &["id,val", "1,a", "2,b"])];
        let output = tmp_dir.path().join("out.csv");

        MergeOrchestrator::new().merge_all(&runs, "id", &output).unwrap();

        assert_eq!(read_lines(&output), ["id,val", "1,a", "2,b"]);
    }

    #[rstest]
    fn test_merge_pair_unknown_column_writes_no_output(tmp_dir: tempfile::TempDir) {
        let left = write_table(tmp_dir.path(), "a.csv", &["id,val", "1,x"]);
        let right = write_table(tmp_dir.path(), "b.csv", &["id,val", "2,y"]);
        let output = tmp_dir.path().join("out.csv");

        let result = PairMerger::new().merge_pair(&left, &right, "absent", &output);

        assert!(matches!(result, Err(SortError::UnknownColumn(column)) if column == "absent"));
        assert!(!output.exists());
    }

    #[rstest]
    fn test_single_run_unknown_column_writes_no_output(tmp_dir: tempfile::TempDir) {
        let runs = vec![write_table(tmp_dir.path(), "r0.csv", &["id,val", "1,a"])];
        let output = tmp_dir.path().join("out.csv");

        let result = MergeOrchestrator::new().merge_all(&runs, "absent", &output);

        assert!(matches!(result, Err(SortError::UnknownColumn(column)) if column == "absent"));
        assert!(!output.exists());
    }

    #[rstest]
    fn test_empty_run_list_rejected(tmp_dir: tempfile::TempDir) {
        let runs: Vec<PathBuf> = Vec::new();
        let output = tmp_dir.path().join("out.csv");

        let result = MergeOrchestrator::new().merge_all(&runs, "id", &output);

        assert!(matches!(result, Err(SortError::Config(_))));
        assert!(!output.exists());
    }

    #[rstest]
    fn test_split_then_merge_pipeline(tmp_dir: tempfile::TempDir) {
        let mut ids: Vec<String> = (0..20).map(|n| format!("{:02}", n)).collect();
        ids.shuffle(&mut rand::thread_rng());

        let mut lines = vec!["id,val".to_string()];
        lines.extend(ids.iter().map(|id| format!("{},v{}", id, id)));
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let input = write_table(tmp_dir.path(), "input.csv", &line_refs);
        let output = tmp_dir.path().join("sorted.csv");

        let runs = RunGenerator::new(6).unwrap().split_sort(&input, "id").unwrap();
        assert_eq!(runs.len(), 4);

        MergeOrchestrator::new()
            .merge_all(&runs.paths(), "id", &output)
            .unwrap();

        let mut expected = vec!["id,val".to_string()];
        expected.extend((0..20).map(|n| format!("{:02},v{:02}", n, n)));
        assert_eq!(read_lines(&output), expected);
    }
}
