//! Run generation: splitting an unsorted table into sorted runs.

use std::io::prelude::*;
use std::path::Path;

use log;

use crate::buffer::RunBuffer;
use crate::error::SortError;
use crate::format::{create_sink, open_source, Schema, SimpleCsvFormatter, TabularFormatter};
use crate::run::{Run, RunNamer, RunSet};

/// Splits an unsorted table into sorted runs of bounded size.
///
/// Rows are streamed one at a time into a bounded min-priority buffer; each
/// time the buffer reaches the row ceiling it is drained by repeated
/// extract-minimum into a new header-tagged run file, so no more than one
/// buffer of rows is ever resident. The final run takes whatever rows remain
/// and may be undersized.
pub struct RunGenerator<F = SimpleCsvFormatter>
where
    F: TabularFormatter,
{
    formatter: F,
    row_ceiling: usize,
}

impl RunGenerator<SimpleCsvFormatter> {
    /// Creates a generator over the default simplified CSV format.
    ///
    /// # Arguments
    /// * `row_ceiling` - Maximum number of data rows per run; must be positive.
    pub fn new(row_ceiling: usize) -> Result<Self, SortError> {
        Self::with_formatter(SimpleCsvFormatter::default(), row_ceiling)
    }
}

impl<F> RunGenerator<F>
where
    F: TabularFormatter,
{
    /// Creates a generator over a custom formatter.
    pub fn with_formatter(formatter: F, row_ceiling: usize) -> Result<Self, SortError> {
        if row_ceiling == 0 {
            return Err(SortError::Config("row ceiling must be positive".to_string()));
        }

        Ok(RunGenerator {
            formatter,
            row_ceiling,
        })
    }

    /// Maximum number of data rows per run.
    pub fn row_ceiling(&self) -> usize {
        self.row_ceiling
    }

    /// Splits the table at `from` into sorted runs on `column`.
    ///
    /// Run files are siblings of `from`, named by a [`RunNamer`] in creation
    /// order. Each run carries the input header and its rows sorted ascending
    /// by `column`. A header-only input produces an empty [`RunSet`].
    pub fn split_sort(&self, from: &Path, column: &str) -> Result<RunSet, SortError> {
        let mut source = open_source(from)?;
        let schema = self
            .formatter
            .read_header(&mut source)
            .map_err(|err| err.at(from, "read"))?;
        let key = self.formatter.comparator(&schema, column)?;

        let mut namer = RunNamer::new(from);
        let mut buffer = RunBuffer::new(self.row_ceiling);
        let mut runs = Vec::new();

        while let Some(row) = self
            .formatter
            .read_row(&mut source, &schema)
            .map_err(|err| err.at(from, "read"))?
        {
            buffer.push(&key, row);

            if buffer.is_full() {
                runs.push(self.flush_run(&mut namer, &schema, &mut buffer)?);
            }
        }

        if !buffer.is_empty() {
            runs.push(self.flush_run(&mut namer, &schema, &mut buffer)?);
        }

        log::debug!("split {} into {} runs", from.display(), runs.len());

        Ok(RunSet::new(runs))
    }

    /// Drains the buffer into the next run file, header first, rows in
    /// ascending key order.
    fn flush_run(
        &self,
        namer: &mut RunNamer,
        schema: &Schema,
        buffer: &mut RunBuffer,
    ) -> Result<Run, SortError> {
        let path = namer.next_path();
        log::debug!("draining {} rows to run {}", buffer.len(), path.display());

        let mut sink = create_sink(&path)?;
        self.formatter
            .write_header(&mut sink, schema)
            .map_err(|err| SortError::io(&path, "write", err))?;

        let mut rows = 0;
        while let Some(row) = buffer.pop_min() {
            self.formatter
                .write_row(&mut sink, &row)
                .map_err(|err| SortError::io(&path, "write", err))?;
            rows += 1;
        }

        sink.flush().map_err(|err| SortError::io(&path, "flush", err))?;

        Ok(Run::new(path, rows))
    }
}
