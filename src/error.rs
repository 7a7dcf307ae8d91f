//! Error types.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Malformed table content, with the path of the offending file.
    Format {
        /// File the formatter was reading.
        path: PathBuf,
        /// Underlying format violation.
        source: FormatError,
    },
    /// Two merge inputs disagree on their column sets.
    SchemaMismatch {
        /// Columns of the first input.
        left: Vec<String>,
        /// Columns of the second input.
        right: Vec<String>,
    },
    /// Sort column does not resolve against the schema.
    UnknownColumn(String),
    /// Scratch directory creation error.
    TempDir(io::Error),
    /// Filesystem failure with path and operation context.
    Io {
        /// File the operation was acting on.
        path: PathBuf,
        /// Operation being performed, e.g. "open" or "write".
        op: &'static str,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Invalid engine configuration.
    Config(String),
}

impl SortError {
    pub(crate) fn io(path: &Path, op: &'static str, source: io::Error) -> Self {
        SortError::Io {
            path: path.to_path_buf(),
            op,
            source,
        }
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::Format { source, .. } => Some(source),
            SortError::TempDir(err) => Some(err),
            SortError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::Format { path, source } => {
                write!(f, "malformed table {}: {}", path.display(), source)
            }
            SortError::SchemaMismatch { left, right } => write!(
                f,
                "schema mismatch: [{}] vs [{}]",
                left.join(","),
                right.join(",")
            ),
            SortError::UnknownColumn(column) => write!(f, "unknown sort column: {}", column),
            SortError::TempDir(err) => write!(f, "scratch directory not created: {}", err),
            SortError::Io { path, op, source } => {
                write!(f, "{} failed on {}: {}", op, path.display(), source)
            }
            SortError::Config(reason) => write!(f, "invalid configuration: {}", reason),
        }
    }
}

/// Format violation reported by a [`TabularFormatter`](crate::TabularFormatter).
///
/// The formatter reads from an anonymous stream and does not know file paths;
/// the engine attaches them via [`FormatError::at`].
#[derive(Debug)]
pub enum FormatError {
    /// The source ended before a header line was read.
    MissingHeader,
    /// A row's field count differs from the header's.
    WidthMismatch {
        /// Field count declared by the header.
        expected: usize,
        /// Field count found in the row.
        found: usize,
    },
    /// Stream read failure inside the formatter.
    Io(io::Error),
}

impl FormatError {
    /// Converts into a [`SortError`] carrying the path of the file being read.
    pub(crate) fn at(self, path: &Path, op: &'static str) -> SortError {
        match self {
            FormatError::Io(source) => SortError::io(path, op, source),
            source => SortError::Format {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            FormatError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            FormatError::MissingHeader => write!(f, "missing header row"),
            FormatError::WidthMismatch { expected, found } => {
                write!(f, "expected {} fields per row, found {}", expected, found)
            }
            FormatError::Io(err) => write!(f, "stream read failed: {}", err),
        }
    }
}
