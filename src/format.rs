//! Tabular data model and row-level formatting.
//!
//! The sort engine never touches raw bytes itself; everything row-shaped goes
//! through a [`TabularFormatter`]. The crate ships [`SimpleCsvFormatter`] for
//! the simplified CSV format (delimited header line, fixed-width rows, no
//! quoting or escaping), but the engine components accept any implementation.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use crate::error::{FormatError, SortError};

/// Ordered column names of a table, parsed once from its header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Creates a schema from column names in header order.
    pub fn new(columns: Vec<String>) -> Self {
        Schema { columns }
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Checks whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Resolves a column name to its index, if present.
    pub fn resolve(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }
}

/// One table row: field values in schema order.
///
/// Rows produced by a formatter always match the active schema's width; the
/// engine relies on that invariant instead of re-checking it per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    /// Creates a row from field values in schema order.
    pub fn new(fields: Vec<String>) -> Self {
        Row { fields }
    }

    /// Field values in schema order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Checks whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value of the field at `index`.
    pub fn field(&self, index: usize) -> &str {
        &self.fields[index]
    }
}

/// Total order over rows by a single column, resolved once against a schema.
///
/// Fields are untyped text, so the order is lexicographic on the raw field
/// value.
#[derive(Debug, Clone)]
pub struct SortKey {
    column: String,
    index: usize,
}

impl SortKey {
    /// Resolves a column name against a schema.
    ///
    /// An absent column is a configuration problem and fails here, before any
    /// row is read.
    pub fn resolve(schema: &Schema, column: &str) -> Result<Self, SortError> {
        match schema.resolve(column) {
            Some(index) => Ok(SortKey {
                column: column.to_string(),
                index,
            }),
            None => Err(SortError::UnknownColumn(column.to_string())),
        }
    }

    /// The column name the key was resolved from.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The resolved column index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The key field of a row.
    pub fn field_of<'a>(&self, row: &'a Row) -> &'a str {
        row.field(self.index)
    }

    /// Compares two rows by their key fields.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        self.field_of(a).cmp(self.field_of(b))
    }
}

/// Row-level format interface. Parses and serializes one header or row at a
/// time against streaming sources and sinks.
///
/// Implementations own all byte-level concerns (delimiters, line endings,
/// field-count validation); the engine sees only [`Schema`]s and [`Row`]s.
pub trait TabularFormatter {
    /// Reads the header line and derives the schema from it.
    fn read_header<R: BufRead>(&self, source: &mut R) -> Result<Schema, FormatError>;

    /// Reads the next row, or [`None`] at end of stream.
    ///
    /// A row whose field count differs from the schema's is a
    /// [`FormatError::WidthMismatch`]; it must never reach the caller.
    fn read_row<R: BufRead>(&self, source: &mut R, schema: &Schema) -> Result<Option<Row>, FormatError>;

    /// Writes the header line for a schema.
    fn write_header<W: Write>(&self, sink: &mut W, schema: &Schema) -> io::Result<()>;

    /// Writes one row.
    fn write_row<W: Write>(&self, sink: &mut W, row: &Row) -> io::Result<()>;

    /// Resolves the sort column into a row comparator.
    fn comparator(&self, schema: &Schema, column: &str) -> Result<SortKey, SortError> {
        SortKey::resolve(schema, column)
    }
}

/// Simplified CSV formatter.
///
/// The first line is the delimited header; every following line must split
/// into exactly the header's field count. No quoting or escaping is
/// supported, so the delimiter may not occur inside a field value.
#[derive(Debug, Clone, Copy)]
pub struct SimpleCsvFormatter {
    delimiter: char,
}

impl SimpleCsvFormatter {
    /// Creates a formatter with a custom field delimiter.
    pub fn new(delimiter: char) -> Self {
        SimpleCsvFormatter { delimiter }
    }

    fn read_line<R: BufRead>(&self, source: &mut R) -> Result<Option<String>, FormatError> {
        let mut line = String::new();
        match source.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(Some(line))
            }
            Err(err) => Err(FormatError::Io(err)),
        }
    }

    fn split(&self, line: &str) -> Vec<String> {
        line.split(self.delimiter).map(str::to_string).collect()
    }

    fn join(&self, fields: &[String]) -> String {
        fields.join(&self.delimiter.to_string())
    }
}

impl Default for SimpleCsvFormatter {
    fn default() -> Self {
        SimpleCsvFormatter { delimiter: ',' }
    }
}

impl TabularFormatter for SimpleCsvFormatter {
    fn read_header<R: BufRead>(&self, source: &mut R) -> Result<Schema, FormatError> {
        match self.read_line(source)? {
            Some(line) => Ok(Schema::new(self.split(&line))),
            None => Err(FormatError::MissingHeader),
        }
    }

    fn read_row<R: BufRead>(&self, source: &mut R, schema: &Schema) -> Result<Option<Row>, FormatError> {
        let line = match self.read_line(source)? {
            Some(line) => line,
            None => return Ok(None),
        };

        let fields = self.split(&line);
        if fields.len() != schema.len() {
            return Err(FormatError::WidthMismatch {
                expected: schema.len(),
                found: fields.len(),
            });
        }

        Ok(Some(Row::new(fields)))
    }

    fn write_header<W: Write>(&self, sink: &mut W, schema: &Schema) -> io::Result<()> {
        writeln!(sink, "{}", self.join(schema.columns()))
    }

    fn write_row<W: Write>(&self, sink: &mut W, row: &Row) -> io::Result<()> {
        writeln!(sink, "{}", self.join(row.fields()))
    }
}

/// Rewrites a table unchanged: the header first, then every row in order.
pub fn copy_table<F: TabularFormatter>(formatter: &F, from: &Path, to: &Path) -> Result<(), SortError> {
    let mut source = open_source(from)?;
    let schema = formatter
        .read_header(&mut source)
        .map_err(|err| err.at(from, "read"))?;

    let mut sink = create_sink(to)?;
    formatter
        .write_header(&mut sink, &schema)
        .map_err(|err| SortError::io(to, "write", err))?;

    while let Some(row) = formatter
        .read_row(&mut source, &schema)
        .map_err(|err| err.at(from, "read"))?
    {
        formatter
            .write_row(&mut sink, &row)
            .map_err(|err| SortError::io(to, "write", err))?;
    }

    sink.flush().map_err(|err| SortError::io(to, "flush", err))
}

pub(crate) fn open_source(path: &Path) -> Result<io::BufReader<fs::File>, SortError> {
    let file = fs::File::open(path).map_err(|err| SortError::io(path, "open", err))?;
    Ok(io::BufReader::new(file))
}

pub(crate) fn create_sink(path: &Path) -> Result<io::BufWriter<fs::File>, SortError> {
    let file = fs::File::create(path).map_err(|err| SortError::io(path, "create", err))?;
    Ok(io::BufWriter::new(file))
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;
    use std::fs;
    use std::io;

    use rstest::*;

    use super::{copy_table, Row, Schema, SimpleCsvFormatter, SortKey, TabularFormatter};
    use crate::error::{FormatError, SortError};

    fn read_all(input: &str) -> Result<(Schema, Vec<Row>), FormatError> {
        let formatter = SimpleCsvFormatter::default();
        let mut source = io::Cursor::new(input);

        let schema = formatter.read_header(&mut source)?;
        let mut rows = Vec::new();
        while let Some(row) = formatter.read_row(&mut source, &schema)? {
            rows.push(row);
        }
        Ok((schema, rows))
    }

    #[rstest]
    fn test_read_header_and_rows() {
        let (schema, rows) = read_all("id,val\n2,b\n1,a\n").unwrap();

        assert_eq!(schema.columns(), ["id", "val"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields(), ["2", "b"]);
        assert_eq!(rows[1].fields(), ["1", "a"]);
    }

    #[rstest]
    fn test_crlf_line_endings() {
        let (schema, rows) = read_all("id,val\r\n1,a\r\n").unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(rows[0].fields(), ["1", "a"]);
    }

    #[rstest]
    fn test_missing_header() {
        let result = read_all("");
        assert!(matches!(result, Err(FormatError::MissingHeader)));
    }

    #[rstest]
    #[case("id,val\n1,a,extra\n", 2, 3)]
    #[case("id,val\n1\n", 2, 1)]
    fn test_row_width_mismatch(#[case] input: &str, #[case] expected: usize, #[case] found: usize) {
        let result = read_all(input);
        assert!(matches!(
            result,
            Err(FormatError::WidthMismatch { expected: e, found: f }) if e == expected && f == found
        ));
    }

    #[rstest]
    fn test_write_round_trip() {
        let input = "id,val\n1,a\n2,b\n";
        let formatter = SimpleCsvFormatter::default();
        let (schema, rows) = read_all(input).unwrap();

        let mut sink = Vec::new();
        formatter.write_header(&mut sink, &schema).unwrap();
        for row in &rows {
            formatter.write_row(&mut sink, row).unwrap();
        }

        assert_eq!(String::from_utf8(sink).unwrap(), input);
    }

    #[rstest]
    fn test_custom_delimiter() {
        let formatter = SimpleCsvFormatter::new(';');
        let mut source = io::Cursor::new("id;val\n1;a\n");

        let schema = formatter.read_header(&mut source).unwrap();
        let row = formatter.read_row(&mut source, &schema).unwrap().unwrap();

        assert_eq!(schema.columns(), ["id", "val"]);
        assert_eq!(row.fields(), ["1", "a"]);
    }

    #[rstest]
    fn test_sort_key_resolution() {
        let schema = Schema::new(vec!["id".to_string(), "val".to_string()]);

        let key = SortKey::resolve(&schema, "val").unwrap();
        assert_eq!(key.column(), "val");
        assert_eq!(key.index(), 1);

        let missing = SortKey::resolve(&schema, "absent");
        assert!(matches!(missing, Err(SortError::UnknownColumn(column)) if column == "absent"));
    }

    #[rstest]
    fn test_sort_key_compare() {
        let schema = Schema::new(vec!["id".to_string(), "val".to_string()]);
        let key = SortKey::resolve(&schema, "id").unwrap();

        let a = Row::new(vec!["1".to_string(), "x".to_string()]);
        let b = Row::new(vec!["2".to_string(), "x".to_string()]);

        assert_eq!(key.compare(&a, &b), Ordering::Less);
        assert_eq!(key.compare(&b, &a), Ordering::Greater);
        assert_eq!(key.compare(&a, &a), Ordering::Equal);
        assert_eq!(key.field_of(&b), "2");
    }

    #[rstest]
    fn test_copy_table() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("input.csv");
        let to = dir.path().join("output.csv");
        fs::write(&from, "id,val\n1,a\n2,b\n").unwrap();

        copy_table(&SimpleCsvFormatter::default(), &from, &to).unwrap();

        assert_eq!(fs::read_to_string(&to).unwrap(), "id,val\n1,a\n2,b\n");
    }
}
