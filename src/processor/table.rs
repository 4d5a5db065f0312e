use memchr::{Memchr3, memchr_iter, memchr3_iter};
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{fs::File, path::Path, str};
use tracing::debug;

use crate::processor::{
    InputFormat, ParseError, ParseSummary, ProcessorError,
    column::{Cell, Column, ColumnSpec, ColumnType, TableSchema},
    timestamp::parse_timestamp,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Byte range of a run of whole records inside the data section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkBounds {
    start: usize,
    end: usize,
    /// 1-based file line on which the chunk's first record starts
    first_line: usize,
}

/// Columns parsed from one chunk
struct BatchResult {
    columns: Vec<Column>,
    row_count: usize,
    rows_skipped: usize,
    errors: Vec<ParseError>,
}

/// Schema-bound columnar table loaded from a CSV or JSON file
///
/// # Examples
///
/// ```rust
/// # use case_insights::processor::{table::Table, dataset::ACCOUNT_SCHEMA};
/// let mut table = Table::new(&ACCOUNT_SCHEMA);
/// let summary = table
///     .load_csv_bytes(b"account_id,account_name,account_industry,account_country\n1,Acme,Tech,US\n")
///     .unwrap();
/// assert_eq!(summary.rows_processed, 1);
/// assert_eq!(table.row_count(), 1);
/// ```
#[derive(Debug)]
pub struct Table {
    schema: &'static TableSchema,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create an empty table for `schema`
    pub fn new(schema: &'static TableSchema) -> Self {
        Table {
            schema,
            columns: schema
                .columns
                .iter()
                .map(|spec| Column::new(spec.column_type))
                .collect(),
            row_count: 0,
        }
    }

    /// Loads `path` in the given format, replacing any previous contents
    pub fn load(&mut self, path: &Path, format: InputFormat) -> Result<ParseSummary, ProcessorError> {
        match format.resolve(path) {
            InputFormat::Json => self.load_json(path),
            _ => self.load_csv(path),
        }
    }

    /// Loads a CSV file using memory mapping
    ///
    /// Record boundaries are located with a quote-aware scan, then chunks of
    /// records are parsed in parallel and merged in file order.
    ///
    /// # Errors
    /// Returns a [`ProcessorError`] if:
    /// - File cannot be opened or mapped
    /// - The file is empty or has no header
    /// - A schema column is absent from the header
    ///
    /// Malformed rows do not fail the load; they are reported in the returned
    /// [`ParseSummary`].
    pub fn load_csv(&mut self, path: &Path) -> Result<ParseSummary, ProcessorError> {
        let mmap = map_file(path)?;
        self.load_csv_bytes(&mmap[..])
    }

    /// Loads CSV text already in memory
    pub fn load_csv_bytes(&mut self, buf: &[u8]) -> Result<ParseSummary, ProcessorError> {
        let buf = buf.strip_prefix(UTF8_BOM).unwrap_or(buf);

        // Parse header
        let header_end = Self::find_record_end(buf);
        let headers = Self::parse_header(&buf[..header_end])?;
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ProcessorError::EmptyInput(format!(
                "{} input has no header",
                self.schema.name
            )));
        }
        let indices = self.resolve_columns(|spec| headers.iter().position(|h| spec.matches(h)))?;

        let data_start = (header_end + 1).min(buf.len());
        let data = &buf[data_start..];
        let header_lines = memchr_iter(b'\n', &buf[..data_start]).count();

        let num_threads = rayon::current_num_threads();
        let chunks = Self::find_chunk_boundaries(data, num_threads, header_lines + 1);
        debug!(
            table = self.schema.name,
            bytes = data.len(),
            chunks = chunks.len(),
            "parsing csv"
        );

        // Estimate rows per chunk for preallocation
        let estimated_rows_per_chunk = {
            let avg_line_len = header_end.max(16) + 1;
            (data.len() / num_threads.max(1) / avg_line_len) + 64
        };

        let schema = self.schema;
        let batch_results: Vec<BatchResult> = chunks
            .par_iter()
            .map(|bounds| {
                Self::parse_chunk(
                    &data[bounds.start..bounds.end],
                    schema,
                    &indices,
                    headers.len(),
                    estimated_rows_per_chunk,
                    bounds.first_line,
                )
            })
            .collect();

        Ok(self.merge_batches(batch_results))
    }

    /// Loads a JSON file: either an array of objects (records orientation) or
    /// an object of columns keyed by row index (pandas' default orientation).
    pub fn load_json(&mut self, path: &Path) -> Result<ParseSummary, ProcessorError> {
        let mmap = map_file(path)?;
        self.load_json_bytes(&mmap[..])
    }

    /// Loads JSON text already in memory
    pub fn load_json_bytes(&mut self, buf: &[u8]) -> Result<ParseSummary, ProcessorError> {
        let buf = buf.strip_prefix(UTF8_BOM).unwrap_or(buf);
        let root: serde_json::Value = serde_json::from_slice(buf)?;

        let records = match root {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(columns) => columns_to_records(columns)?,
            _ => {
                return Err(ProcessorError::Parse(format!(
                    "{} input must be a JSON array or object",
                    self.schema.name
                )));
            }
        };

        // A column is missing only if no record carries it
        if !records.is_empty() {
            self.resolve_columns(|spec| {
                records
                    .iter()
                    .filter_map(|r| r.as_object())
                    .any(|obj| obj.keys().any(|k| spec.matches(k)))
                    .then_some(0)
            })?;
        }

        let mut batch = BatchResult {
            columns: self
                .schema
                .columns
                .iter()
                .map(|spec| Column::empty_chunk(spec.column_type, records.len()))
                .collect(),
            row_count: 0,
            rows_skipped: 0,
            errors: Vec::new(),
        };

        let mut texts: Vec<String> = Vec::with_capacity(self.schema.columns.len());
        for (idx, record) in records.iter().enumerate() {
            let row = idx + 1;
            let Some(obj) = record.as_object() else {
                batch.errors.push(ParseError {
                    row,
                    column: String::new(),
                    value: String::new(),
                    error: "Expected a JSON object".to_string(),
                });
                batch.rows_skipped += 1;
                continue;
            };

            texts.clear();
            for spec in self.schema.columns {
                let value = obj.iter().find(|(k, _)| spec.matches(k)).map(|(_, v)| v);
                texts.push(json_field_text(value));
            }

            let fields: Vec<&str> = texts.iter().map(String::as_str).collect();
            match build_cells(self.schema, &fields, row, &mut batch.errors) {
                Some(cells) => {
                    for (col, cell) in batch.columns.iter_mut().zip(cells) {
                        col.push_cell(cell);
                    }
                    batch.row_count += 1;
                }
                None => batch.rows_skipped += 1,
            }
        }

        Ok(self.merge_batches(vec![batch]))
    }

    fn resolve_columns(
        &self,
        mut find: impl FnMut(&ColumnSpec) -> Option<usize>,
    ) -> Result<Vec<usize>, ProcessorError> {
        self.schema
            .columns
            .iter()
            .map(|spec| {
                find(spec).ok_or_else(|| ProcessorError::MissingColumn {
                    table: self.schema.name,
                    column: spec.name.to_string(),
                })
            })
            .collect()
    }

    fn parse_header(line: &[u8]) -> Result<Vec<String>, ProcessorError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line);
        let mut record = csv::ByteRecord::new();
        if !reader.read_byte_record(&mut record)? {
            return Ok(Vec::new());
        }

        record
            .iter()
            .map(|field| -> Result<String, ProcessorError> {
                Ok(str::from_utf8(field)?.trim().to_string())
            })
            .collect()
    }

    /// Offset of the newline terminating the first record, or `buf.len()`
    fn find_record_end(buf: &[u8]) -> usize {
        NewlineScan::new(buf)
            .find(|&(_, ends_record)| ends_record)
            .map(|(pos, _)| pos)
            .unwrap_or(buf.len())
    }

    /// Splits `data` into roughly `num_chunks` runs of whole records.
    ///
    /// Only newlines that end a record are split points, so the result does not
    /// depend on where quoted fields with embedded newlines fall.
    fn find_chunk_boundaries(data: &[u8], num_chunks: usize, first_line: usize) -> Vec<ChunkBounds> {
        if data.is_empty() {
            return vec![];
        }

        let target = (data.len() / num_chunks.max(1)).max(1);
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;
        let mut start_line = first_line;
        let mut newlines = 0;

        for (pos, ends_record) in NewlineScan::new(data) {
            newlines += 1;
            let end = pos + 1;
            if ends_record && end - start >= target && end < data.len() {
                boundaries.push(ChunkBounds {
                    start,
                    end,
                    first_line: start_line,
                });
                start = end;
                start_line = first_line + newlines;
            }
        }

        // Last chunk gets everything remaining
        if start < data.len() {
            boundaries.push(ChunkBounds {
                start,
                end: data.len(),
                first_line: start_line,
            });
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &'static TableSchema,
        indices: &[usize],
        header_len: usize,
        estimated_rows: usize,
        first_line: usize,
    ) -> BatchResult {
        let mut columns: Vec<Column> = schema
            .columns
            .iter()
            .map(|spec| Column::empty_chunk(spec.column_type, estimated_rows))
            .collect();

        let mut errors = Vec::new();
        let mut row_count = 0;
        let mut rows_skipped = 0;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(chunk);
        let mut record = csv::ByteRecord::new();

        loop {
            match reader.read_byte_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {}
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(1);
                    errors.push(ParseError {
                        row: first_line + line - 1,
                        column: String::new(),
                        value: String::new(),
                        error: e.to_string(),
                    });
                    rows_skipped += 1;
                    continue;
                }
            }

            let line = record.position().map(|p| p.line() as usize).unwrap_or(1);
            let row = first_line + line - 1;

            // A stray blank line
            if record.len() == 1 && record[0].is_empty() && header_len != 1 {
                continue;
            }

            if record.len() != header_len {
                errors.push(ParseError {
                    row,
                    column: String::new(),
                    value: String::new(),
                    error: format!("Expected {} fields, got {}", header_len, record.len()),
                });
                rows_skipped += 1;
                continue;
            }

            let mut fields: Vec<&str> = Vec::with_capacity(indices.len());
            let mut utf8_ok = true;
            for (spec, &idx) in schema.columns.iter().zip(indices) {
                match str::from_utf8(&record[idx]) {
                    Ok(text) => fields.push(text),
                    Err(e) => {
                        errors.push(ParseError {
                            row,
                            column: spec.name.to_string(),
                            value: String::from_utf8_lossy(&record[idx]).to_string(),
                            error: e.to_string(),
                        });
                        utf8_ok = false;
                        break;
                    }
                }
            }

            let cells = if utf8_ok {
                build_cells(schema, &fields, row, &mut errors)
            } else {
                None
            };

            match cells {
                Some(cells) => {
                    for (col, cell) in columns.iter_mut().zip(cells) {
                        col.push_cell(cell);
                    }
                    row_count += 1;
                }
                None => rows_skipped += 1,
            }
        }

        BatchResult {
            columns,
            row_count,
            rows_skipped,
            errors,
        }
    }

    /// Moves batch columns into the table in order and flattens them
    fn merge_batches(&mut self, batch_results: Vec<BatchResult>) -> ParseSummary {
        let mut columns: Vec<Column> = self
            .schema
            .columns
            .iter()
            .map(|spec| Column::new(spec.column_type))
            .collect();

        let mut summary = ParseSummary::default();

        for batch in batch_results {
            summary.rows_processed += batch.row_count;
            summary.rows_skipped += batch.rows_skipped;
            summary.errors.extend(batch.errors);

            for (column, chunk) in columns.iter_mut().zip(batch.columns) {
                column.append_chunks(chunk);
            }
        }

        for column in &mut columns {
            column.flatten_in_place();
        }

        self.columns = columns;
        self.row_count = summary.rows_processed;
        summary
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn get_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let missing = || ProcessorError::MissingColumn {
            table: self.schema.name,
            column: col_name.to_string(),
        };

        let col_pos = self
            .schema
            .columns
            .iter()
            .position(|spec| spec.name == col_name)
            .ok_or_else(missing)?;

        self.columns.get(col_pos).ok_or_else(missing)
    }
}

/// Yields every newline in a CSV buffer with whether it ends a record.
///
/// Quotes follow the `csv` reader's rules: a quote opens a quoted field only
/// as the field's first byte, a quote right after a closing quote is an
/// escaped quote, and any other quote is literal text.
struct NewlineScan<'a> {
    data: &'a [u8],
    events: Memchr3<'a>,
    in_quotes: bool,
    field_start: usize,
    closed_at: Option<usize>,
}

impl<'a> NewlineScan<'a> {
    fn new(data: &'a [u8]) -> Self {
        NewlineScan {
            data,
            events: memchr3_iter(b'"', b',', b'\n', data),
            in_quotes: false,
            field_start: 0,
            closed_at: None,
        }
    }
}

impl Iterator for NewlineScan<'_> {
    type Item = (usize, bool);

    fn next(&mut self) -> Option<(usize, bool)> {
        for pos in self.events.by_ref() {
            match self.data[pos] {
                b'"' if self.in_quotes => {
                    self.in_quotes = false;
                    self.closed_at = Some(pos);
                }
                b'"' => {
                    let escaped = pos > 0 && self.closed_at == Some(pos - 1);
                    if pos == self.field_start || escaped {
                        self.in_quotes = true;
                    }
                }
                b',' => {
                    if !self.in_quotes {
                        self.field_start = pos + 1;
                    }
                }
                _ => {
                    if !self.in_quotes {
                        self.field_start = pos + 1;
                    }
                    return Some((pos, !self.in_quotes));
                }
            }
        }
        None
    }
}

fn map_file(path: &Path) -> Result<Mmap, ProcessorError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(ProcessorError::EmptyInput(path.display().to_string()));
    }
    // SAFETY: the map is read-only and dropped before the load returns
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

/// Converts one row of raw field text into typed cells.
///
/// Returns `None` when the row must be skipped (a required value is absent).
/// Unparseable timestamps are recorded and stored as null.
fn build_cells(
    schema: &TableSchema,
    fields: &[&str],
    row: usize,
    errors: &mut Vec<ParseError>,
) -> Option<Vec<Cell>> {
    let mut cells = Vec::with_capacity(fields.len());

    for (spec, raw) in schema.columns.iter().zip(fields) {
        let text = raw.trim();
        let cell = match spec.column_type {
            ColumnType::Str => Cell::Str((!text.is_empty()).then(|| text.to_string())),
            ColumnType::Timestamp => {
                let parsed = parse_timestamp(text);
                if parsed.is_none() && !text.is_empty() {
                    errors.push(ParseError {
                        row,
                        column: spec.name.to_string(),
                        value: text.to_string(),
                        error: "Unrecognized timestamp, treated as null".to_string(),
                    });
                }
                Cell::Timestamp(parsed)
            }
        };

        let is_null = matches!(cell, Cell::Str(None) | Cell::Timestamp(None));
        if spec.required && is_null {
            errors.push(ParseError {
                row,
                column: spec.name.to_string(),
                value: text.to_string(),
                error: "Missing required value".to_string(),
            });
            return None;
        }

        cells.push(cell);
    }

    Some(cells)
}

fn json_field_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `{"col": {"0": v, "1": v}}` into `[{"col": v}, {"col": v}]`, ordered by
/// numeric row index
fn columns_to_records(
    columns: serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<serde_json::Value>, ProcessorError> {
    let mut rows: std::collections::BTreeMap<u64, serde_json::Map<String, serde_json::Value>> =
        std::collections::BTreeMap::new();

    for (name, values) in columns {
        let serde_json::Value::Object(values) = values else {
            return Err(ProcessorError::Parse(format!(
                "JSON column '{}' must map row indices to values",
                name
            )));
        };

        for (index, value) in values {
            let index: u64 = index.parse().map_err(|_| {
                ProcessorError::Parse(format!("JSON row index '{}' is not a number", index))
            })?;
            rows.entry(index).or_default().insert(name.clone(), value);
        }
    }

    Ok(rows.into_values().map(serde_json::Value::Object).collect())
}
