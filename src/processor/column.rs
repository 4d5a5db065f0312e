use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Str,
    Timestamp,
}

/// One schema entry: the canonical name, accepted header aliases and whether a
/// null value makes the whole row invalid.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub column_type: ColumnType,
    pub required: bool,
}

impl ColumnSpec {
    pub fn matches(&self, header: &str) -> bool {
        self.name == header || self.aliases.contains(&header)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

/// A parsed field, before it is moved into a column chunk
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Str(Option<String>),
    Timestamp(Option<NaiveDateTime>),
}

/// Chunked column storage. Each parallel parse batch contributes one chunk.
#[derive(Debug, Clone)]
pub enum Column {
    Str(Vec<Vec<Option<String>>>),
    Timestamp(Vec<Vec<Option<NaiveDateTime>>>),
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Str => Column::Str(Vec::new()),
            ColumnType::Timestamp => Column::Timestamp(Vec::new()),
        }
    }

    /// Empty chunk of the matching type, sized for `capacity` rows
    pub fn empty_chunk(column_type: ColumnType, capacity: usize) -> Column {
        match column_type {
            ColumnType::Str => Column::Str(vec![Vec::with_capacity(capacity)]),
            ColumnType::Timestamp => Column::Timestamp(vec![Vec::with_capacity(capacity)]),
        }
    }

    /// Appends a cell to the last chunk. A cell of the wrong type is stored as null.
    pub fn push_cell(&mut self, cell: Cell) {
        match self {
            Column::Str(chunks) => {
                let value = match cell {
                    Cell::Str(v) => v,
                    Cell::Timestamp(_) => None,
                };
                last_chunk(chunks).push(value);
            }
            Column::Timestamp(chunks) => {
                let value = match cell {
                    Cell::Timestamp(v) => v,
                    Cell::Str(_) => None,
                };
                last_chunk(chunks).push(value);
            }
        }
    }

    /// Moves every chunk of `other` onto the end of `self`. Types must agree.
    pub fn append_chunks(&mut self, other: Column) {
        match (self, other) {
            (Column::Str(chunks), Column::Str(more)) => chunks.extend(more),
            (Column::Timestamp(chunks), Column::Timestamp(more)) => chunks.extend(more),
            _ => panic!("Type mismatch"),
        }
    }

    /// Contiguous view of a flattened string column
    pub fn as_str_slice(&self) -> &[Option<String>] {
        match self {
            Column::Str(chunks) => {
                debug_assert!(chunks.len() <= 1, "column must be flattened first");
                chunks.first().map(Vec::as_slice).unwrap_or(&[])
            }
            _ => panic!("Wrong type"),
        }
    }

    /// Contiguous view of a flattened timestamp column
    pub fn as_timestamp_slice(&self) -> &[Option<NaiveDateTime>] {
        match self {
            Column::Timestamp(chunks) => {
                debug_assert!(chunks.len() <= 1, "column must be flattened first");
                chunks.first().map(Vec::as_slice).unwrap_or(&[])
            }
            _ => panic!("Wrong type"),
        }
    }

    pub fn flatten_in_place(&mut self) {
        match self {
            Column::Str(chunks) => flatten_chunks(chunks),
            Column::Timestamp(chunks) => flatten_chunks(chunks),
        }
    }
}

fn last_chunk<T>(chunks: &mut Vec<Vec<T>>) -> &mut Vec<T> {
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }
    let last = chunks.len() - 1;
    &mut chunks[last]
}

fn flatten_chunks<T>(chunks: &mut Vec<Vec<T>>) {
    if chunks.len() <= 1 {
        return; // Already flat
    }

    // Take ownership of chunks, leaving empty vec
    let mut owned_chunks = std::mem::take(chunks);

    // The first chunk becomes the base; the rest are moved onto it in order
    let mut flattened = owned_chunks.remove(0);
    let total: usize = owned_chunks.iter().map(|c| c.len()).sum();
    flattened.reserve(total);

    for chunk in owned_chunks {
        flattened.extend(chunk);
    }

    chunks.push(flattened);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_flatten_keeps_chunk_order() {
        let mut col = Column::Str(vec![
            vec![Some("a".to_string())],
            vec![None, Some("b".to_string())],
            vec![Some("c".to_string())],
        ]);
        col.flatten_in_place();
        assert_eq!(
            col.as_str_slice(),
            &[
                Some("a".to_string()),
                None,
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
    }

    #[test]
    fn test_append_then_flatten_timestamps() {
        let mut col = Column::new(ColumnType::Timestamp);
        col.append_chunks(Column::Timestamp(vec![vec![Some(ts(2024, 1, 1))]]));
        col.append_chunks(Column::Timestamp(vec![vec![None, Some(ts(2024, 2, 1))]]));
        col.flatten_in_place();
        assert_eq!(
            col.as_timestamp_slice(),
            &[Some(ts(2024, 1, 1)), None, Some(ts(2024, 2, 1))]
        );
    }

    #[test]
    fn test_push_mismatched_cell_stores_null() {
        let mut col = Column::new(ColumnType::Str);
        col.push_cell(Cell::Timestamp(Some(ts(2024, 1, 1))));
        col.push_cell(Cell::Str(Some("x".to_string())));
        assert_eq!(col.as_str_slice(), &[None, Some("x".to_string())]);
    }

    #[test]
    fn test_spec_matches_alias() {
        let spec = ColumnSpec {
            name: "account_id",
            aliases: &["account_sfid"],
            column_type: ColumnType::Str,
            required: true,
        };
        assert!(spec.matches("account_id"));
        assert!(spec.matches("account_sfid"));
        assert!(!spec.matches("case_id"));
    }
}
