use crate::header::{Column, clean_header};
use csv::ReaderBuilder;
use tracing::debug;

/// Separators recognized on the header line, preferred in this order on a tie.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// One respondent's row, addressed by column position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn get(&self, column: &Column) -> Option<&str> {
        self.cells.get(column.index).map(String::as_str)
    }
}

/// Tokenized survey export.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Column holding the respondent's name.
    pub fn respondent_column(&self) -> Option<&Column> {
        self.columns.get(1)
    }

    /// Columns naming the persons being rated.
    pub fn target_columns(&self) -> &[Column] {
        self.columns.get(2..).unwrap_or(&[])
    }
}

/// Picks the separator occurring most often on the header line, outside
/// quoted cells. Falls back to a comma.
pub fn sniff_delimiter(input: &[u8]) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;
    for &byte in input {
        match byte {
            b'"' => quoted = !quoted,
            b'\n' | b'\r' if !quoted => break,
            _ if quoted => {}
            _ => {
                if let Some(slot) = DELIMITERS.iter().position(|d| *d == byte) {
                    counts[slot] += 1;
                }
            }
        }
    }
    let mut best = 0;
    for slot in 1..DELIMITERS.len() {
        if counts[slot] > counts[best] {
            best = slot;
        }
    }
    DELIMITERS[best]
}

/// Tokenizes delimited text with a header row.
///
/// The separator is detected from the header line. Short rows leave their
/// trailing columns absent and blank lines are skipped. Columns sharing a
/// header name stay separate.
pub fn parse_table(input: &str) -> Result<Table, csv::Error> {
    parse_table_bytes(input.as_bytes())
}

/// Like [`parse_table`] for file contents that may not be UTF-8.
pub fn parse_table_bytes(input: &[u8]) -> Result<Table, csv::Error> {
    let delimiter = sniff_delimiter(input);
    debug!(delimiter = %char::from(delimiter).escape_default(), "csv delimiter detected");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(input);

    let raw_header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = clean_header(&raw_header);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let cells = record.iter().map(str::to_string).collect();
        rows.push(Row { cells });
    }

    Ok(Table { columns, rows })
}
