use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::{IngestError, Result};

/// A response table: header row plus data rows of equal width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row numbers (header = 1) that had cells beyond the header and were cut.
    pub truncated_rows: Vec<usize>,
}

impl CsvTable {
    /// Builds a table from raw rows; the first non-blank row is the header.
    ///
    /// Short rows are padded with empty cells. Cells past the header width
    /// are dropped with a warning.
    pub fn from_rows<I, R, S>(raw_rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| normalize_cell(cell.as_ref()))
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.iter().all(|value| value.is_empty()));

        let Some(header_row) = rows.next() else {
            return Self::default();
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|value| normalize_header(value))
            .collect();
        let width = headers.len();
        let mut truncated_rows = Vec::new();
        let rows = rows
            .enumerate()
            .map(|(index, mut row)| {
                if row.len() > width {
                    let line = index + 2;
                    let dropped: Vec<&str> = row[width..]
                        .iter()
                        .map(String::as_str)
                        .filter(|cell| !cell.is_empty())
                        .collect();
                    warn!(
                        row = line,
                        extra_cells = row.len() - width,
                        dropped = ?dropped,
                        "row is wider than the header; extra cells dropped"
                    );
                    truncated_rows.push(line);
                }
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            headers,
            rows,
            truncated_rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|candidate| candidate == header)
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads CSV text from `reader`; `origin` names the source in errors.
pub fn parse_csv_table<R: Read>(reader: R, origin: &str) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            origin: origin.to_string(),
            source,
        })?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }
    let table = CsvTable::from_rows(raw_rows);
    debug!(
        origin,
        columns = table.headers.len(),
        rows = table.rows.len(),
        "csv table read"
    );
    Ok(table)
}

pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let file = File::open(path).map_err(|source| IngestError::io(path, source))?;
    parse_csv_table(file, &path.display().to_string())
}
