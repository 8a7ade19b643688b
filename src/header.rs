//! Fixed-format station file parsing.
//!
//! Skips the metadata block at the top of a station file, takes the column
//! header verbatim from the first line after it, and loads the data section
//! into a polars frame in which every column is kept as raw text.

use crate::error::{HydrometError, Result};
use crate::models::{ColumnMatching, DataBoundaries, Delimiter, InputFormat};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Raw rows of one source file, keyed by header label
#[derive(Debug, Clone)]
pub struct RawTable {
    path: PathBuf,
    column_matching: ColumnMatching,
    boundaries: DataBoundaries,
    header: Vec<String>,
    frame: DataFrame,
}

impl RawTable {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn boundaries(&self) -> &DataBoundaries {
        &self.boundaries
    }

    /// Header labels exactly as they appear in the file
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    /// Find the header label a requested column name refers to
    pub fn resolve_column(&self, requested: &str) -> Result<&str> {
        self.header
            .iter()
            .find(|label| self.column_matching.matches(label, requested))
            .map(String::as_str)
            .ok_or_else(|| HydrometError::MissingColumn {
                path: self.path.clone(),
                column: requested.to_string(),
                available: self
                    .header
                    .iter()
                    .map(|label| format!("'{label}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Raw cell text of a column in source row order; empty cells are `None`
    pub fn text_column(&self, requested: &str) -> Result<Vec<Option<&str>>> {
        let label = self.resolve_column(requested)?;
        let values = self.frame.column(label)?.str()?;
        Ok(values.into_iter().collect())
    }
}

/// Read a station file, skipping `format.skip_lines` metadata lines
pub fn read_raw_table(path: &Path, format: &InputFormat) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| {
        debug!("Failed to open {}: {}", path.display(), e);
        HydrometError::MissingFile {
            path: path.to_path_buf(),
        }
    })?;
    let reader = BufReader::new(file);

    let mut header_line = None;
    let mut data = String::new();
    let mut data_rows = 0;
    let mut total_lines = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        total_lines = line_num + 1;

        if line_num < format.skip_lines {
            continue;
        }

        if header_line.is_none() {
            header_line = Some(line);
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        data.push_str(&normalize_delimiters(&line, format.delimiter));
        data.push('\n');
        data_rows += 1;
    }

    let header_line = header_line.ok_or_else(|| HydrometError::TooFewLines {
        path: path.to_path_buf(),
        expected: format.skip_lines + 1,
        found: total_lines,
    })?;

    let header = split_header(&header_line, format.delimiter);

    let boundaries = DataBoundaries {
        skip_rows: format.skip_lines,
        header_line: format.skip_lines,
        data_rows,
        total_lines,
    };

    debug!(
        "Parsed layout of {}: skip_rows={}, columns={}, data_rows={}",
        path.display(),
        boundaries.skip_rows,
        header.len(),
        boundaries.data_rows
    );

    let frame = load_text_frame(&header, data)?;

    Ok(RawTable {
        path: path.to_path_buf(),
        column_matching: format.column_matching,
        boundaries,
        header,
        frame,
    })
}

/// Split a header line into labels, keeping padding and making labels unique
fn split_header(line: &str, delimiter: Delimiter) -> Vec<String> {
    let labels: Vec<&str> = match delimiter {
        Delimiter::Comma => line.split(',').collect(),
        Delimiter::Whitespace => line.split_whitespace().collect(),
    };

    let mut seen: HashMap<&str, usize> = HashMap::new();
    labels
        .into_iter()
        .map(unquote)
        .map(|label| {
            let count = seen.entry(label).or_insert(0);
            let unique = if *count == 0 {
                label.to_string()
            } else {
                format!("{label}_duplicated_{}", *count - 1)
            };
            *count += 1;
            unique
        })
        .collect()
}

/// Drop CSV quotes around a label; padding inside the quotes is kept
fn unquote(label: &str) -> &str {
    let trimmed = label.trim();
    match trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner,
        None => label,
    }
}

fn normalize_delimiters(line: &str, delimiter: Delimiter) -> String {
    match delimiter {
        Delimiter::Comma => line.to_string(),
        Delimiter::Whitespace => line.split_whitespace().collect::<Vec<_>>().join(","),
    }
}

/// Load comma-separated data rows as all-String columns named by `header`
fn load_text_frame(header: &[String], data: String) -> Result<DataFrame> {
    let schema = Schema::from_iter(
        header
            .iter()
            .map(|label| Field::new(label.as_str().into(), DataType::String)),
    );

    if data.is_empty() {
        return Ok(DataFrame::empty_with_schema(&schema));
    }

    let parse_options = CsvParseOptions::default()
        .with_separator(b',')
        .with_truncate_ragged_lines(true);

    let frame = CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(Arc::new(schema)))
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(data.into_bytes()))
        .finish()?;

    Ok(frame)
}
