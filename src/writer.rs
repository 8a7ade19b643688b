//! CSV output of cleaned series.
//!
//! Every output table has a header row, an index column (`Date` or `Year`)
//! and named value columns. Missing values are written as empty cells and
//! existing files are replaced.

use crate::constants::{
    ANNUAL_INDEX_COLUMN, DAILY_INDEX_COLUMN, OUTPUT_DATE_FORMAT, OUTPUT_YEAR_FORMAT,
};
use crate::error::{HydrometError, Result};
use crate::header::read_raw_table;
use crate::models::{AnnualSeries, ColumnMatching, InputFormat, TimeSeries};
use crate::transform::{coerce_value, parse_dates};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Write a daily series as `Date,<name>`; returns the number of rows written
pub fn write_daily_csv(series: &TimeSeries, path: &Path) -> Result<usize> {
    let dates: Vec<String> = series
        .points()
        .iter()
        .map(|(date, _)| date.format(OUTPUT_DATE_FORMAT).to_string())
        .collect();
    let values: Vec<Option<f64>> = series.points().iter().map(|(_, value)| *value).collect();

    let frame = DataFrame::new(vec![
        Series::new(DAILY_INDEX_COLUMN.into(), dates).into(),
        Series::new(series.name().into(), values).into(),
    ])?;

    write_frame(frame, path)
}

/// Write an annual series as `Year,<name>`; returns the number of rows written
pub fn write_annual_csv(series: &AnnualSeries, path: &Path) -> Result<usize> {
    let years: Vec<String> = series
        .points()
        .iter()
        .map(|(year, _)| format_year(*year))
        .collect();
    let values: Vec<Option<f64>> = series.points().iter().map(|(_, value)| *value).collect();

    let frame = DataFrame::new(vec![
        Series::new(ANNUAL_INDEX_COLUMN.into(), years).into(),
        Series::new(series.name().into(), values).into(),
    ])?;

    write_frame(frame, path)
}

/// Write several daily series side by side, outer-joined on date
pub fn write_daily_table(series: &[TimeSeries], path: &Path) -> Result<usize> {
    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (index, one) in series.iter().enumerate() {
        for (date, value) in one.points() {
            let row = rows
                .entry(*date)
                .or_insert_with(|| vec![None; series.len()]);
            row[index] = *value;
        }
    }

    let dates: Vec<String> = rows
        .keys()
        .map(|date| date.format(OUTPUT_DATE_FORMAT).to_string())
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(series.len() + 1);
    columns.push(Series::new(DAILY_INDEX_COLUMN.into(), dates).into());
    for (index, one) in series.iter().enumerate() {
        let values: Vec<Option<f64>> = rows.values().map(|row| row[index]).collect();
        columns.push(Series::new(one.name().into(), values).into());
    }

    write_frame(DataFrame::new(columns)?, path)
}

/// Read a daily table written by [`write_daily_csv`]
pub fn read_daily_csv(path: &Path, value_column: &str) -> Result<TimeSeries> {
    let table = read_raw_table(path, &output_format())?;
    let dates = parse_dates(&table, DAILY_INDEX_COLUMN, OUTPUT_DATE_FORMAT)?;
    let values = table.text_column(value_column)?;

    Ok(TimeSeries::new(
        value_column,
        dates
            .into_iter()
            .zip(values)
            .map(|(date, cell)| (date, coerce_value(cell)))
            .collect(),
    ))
}

/// Read an annual table written by [`write_annual_csv`]
pub fn read_annual_csv(path: &Path, value_column: &str) -> Result<AnnualSeries> {
    let table = read_raw_table(path, &output_format())?;
    let years = table.text_column(ANNUAL_INDEX_COLUMN)?;
    let values = table.text_column(value_column)?;

    let mut points = Vec::with_capacity(years.len());
    for (index, (year, value)) in years.into_iter().zip(values).enumerate() {
        let text = year.unwrap_or("").trim();
        let year = text.parse::<i32>().map_err(|_| HydrometError::DateParse {
            path: path.to_path_buf(),
            column: ANNUAL_INDEX_COLUMN.to_string(),
            row: index + 1,
            value: text.to_string(),
            format: OUTPUT_YEAR_FORMAT.to_string(),
        })?;
        points.push((year, coerce_value(value)));
    }

    Ok(AnnualSeries::new(value_column, points))
}

fn output_format() -> InputFormat {
    InputFormat {
        column_matching: ColumnMatching::Exact,
        ..InputFormat::default()
    }
}

fn format_year(year: i32) -> String {
    format!("{year:04}")
}

fn write_frame(mut frame: DataFrame, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut frame)?;

    debug!("Wrote {} rows to {}", frame.height(), path.display());
    Ok(frame.height())
}
