//! Core data structures and types for station record processing.
//!
//! Defines variable definitions, input format variants, the cleaned time
//! series produced by the pipeline, and processing statistics.

use crate::constants::PRECIP_SENTINEL_THRESHOLD;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column delimiter of a source file variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    /// Cells separated by runs of spaces or tabs
    Whitespace,
}

/// How requested column names are matched against header labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMatching {
    /// Compare labels verbatim, padding included
    Exact,
    /// Compare labels after trimming surrounding whitespace
    Trimmed,
}

impl ColumnMatching {
    pub fn matches(&self, label: &str, requested: &str) -> bool {
        match self {
            ColumnMatching::Exact => label == requested,
            ColumnMatching::Trimmed => label.trim() == requested.trim(),
        }
    }
}

/// Layout of a fixed-format source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFormat {
    /// Metadata lines preceding the column header
    pub skip_lines: usize,
    pub delimiter: Delimiter,
    pub column_matching: ColumnMatching,
}

impl Default for InputFormat {
    fn default() -> Self {
        Self {
            skip_lines: 0,
            delimiter: Delimiter::Comma,
            column_matching: ColumnMatching::Trimmed,
        }
    }
}

/// Line boundaries of a parsed source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBoundaries {
    pub skip_rows: usize,
    /// Zero-based line index of the column header
    pub header_line: usize,
    pub data_rows: usize,
    pub total_lines: usize,
}

/// Units in which a sentinel threshold is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampStage {
    /// Compare against the raw file value, before scaling
    Raw,
    /// Compare against the value after scaling to physical units
    Scaled,
}

/// Replaces values strictly below `threshold` with `floor`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentinelRule {
    pub threshold: f64,
    pub floor: f64,
    pub stage: ClampStage,
}

impl SentinelRule {
    /// KNMI precipitation: -1 encodes "less than 0.05 mm", clamped to zero in raw units
    pub fn below_detection(stage: ClampStage) -> Self {
        Self {
            threshold: PRECIP_SENTINEL_THRESHOLD,
            floor: 0.0,
            stage,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if value < self.threshold {
            self.floor
        } else {
            value
        }
    }
}

/// How the daily series of a source is derived from its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyMode {
    /// One row per day already; keep rows as they are
    PassThrough,
    /// Average entries sharing a date and fill calendar gaps with missing days
    Mean,
}

/// Which annual buckets are dropped after summation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnnualTrim {
    /// Unconditionally drop the first `leading` and last `trailing` buckets
    Fixed { leading: usize, trailing: usize },
    /// Keep only years with at least `min_days` non-missing daily values
    CompleteYears { min_days: usize },
}

impl Default for AnnualTrim {
    fn default() -> Self {
        AnnualTrim::Fixed {
            leading: 1,
            trailing: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualOutput {
    pub file: String,
    #[serde(default)]
    pub trim: AnnualTrim,
}

/// A physical quantity extracted from one column of a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Source column label
    pub column: String,
    /// Value column name in the output tables
    pub output_name: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub sentinel: Option<SentinelRule>,
    /// Decimal places kept after scaling
    #[serde(default)]
    pub resolution: Option<u32>,
    /// Daily output file name, relative to the output root
    pub daily_file: Option<String>,
    #[serde(default)]
    pub annual: Option<AnnualOutput>,
}

fn default_scale() -> f64 {
    1.0
}

impl Variable {
    pub fn new(column: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            output_name: output_name.into(),
            scale: 1.0,
            sentinel: None,
            resolution: None,
            daily_file: None,
            annual: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_sentinel(mut self, rule: SentinelRule) -> Self {
        self.sentinel = Some(rule);
        self
    }

    pub fn with_resolution(mut self, decimals: u32) -> Self {
        self.resolution = Some(decimals);
        self
    }

    pub fn with_daily_file(mut self, file: impl Into<String>) -> Self {
        self.daily_file = Some(file.into());
        self
    }

    pub fn with_annual_file(mut self, file: impl Into<String>, trim: AnnualTrim) -> Self {
        self.annual = Some(AnnualOutput {
            file: file.into(),
            trim,
        });
        self
    }
}

/// Date-indexed series of a single variable, ordered by date
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl TimeSeries {
    /// Build a series; points are stably sorted so equal dates keep source order
    pub fn new(name: impl Into<String>, mut points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_none()).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(date, _)| *date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(date, _)| *date)
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<Option<f64>> {
        self.points
            .iter()
            .find(|(d, _)| *d == date)
            .map(|(_, value)| *value)
    }
}

/// Calendar-year totals of a variable, ordered by year
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSeries {
    name: String,
    points: Vec<(i32, Option<f64>)>,
}

impl AnnualSeries {
    pub fn new(name: impl Into<String>, mut points: Vec<(i32, Option<f64>)>) -> Self {
        points.sort_by_key(|(year, _)| *year);
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[(i32, Option<f64>)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|(year, _)| *year).collect()
    }
}

/// A variable pipeline that did not complete
#[derive(Debug, Clone)]
pub struct PipelineFailure {
    pub source: String,
    /// None when the whole source failed
    pub variable: Option<String>,
    pub reason: String,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub sources_processed: usize,
    pub variables_processed: usize,
    pub rows_read: usize,
    pub missing_values: usize,
    pub files_written: Vec<PathBuf>,
    pub failures: Vec<PipelineFailure>,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
