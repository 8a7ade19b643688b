//! Error handling for station record processing.
//!
//! File- and column-level problems are fatal for the pipeline that hit them.
//! Cell-level value problems never surface here: they become missing values.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HydrometError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Input file not found or unreadable: {path}")]
    MissingFile { path: PathBuf },

    #[error("File {path} has {found} lines, expected at least {expected} (metadata lines plus header)")]
    TooFewLines {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' not found in {path} (available: {available})")]
    MissingColumn {
        path: PathBuf,
        column: String,
        available: String,
    },

    #[error("Invalid date '{value}' in column '{column}' of {path}, data row {row} (expected format {format})")]
    DateParse {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
        format: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl HydrometError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the error invalidates the whole source file rather than a single variable
    pub fn is_source_level(&self) -> bool {
        !matches!(self, HydrometError::MissingColumn { .. })
    }
}

pub type Result<T> = std::result::Result<T, HydrometError>;
