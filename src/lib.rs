//! Station Record Processor Library
//!
//! Cleans raw KNMI daily meteorological records and river discharge series
//! and writes unit-converted, resampled CSV time series.
//!
//! This library provides tools for:
//! - Parsing fixed-format station files with a metadata block and padded headers
//! - Coercing, sentinel-correcting and scaling variable columns
//! - Resampling to daily (pass-through or mean) and annual (sum) granularity
//! - Writing and re-reading `Date`/`Year` indexed CSV tables

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod models;
pub mod processor;
pub mod resample;
pub mod transform;
pub mod writer;

pub use config::{ProcessorConfig, SourceConfig};
pub use error::{HydrometError, Result};
pub use models::{AnnualSeries, AnnualTrim, ClampStage, SentinelRule, TimeSeries, Variable};
pub use processor::StationProcessor;
