//! Main processing engine.
//!
//! Runs the cleaning pipeline for every configured source: parse the file
//! once, parse its dates, then transform, resample and write each variable.
//! All outputs of a variable are computed before any of them is written.

#[cfg(test)]
pub mod tests;

use crate::config::{ProcessorConfig, SourceConfig};
use crate::error::Result;
use crate::header::{RawTable, read_raw_table};
use crate::models::{PipelineFailure, ProcessingStats, TimeSeries, Variable};
use crate::resample::{annual_totals, resample_daily};
use crate::transform::{parse_dates, transform_variable};
use crate::writer::{write_annual_csv, write_daily_csv, write_daily_table};

use chrono::NaiveDate;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Processor for the configured station sources
#[derive(Debug)]
pub struct StationProcessor {
    config: ProcessorConfig,
}

impl StationProcessor {
    /// Create a processor after validating the configuration
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Main processing entry point
    pub fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        println!(
            "{}",
            "Starting station record processing".bright_green().bold()
        );
        println!(
            "  {} {}",
            "Input:".bright_cyan(),
            self.config.input_root.display()
        );
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            self.config.output_root.display()
        );

        let progress = self.progress_bar();

        for source in &self.config.sources {
            let position = progress.position();

            match self.process_source(source, &progress, &mut stats) {
                Ok(()) => stats.sources_processed += 1,
                Err(e) if self.config.keep_going => {
                    error!("Source '{}' failed: {}", source.name, e);
                    stats.failures.push(PipelineFailure {
                        source: source.name.clone(),
                        variable: None,
                        reason: e.to_string(),
                    });
                    progress.set_position(position + source.variables.len() as u64);
                }
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            }
        }

        progress.finish_and_clear();
        stats.processing_time_ms = start_time.elapsed().as_millis();

        if !self.config.discovery_only {
            self.report_summary(&stats);
        }

        Ok(stats)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.show_progress || self.config.discovery_only {
            return ProgressBar::hidden();
        }

        let total: usize = self
            .config
            .sources
            .iter()
            .map(|source| source.variables.len())
            .sum();

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    fn process_source(
        &self,
        source: &SourceConfig,
        progress: &ProgressBar,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        let path = self.config.source_path(source);
        info!("Reading source '{}' from {}", source.name, path.display());

        let table = read_raw_table(&path, &source.format)?;
        stats.rows_read += table.row_count();

        if self.config.discovery_only {
            report_columns(source, &table);
            return Ok(());
        }

        let dates = parse_dates(&table, &source.date_column, &source.date_format)?;

        let mut daily_series = Vec::with_capacity(source.variables.len());
        for variable in &source.variables {
            progress.set_message(format!("{}: {}", source.name, variable.output_name));

            match self.process_variable(source, variable, &table, &dates, stats) {
                Ok(daily) => {
                    stats.variables_processed += 1;
                    daily_series.push(daily);
                }
                Err(e) if self.config.keep_going && !e.is_source_level() => {
                    warn!(
                        "Variable '{}' of source '{}' failed: {}",
                        variable.output_name, source.name, e
                    );
                    stats.failures.push(PipelineFailure {
                        source: source.name.clone(),
                        variable: Some(variable.output_name.clone()),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }

            progress.inc(1);
        }

        if let Some(file) = &source.tidy_output {
            if !daily_series.is_empty() {
                let path = self.config.output_path(file);
                write_daily_table(&daily_series, &path)?;
                stats.files_written.push(path);
            }
        }

        Ok(())
    }

    fn process_variable(
        &self,
        source: &SourceConfig,
        variable: &Variable,
        table: &RawTable,
        dates: &[NaiveDate],
        stats: &mut ProcessingStats,
    ) -> Result<TimeSeries> {
        let series = transform_variable(table, variable, dates)?;
        let daily = resample_daily(&series, source.daily);
        let annual = variable
            .annual
            .as_ref()
            .map(|output| (output, annual_totals(&daily, output.trim, variable.resolution)));

        stats.missing_values += daily.missing_count();

        if let Some(file) = &variable.daily_file {
            let path = self.config.output_path(file);
            let rows = write_daily_csv(&daily, &path)?;
            debug!("'{}' daily: {} rows", variable.output_name, rows);
            stats.files_written.push(path);
        }

        if let Some((output, annual)) = annual {
            let path = self.config.output_path(&output.file);
            let rows = write_annual_csv(&annual, &path)?;
            debug!("'{}' annual: {} rows", variable.output_name, rows);
            stats.files_written.push(path);
        }

        Ok(daily)
    }

    fn report_summary(&self, stats: &ProcessingStats) {
        println!("\n{}", "Processing Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Rows read:".bright_cyan(),
            stats.rows_read.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Variables processed:".bright_cyan(),
            stats.variables_processed.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Missing values:".bright_cyan(),
            stats.missing_values.to_string().bright_white()
        );
        for path in &stats.files_written {
            println!("  {} {}", "Wrote".bright_green(), path.display());
        }
        for failure in &stats.failures {
            println!(
                "  {} {}{}: {}",
                "Failed".bright_red().bold(),
                failure.source,
                failure
                    .variable
                    .as_ref()
                    .map(|variable| format!("/{variable}"))
                    .unwrap_or_default(),
                failure.reason
            );
        }
    }
}

/// Print the header of a source and whether each configured column resolves
fn report_columns(source: &SourceConfig, table: &RawTable) {
    println!(
        "\n{} {} ({})",
        "Source".bright_yellow(),
        source.name.bright_white().bold(),
        table.path().display()
    );
    println!(
        "  {} {} data rows after {} metadata lines",
        "Found".bright_green(),
        table.row_count(),
        table.boundaries().skip_rows
    );
    println!(
        "  {} {}",
        "Columns:".bright_cyan(),
        table
            .header()
            .iter()
            .map(|label| format!("'{label}'"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let requested = std::iter::once(source.date_column.as_str())
        .chain(source.variables.iter().map(|v| v.column.as_str()));
    for column in requested {
        match table.resolve_column(column) {
            Ok(label) => println!("  {} {} -> '{}'", "ok".bright_green(), column, label),
            Err(_) => println!("  {} {} not found", "missing".bright_red(), column),
        }
    }
}
