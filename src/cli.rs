//! Command-line interface components.

use crate::config::ProcessorConfig;
use crate::constants::LOG_TARGET;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "hydromet_processor")]
#[command(about = "Clean and resample KNMI daily meteorology and river discharge records to CSV")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// TOML configuration file (defaults describe the KNMI and Rhine sources)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing the raw source files
    #[arg(short, long, value_name = "DIR")]
    pub input_root: Option<PathBuf>,

    /// Directory receiving the output tables
    #[arg(short, long, value_name = "DIR")]
    pub output_root: Option<PathBuf>,

    /// Meteorological source file name, relative to the input root
    #[arg(long, value_name = "FILE")]
    pub meteo_file: Option<PathBuf>,

    /// Discharge source file name, relative to the input root
    #[arg(long, value_name = "FILE")]
    pub discharge_file: Option<PathBuf>,

    /// Discharge value column in the discharge source
    #[arg(long, value_name = "NAME")]
    pub discharge_column: Option<String>,

    /// Record failed pipelines and continue with the remaining ones
    #[arg(long)]
    pub keep_going: bool,

    /// Report the columns of each source and exit without writing output
    #[arg(long)]
    pub discovery_only: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Build the processor configuration: file (or defaults), then CLI overrides
    pub fn build_config(&self) -> Result<ProcessorConfig> {
        let mut config = match &self.config {
            Some(path) => ProcessorConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => ProcessorConfig::default(),
        };

        if let Some(root) = &self.input_root {
            config.input_root = root.clone();
        }
        if let Some(root) = &self.output_root {
            config.output_root = root.clone();
        }
        if let Some(file) = &self.meteo_file {
            let source = config
                .source_mut("meteo")
                .context("Configuration has no 'meteo' source")?;
            source.file = file.clone();
        }
        if self.discharge_file.is_some() || self.discharge_column.is_some() {
            let source = config
                .source_mut("discharge")
                .context("Configuration has no 'discharge' source")?;
            if let Some(file) = &self.discharge_file {
                source.file = file.clone();
            }
            if let Some(column) = &self.discharge_column {
                for variable in &mut source.variables {
                    variable.column = column.clone();
                    variable.output_name = column.clone();
                }
            }
        }

        config.keep_going |= self.keep_going;
        config.discovery_only |= self.discovery_only;
        if self.no_progress {
            config.show_progress = false;
        }

        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", LOG_TARGET, log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
