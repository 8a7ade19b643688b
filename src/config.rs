//! Configuration management and validation.
//!
//! Provides the processor configuration: input and output roots, the
//! source files with their format variants, and the variables extracted
//! from each source. Defaults describe the KNMI De Bilt daily record and
//! the Rhine discharge series.

use crate::constants::{self, columns, outputs};
use crate::error::{HydrometError, Result};
use crate::models::{
    AnnualTrim, ClampStage, ColumnMatching, DailyMode, Delimiter, InputFormat, SentinelRule,
    Variable,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One input file and the variables extracted from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name used in logs and reports
    pub name: String,

    /// File name, relative to the input root unless absolute
    pub file: PathBuf,

    #[serde(default)]
    pub format: InputFormat,

    pub date_column: String,

    /// chrono format of the date column
    pub date_format: String,

    pub daily: DailyMode,

    pub variables: Vec<Variable>,

    /// Optional combined table of all daily variables of this source
    #[serde(default)]
    pub tidy_output: Option<String>,
}

impl SourceConfig {
    /// KNMI daily meteorology: precipitation, evaporation and mean temperature
    pub fn knmi_daily() -> Self {
        Self {
            name: "meteo".to_string(),
            file: PathBuf::from(constants::METEO_FILE_NAME),
            format: InputFormat {
                skip_lines: constants::METEO_SKIP_LINES,
                delimiter: Delimiter::Comma,
                column_matching: ColumnMatching::Trimmed,
            },
            date_column: constants::METEO_DATE_COLUMN.to_string(),
            date_format: constants::METEO_DATE_FORMAT.to_string(),
            daily: DailyMode::PassThrough,
            variables: vec![
                Variable::new(columns::PRECIPITATION, outputs::PRECIPITATION)
                    .with_scale(constants::TENTHS)
                    .with_sentinel(SentinelRule::below_detection(ClampStage::Raw))
                    .with_resolution(constants::TENTHS_RESOLUTION)
                    .with_daily_file(outputs::DAILY_PRECIPITATION_FILE)
                    .with_annual_file(outputs::ANNUAL_PRECIPITATION_FILE, AnnualTrim::default()),
                Variable::new(columns::EVAPORATION, outputs::EVAPORATION)
                    .with_scale(constants::TENTHS)
                    .with_resolution(constants::TENTHS_RESOLUTION)
                    .with_daily_file(outputs::DAILY_EVAPORATION_FILE)
                    .with_annual_file(outputs::ANNUAL_EVAPORATION_FILE, AnnualTrim::default()),
                Variable::new(columns::MEAN_TEMPERATURE, outputs::TEMPERATURE)
                    .with_scale(constants::TENTHS)
                    .with_resolution(constants::TENTHS_RESOLUTION)
                    .with_daily_file(outputs::DAILY_TEMPERATURE_FILE),
            ],
            tidy_output: None,
        }
    }

    /// Rhine discharge: irregular entries averaged to one value per day
    pub fn rhine_discharge() -> Self {
        Self {
            name: "discharge".to_string(),
            file: PathBuf::from(constants::DISCHARGE_FILE_NAME),
            format: InputFormat::default(),
            date_column: constants::DISCHARGE_DATE_COLUMN.to_string(),
            date_format: constants::DISCHARGE_DATE_FORMAT.to_string(),
            daily: DailyMode::Mean,
            variables: vec![
                Variable::new(
                    constants::DISCHARGE_VALUE_COLUMN,
                    constants::DISCHARGE_VALUE_COLUMN,
                )
                .with_daily_file(outputs::DAILY_DISCHARGE_FILE),
            ],
            tidy_output: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_tidy_output(mut self, file: impl Into<String>) -> Self {
        self.tidy_output = Some(file.into());
        self
    }
}

/// Global configuration for station record processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Directory containing the raw source files
    pub input_root: PathBuf,

    /// Directory receiving the output tables
    pub output_root: PathBuf,

    pub sources: Vec<SourceConfig>,

    /// Record failed pipelines and continue with the remaining ones
    pub keep_going: bool,

    /// Parse sources and report their columns without writing output
    pub discovery_only: bool,

    pub show_progress: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(constants::DEFAULT_INPUT_ROOT),
            output_root: PathBuf::from(constants::DEFAULT_OUTPUT_ROOT),
            sources: vec![SourceConfig::knmi_daily(), SourceConfig::rhine_discharge()],
            keep_going: false,
            discovery_only: false,
            show_progress: true,
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from a TOML file; absent keys take default values
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|_| HydrometError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let config: Self =
            toml::from_str(&contents).map_err(|source| HydrometError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn with_input_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.input_root = root.into();
        self
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceConfig>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_keep_going(mut self) -> Self {
        self.keep_going = true;
        self
    }

    pub fn with_discovery_only(mut self) -> Self {
        self.discovery_only = true;
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Get a source configuration by name
    pub fn source_mut(&mut self, name: &str) -> Option<&mut SourceConfig> {
        self.sources.iter_mut().find(|source| source.name == name)
    }

    /// Absolute or input-root-relative path of a source file
    pub fn source_path(&self, source: &SourceConfig) -> PathBuf {
        if source.file.is_absolute() {
            source.file.clone()
        } else {
            self.input_root.join(&source.file)
        }
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_root.join(file)
    }

    /// Reject configurations that cannot produce well-defined output
    pub fn validate(&self) -> Result<()> {
        let mut output_files = HashSet::new();
        let mut claim = |file: &str| {
            if file.trim().is_empty() {
                return Err(HydrometError::configuration("output file names must not be empty"));
            }
            if !output_files.insert(file.to_string()) {
                return Err(HydrometError::configuration(format!(
                    "output file '{file}' is produced more than once"
                )));
            }
            Ok(())
        };

        for source in &self.sources {
            if source.date_column.trim().is_empty() {
                return Err(HydrometError::configuration(format!(
                    "source '{}' has no date column",
                    source.name
                )));
            }

            let mut output_names = HashSet::new();
            for variable in &source.variables {
                if variable.column.trim().is_empty() || variable.output_name.trim().is_empty() {
                    return Err(HydrometError::configuration(format!(
                        "source '{}' has a variable without column or output name",
                        source.name
                    )));
                }
                let name = variable.output_name.as_str();
                if name == constants::DAILY_INDEX_COLUMN || name == constants::ANNUAL_INDEX_COLUMN {
                    return Err(HydrometError::configuration(format!(
                        "variable '{name}' of source '{}' collides with an index column",
                        source.name
                    )));
                }
                if !output_names.insert(name) {
                    return Err(HydrometError::configuration(format!(
                        "output name '{name}' is used more than once in source '{}'",
                        source.name
                    )));
                }
                if !variable.scale.is_finite() {
                    return Err(HydrometError::configuration(format!(
                        "variable '{}' has a non-finite scale factor",
                        variable.output_name
                    )));
                }
                if let Some(file) = &variable.daily_file {
                    claim(file)?;
                }
                if let Some(annual) = &variable.annual {
                    claim(&annual.file)?;
                }
            }

            if let Some(file) = &source.tidy_output {
                claim(file)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ProcessorConfig::default();
        config.validate().unwrap();

        assert_eq!(config.sources.len(), 2);
        let meteo = &config.sources[0];
        assert_eq!(meteo.format.skip_lines, 51);
        assert_eq!(meteo.variables.len(), 3);
        assert_eq!(
            meteo.variables[0].sentinel.map(|rule| rule.stage),
            Some(ClampStage::Raw)
        );
        assert_eq!(config.sources[1].daily, DailyMode::Mean);
    }

    #[test]
    fn test_paths_resolve_against_roots() {
        let config = ProcessorConfig::default()
            .with_input_root("/data/raw")
            .with_output_root("/data/clean");

        assert_eq!(
            config.source_path(&config.sources[0]),
            PathBuf::from("/data/raw/etmgeg_260.txt")
        );
        assert_eq!(
            config.output_path("dailyPrecipitation.csv"),
            PathBuf::from("/data/clean/dailyPrecipitation.csv")
        );

        let absolute = SourceConfig::rhine_discharge().with_file("/elsewhere/q.txt");
        assert_eq!(config.source_path(&absolute), PathBuf::from("/elsewhere/q.txt"));
    }

    #[test]
    fn test_duplicate_output_file_rejected() {
        let mut discharge = SourceConfig::rhine_discharge();
        discharge.variables[0].daily_file = Some(outputs::DAILY_PRECIPITATION_FILE.to_string());
        let config = ProcessorConfig::default()
            .with_sources(vec![SourceConfig::knmi_daily(), discharge]);

        assert!(matches!(
            config.validate(),
            Err(HydrometError::Configuration { .. })
        ));
    }

    #[test]
    fn test_repeated_output_name_rejected() {
        let mut meteo = SourceConfig::knmi_daily().with_tidy_output("tidy.csv");
        meteo.variables[2].output_name = "Precip".to_string();
        let config = ProcessorConfig::default().with_sources(vec![meteo]);

        match config.validate() {
            Err(HydrometError::Configuration { message }) => assert!(message.contains("Precip")),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_output_name_matching_index_column_rejected() {
        for index in [constants::DAILY_INDEX_COLUMN, constants::ANNUAL_INDEX_COLUMN] {
            let mut discharge = SourceConfig::rhine_discharge();
            discharge.variables[0].output_name = index.to_string();
            let config = ProcessorConfig::default().with_sources(vec![discharge]);

            assert!(matches!(
                config.validate(),
                Err(HydrometError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_non_finite_scale_rejected() {
        let mut config = ProcessorConfig::default();
        config.source_mut("meteo").unwrap().variables[1].scale = f64::NAN;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_overrides_with_defaults() {
        let config: ProcessorConfig = toml::from_str(
            r#"
            input_root = "/tmp/raw"
            keep_going = true

            [[sources]]
            name = "discharge"
            file = "Lobith.csv"
            date_column = "date"
            date_format = "%Y-%m-%d"
            daily = "mean"

            [[sources.variables]]
            column = "discharge"
            output_name = "Q"
            daily_file = "dailyDischarge.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.input_root, PathBuf::from("/tmp/raw"));
        assert_eq!(config.output_root, PathBuf::from(constants::DEFAULT_OUTPUT_ROOT));
        assert!(config.keep_going);
        assert_eq!(config.sources.len(), 1);
        let source = &config.sources[0];
        assert_eq!(source.format, InputFormat::default());
        assert_eq!(source.variables[0].scale, 1.0);
        assert!(source.variables[0].annual.is_none());
        config.validate().unwrap();
    }
}
