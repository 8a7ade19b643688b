//! Error handling integration tests

use super::{write_discharge_file, write_meteo_file};
use crate::config::{ProcessorConfig, SourceConfig};
use crate::error::HydrometError;
use crate::processor::StationProcessor;
use std::fs;
use tempfile::TempDir;

fn config_for(temp_dir: &TempDir) -> ProcessorConfig {
    ProcessorConfig::default()
        .with_input_root(temp_dir.path())
        .with_output_root(temp_dir.path().join("out"))
        .without_progress()
}

#[test]
fn test_missing_input_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();

    let processor = StationProcessor::new(config_for(&temp_dir)).unwrap();

    match processor.process().unwrap_err() {
        HydrometError::MissingFile { path } => {
            assert_eq!(path, temp_dir.path().join("etmgeg_260.txt"));
        }
        other => panic!("Expected MissingFile error, got {other:?}"),
    }
}

#[test]
fn test_missing_column_writes_no_output_for_variable() {
    let temp_dir = TempDir::new().unwrap();
    write_meteo_file(temp_dir.path(), "YYYYMMDD,RH,TG", &["20200101,4,100"]);

    let processor = StationProcessor::new(
        config_for(&temp_dir).with_sources(vec![SourceConfig::knmi_daily()]),
    )
    .unwrap();

    match processor.process().unwrap_err() {
        HydrometError::MissingColumn { column, .. } => assert_eq!(column, "EV24"),
        other => panic!("Expected MissingColumn error, got {other:?}"),
    }
    assert!(!temp_dir.path().join("out").join("dailyEvaporation.csv").exists());
}

#[test]
fn test_keep_going_records_variable_failure() {
    let temp_dir = TempDir::new().unwrap();
    write_meteo_file(temp_dir.path(), "YYYYMMDD,RH,TG", &["20200101,4,100"]);
    write_discharge_file(temp_dir.path(), "date,Q\n2020-01-01,10.0\n");

    let processor = StationProcessor::new(config_for(&temp_dir).with_keep_going()).unwrap();
    let stats = processor.process().unwrap();

    assert!(stats.has_failures());
    assert_eq!(stats.failures.len(), 1);
    assert_eq!(stats.failures[0].source, "meteo");
    assert_eq!(stats.failures[0].variable.as_deref(), Some("Evap"));
    assert_eq!(stats.sources_processed, 2);
    assert_eq!(stats.variables_processed, 3);

    let out = temp_dir.path().join("out");
    assert!(out.join("dailyPrecipitation.csv").exists());
    assert!(out.join("dailyTemperature.csv").exists());
    assert!(out.join("dailyDischarge.csv").exists());
    assert!(!out.join("dailyEvaporation.csv").exists());
}

#[test]
fn test_keep_going_records_source_failure() {
    let temp_dir = TempDir::new().unwrap();
    write_discharge_file(temp_dir.path(), "date,Q\n2020-01-01,10.0\n");

    let processor = StationProcessor::new(config_for(&temp_dir).with_keep_going()).unwrap();
    let stats = processor.process().unwrap();

    assert_eq!(stats.failures.len(), 1);
    assert_eq!(stats.failures[0].source, "meteo");
    assert!(stats.failures[0].variable.is_none());
    assert_eq!(stats.sources_processed, 1);
    assert!(temp_dir.path().join("out").join("dailyDischarge.csv").exists());
}

#[test]
fn test_invalid_date_aborts_source() {
    let temp_dir = TempDir::new().unwrap();
    write_discharge_file(temp_dir.path(), "date,Q\n2020-01-01,10.0\n01/02/2020,12.0\n");

    let processor = StationProcessor::new(
        config_for(&temp_dir).with_sources(vec![SourceConfig::rhine_discharge()]),
    )
    .unwrap();

    match processor.process().unwrap_err() {
        HydrometError::DateParse { row, value, .. } => {
            assert_eq!(row, 2);
            assert_eq!(value, "01/02/2020");
        }
        other => panic!("Expected DateParse error, got {other:?}"),
    }
    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_truncated_meteo_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("etmgeg_260.txt"), "BRON: KNMI\n").unwrap();

    let processor = StationProcessor::new(
        config_for(&temp_dir).with_sources(vec![SourceConfig::knmi_daily()]),
    )
    .unwrap();

    assert!(matches!(
        processor.process(),
        Err(HydrometError::TooFewLines {
            expected: 52,
            found: 1,
            ..
        })
    ));
}

#[test]
fn test_invalid_configuration_rejected() {
    let mut config = ProcessorConfig::default();
    config.sources[0].date_column = String::new();

    assert!(matches!(
        StationProcessor::new(config),
        Err(HydrometError::Configuration { .. })
    ));
}

#[test]
fn test_colliding_output_names_rejected_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    write_meteo_file(
        temp_dir.path(),
        "YYYYMMDD,RH,EV24,TG",
        &["20200101,-1,5,100"],
    );

    let mut meteo = SourceConfig::knmi_daily().with_tidy_output("tidy.csv");
    meteo.variables[2].output_name = "Precip".to_string();

    assert!(matches!(
        StationProcessor::new(config_for(&temp_dir).with_sources(vec![meteo])),
        Err(HydrometError::Configuration { .. })
    ));
    assert!(!temp_dir.path().join("out").exists());
}
