//! Column selection, numeric coercion and unit conversion.
//!
//! Turns the raw text columns of a [`RawTable`] into date-indexed series.
//! Cells that do not hold a finite number become missing values; a date cell
//! that does not match the declared format aborts the source.

use crate::error::{HydrometError, Result};
use crate::header::RawTable;
use crate::models::{ClampStage, TimeSeries, Variable};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Parse the date column of a table, one date per row
pub fn parse_dates(table: &RawTable, column: &str, format: &str) -> Result<Vec<NaiveDate>> {
    let cells = table.text_column(column)?;
    let mut dates = Vec::with_capacity(cells.len());

    for (index, cell) in cells.into_iter().enumerate() {
        let text = cell.unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(text, format).map_err(|_| {
            HydrometError::DateParse {
                path: table.path().to_path_buf(),
                column: column.to_string(),
                row: index + 1,
                value: text.to_string(),
                format: format.to_string(),
            }
        })?;
        dates.push(date);
    }

    Ok(dates)
}

/// Coerce a raw cell to a number; anything that is not a finite number is missing
pub fn coerce_value(cell: Option<&str>) -> Option<f64> {
    let text = cell?.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Apply sentinel correction, scaling and rounding to a raw number
pub fn convert_value(raw: f64, variable: &Variable) -> f64 {
    let mut value = raw;

    if let Some(rule) = variable.sentinel.filter(|rule| rule.stage == ClampStage::Raw) {
        value = rule.apply(value);
    }

    value *= variable.scale;

    if let Some(rule) = variable.sentinel.filter(|rule| rule.stage == ClampStage::Scaled) {
        value = rule.apply(value);
    }

    match variable.resolution {
        Some(decimals) => round_to(value, decimals),
        None => value,
    }
}

/// Round to a number of decimal places, normalising negative zero
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Build the cleaned series of one variable, pairing each row with its date
pub fn transform_variable(
    table: &RawTable,
    variable: &Variable,
    dates: &[NaiveDate],
) -> Result<TimeSeries> {
    let cells = table.text_column(&variable.column)?;

    if cells.len() != dates.len() {
        return Err(HydrometError::configuration(format!(
            "column '{}' of {} has {} rows but the date column has {}",
            variable.column,
            table.path().display(),
            cells.len(),
            dates.len()
        )));
    }

    let mut coerced_missing = 0;
    let points = cells
        .into_iter()
        .zip(dates)
        .map(|(cell, date)| {
            let value = coerce_value(cell);
            if value.is_none() && cell.is_some_and(|text| !text.trim().is_empty()) {
                coerced_missing += 1;
            }
            (*date, value.map(|raw| convert_value(raw, variable)))
        })
        .collect();

    let series = TimeSeries::new(variable.output_name.clone(), points);

    if coerced_missing > 0 {
        warn!(
            "{} non-numeric values in column '{}' of {} treated as missing",
            coerced_missing,
            variable.column,
            table.path().display()
        );
    }
    debug!(
        "Transformed '{}' -> '{}': {} rows, {} missing",
        variable.column,
        variable.output_name,
        series.len(),
        series.missing_count()
    );

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::read_raw_table;
    use crate::models::{InputFormat, SentinelRule};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn precipitation(stage: ClampStage) -> Variable {
        Variable::new("RH", "Precip")
            .with_scale(0.1)
            .with_sentinel(SentinelRule::below_detection(stage))
            .with_resolution(1)
    }

    fn table_from(contents: &str) -> (NamedTempFile, RawTable) {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{contents}").unwrap();
        let table = read_raw_table(temp_file.path(), &InputFormat::default()).unwrap();
        (temp_file, table)
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value(Some("  12")), Some(12.0));
        assert_eq!(coerce_value(Some("-1")), Some(-1.0));
        assert_eq!(coerce_value(Some("3.25 ")), Some(3.25));
        assert_eq!(coerce_value(Some("     ")), None);
        assert_eq!(coerce_value(Some("n/a")), None);
        assert_eq!(coerce_value(Some("NaN")), None);
        assert_eq!(coerce_value(None), None);
    }

    #[test]
    fn test_scaling_matches_scale_times_parse() {
        let variable = Variable::new("TG", "Tas").with_scale(0.1);
        for raw in [-153.0, -1.0, 0.0, 7.0, 95.0, 312.0] {
            assert_eq!(convert_value(raw, &variable), 0.1 * raw);
        }

        let rounded = Variable::new("TG", "Tas").with_scale(0.1).with_resolution(1);
        for raw in [-153.0, -1.0, 0.0, 7.0, 95.0, 312.0] {
            assert!((convert_value(raw, &rounded) - 0.1 * raw).abs() < 1e-9);
        }
        assert_eq!(convert_value(12.0, &rounded), 1.2);
        assert_eq!(convert_value(-3.0, &rounded), -0.3);
    }

    #[test]
    fn test_raw_stage_clamp_boundary() {
        let variable = precipitation(ClampStage::Raw);
        assert_eq!(convert_value(-1.0, &variable), 0.0);
        assert_eq!(convert_value(-0.5, &variable), 0.0);
        assert_eq!(convert_value(0.0, &variable), 0.0);
        assert_eq!(convert_value(1.0, &variable), 0.1);
    }

    #[test]
    fn test_scaled_stage_clamp_boundary() {
        let variable = Variable::new("RH", "Precip")
            .with_scale(0.1)
            .with_sentinel(SentinelRule {
                threshold: 0.05,
                floor: 0.0,
                stage: ClampStage::Scaled,
            })
            .with_resolution(2);
        // Raw 0 scales to 0.0 (below 0.05) and -1 to -0.1
        assert_eq!(convert_value(-1.0, &variable), 0.0);
        assert_eq!(convert_value(0.0, &variable), 0.0);
        // 0.5 * 0.1 == 0.05 sits exactly on the threshold and is kept
        assert_eq!(convert_value(0.5, &variable), 0.05);
        assert_eq!(convert_value(1.0, &variable), 0.1);
    }

    #[test]
    fn test_clamp_stage_changes_outcome() {
        let rule = SentinelRule {
            threshold: 1.0,
            floor: 0.0,
            stage: ClampStage::Raw,
        };
        let raw_stage = Variable::new("RH", "Precip").with_scale(0.1).with_sentinel(rule);
        let scaled_stage = Variable::new("RH", "Precip").with_scale(0.1).with_sentinel(SentinelRule {
            stage: ClampStage::Scaled,
            ..rule
        });

        // Raw 5 passes a raw threshold of 1 but 0.5 falls under it once scaled
        assert_eq!(convert_value(5.0, &raw_stage), 0.5);
        assert_eq!(convert_value(5.0, &scaled_stage), 0.0);
    }

    #[test]
    fn test_round_to_normalises_negative_zero() {
        let value = round_to(-0.01, 1);
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn test_parse_dates_compact_format() {
        let (_file, table) = table_from("YYYYMMDD,RH\n20200101,1\n 20200102 ,2\n");

        let dates = parse_dates(&table, "YYYYMMDD", "%Y%m%d").unwrap();

        assert_eq!(dates, vec![date(2020, 1, 1), date(2020, 1, 2)]);
    }

    #[test]
    fn test_invalid_date_reports_row() {
        let (_file, table) = table_from("date,Q\n2020-01-01,1\n2020-02-30,2\n");

        match parse_dates(&table, "date", "%Y-%m-%d").unwrap_err() {
            HydrometError::DateParse { row, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(value, "2020-02-30");
            }
            other => panic!("Expected DateParse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_date_cell_is_fatal() {
        let (_file, table) = table_from("date,Q\n,1\n");

        assert!(matches!(
            parse_dates(&table, "date", "%Y-%m-%d"),
            Err(HydrometError::DateParse { row: 1, .. })
        ));
    }

    #[test]
    fn test_unparseable_value_becomes_missing_in_place() {
        let (_file, table) =
            table_from("YYYYMMDD,RH\n20200101,4\n20200102,xx\n20200103,\n20200104,-1\n");
        let dates = parse_dates(&table, "YYYYMMDD", "%Y%m%d").unwrap();

        let series = transform_variable(&table, &precipitation(ClampStage::Raw), &dates).unwrap();

        assert_eq!(series.name(), "Precip");
        assert_eq!(
            series.points(),
            &[
                (date(2020, 1, 1), Some(0.4)),
                (date(2020, 1, 2), None),
                (date(2020, 1, 3), None),
                (date(2020, 1, 4), Some(0.0)),
            ]
        );
    }

    #[test]
    fn test_missing_column_is_reported() {
        let (_file, table) = table_from("YYYYMMDD,TG\n20200101,4\n");
        let dates = parse_dates(&table, "YYYYMMDD", "%Y%m%d").unwrap();

        assert!(matches!(
            transform_variable(&table, &precipitation(ClampStage::Raw), &dates),
            Err(HydrometError::MissingColumn { .. })
        ));
    }
}
