//! Temporal aggregation of cleaned series.
//!
//! Daily series are either passed through or averaged per calendar day.
//! Annual series are calendar-year sums followed by an explicit trim of the
//! boundary buckets.

use crate::models::{AnnualSeries, AnnualTrim, DailyMode, TimeSeries};
use crate::transform::round_to;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Sum of one calendar year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualBucket {
    pub year: i32,
    /// None when the year holds no non-missing value
    pub total: Option<f64>,
    pub observed_days: usize,
}

/// Derive the daily series of a source
pub fn resample_daily(series: &TimeSeries, mode: DailyMode) -> TimeSeries {
    match mode {
        DailyMode::PassThrough => {
            let duplicates = duplicate_dates(series);
            if duplicates > 0 {
                warn!(
                    "'{}' has {} repeated dates; pass-through keeps every row and annual sums count each",
                    series.name(),
                    duplicates
                );
            }
            series.clone()
        }
        DailyMode::Mean => daily_mean(series),
    }
}

/// Number of points whose date equals the previous point's date
fn duplicate_dates(series: &TimeSeries) -> usize {
    series
        .points()
        .windows(2)
        .filter(|pair| pair[0].0 == pair[1].0)
        .count()
}

/// Average entries sharing a date; every calendar day between the first and
/// last entry is present, days without a value are missing
pub fn daily_mean(series: &TimeSeries) -> TimeSeries {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return TimeSeries::new(series.name(), Vec::new());
    };

    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for (date, value) in series.points() {
        let entry = days.entry(*date).or_insert((0.0, 0));
        if let Some(value) = value {
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let points: Vec<_> = first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            let mean = days
                .get(&date)
                .filter(|(_, count)| *count > 0)
                .map(|(sum, count)| sum / *count as f64);
            (date, mean)
        })
        .collect();

    debug!(
        "Daily mean of '{}': {} entries -> {} days",
        series.name(),
        series.len(),
        points.len()
    );

    TimeSeries::new(series.name(), points)
}

/// Group daily values by calendar year and sum them, skipping missing values.
/// Years between the first and last year without any row are included as missing.
pub fn annual_buckets(series: &TimeSeries, resolution: Option<u32>) -> Vec<AnnualBucket> {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return Vec::new();
    };

    let mut years: BTreeMap<i32, (f64, usize)> =
        (first.year()..=last.year()).map(|year| (year, (0.0, 0))).collect();

    for (date, value) in series.points() {
        if let Some(value) = value {
            let entry = years.entry(date.year()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    years
        .into_iter()
        .map(|(year, (sum, observed_days))| AnnualBucket {
            year,
            total: (observed_days > 0).then(|| match resolution {
                Some(decimals) => round_to(sum, decimals),
                None => sum,
            }),
            observed_days,
        })
        .collect()
}

/// Drop annual buckets according to the trim policy
pub fn trim_annual(buckets: &[AnnualBucket], trim: AnnualTrim) -> Vec<AnnualBucket> {
    match trim {
        AnnualTrim::Fixed { leading, trailing } => {
            if buckets.len() <= leading.saturating_add(trailing) {
                return Vec::new();
            }
            buckets[leading..buckets.len() - trailing].to_vec()
        }
        AnnualTrim::CompleteYears { min_days } => buckets
            .iter()
            .filter(|bucket| bucket.observed_days >= min_days)
            .copied()
            .collect(),
    }
}

/// Calendar-year totals of a daily series after trimming
pub fn annual_totals(series: &TimeSeries, trim: AnnualTrim, resolution: Option<u32>) -> AnnualSeries {
    let buckets = annual_buckets(series, resolution);
    let kept = trim_annual(&buckets, trim);

    debug!(
        "Annual totals of '{}': {} years, {} kept after {:?}",
        series.name(),
        buckets.len(),
        kept.len(),
        trim
    );

    AnnualSeries::new(
        series.name(),
        kept.into_iter()
            .map(|bucket| (bucket.year, bucket.total))
            .collect(),
    )
}
