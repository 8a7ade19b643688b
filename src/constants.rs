//! Application constants for the station record processor
//!
//! Column names, unit conversions, default file names and output naming
//! used by the default KNMI daily meteorology and Rhine discharge sources.

// =============================================================================
// KNMI Daily Meteorology (etmgeg) Source
// =============================================================================

/// KNMI daily station file for De Bilt (station 260)
pub const METEO_FILE_NAME: &str = "etmgeg_260.txt";

/// Number of metadata lines preceding the column header in etmgeg files
pub const METEO_SKIP_LINES: usize = 51;

/// Date column in etmgeg files, formatted as YYYYMMDD
pub const METEO_DATE_COLUMN: &str = "YYYYMMDD";
pub const METEO_DATE_FORMAT: &str = "%Y%m%d";

/// KNMI column codes
pub mod columns {
    /// Daily precipitation amount, 0.1 mm (-1 for <0.05 mm)
    pub const PRECIPITATION: &str = "RH";

    /// Potential evapotranspiration (Makkink), 0.1 mm
    pub const EVAPORATION: &str = "EV24";

    /// Daily mean temperature, 0.1 degrees Celsius
    pub const MEAN_TEMPERATURE: &str = "TG";
}

/// KNMI stores amounts and temperatures as integer tenths
pub const TENTHS: f64 = 0.1;

/// Decimal places matching the tenths resolution of KNMI records
pub const TENTHS_RESOLUTION: u32 = 1;

/// Raw precipitation values below this encode "less than 0.05 mm"
pub const PRECIP_SENTINEL_THRESHOLD: f64 = 0.0;

// =============================================================================
// Rhine Discharge Source
// =============================================================================

pub const DISCHARGE_FILE_NAME: &str = "Rhine_total.txt";
pub const DISCHARGE_DATE_COLUMN: &str = "date";
pub const DISCHARGE_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DISCHARGE_VALUE_COLUMN: &str = "Q";

// =============================================================================
// Output Naming
// =============================================================================

/// Index column names of the output tables
pub const DAILY_INDEX_COLUMN: &str = "Date";
pub const ANNUAL_INDEX_COLUMN: &str = "Year";

/// Output date formats
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const OUTPUT_YEAR_FORMAT: &str = "%Y";

pub mod outputs {
    pub const PRECIPITATION: &str = "Precip";
    pub const EVAPORATION: &str = "Evap";
    pub const TEMPERATURE: &str = "Tas";

    pub const DAILY_PRECIPITATION_FILE: &str = "dailyPrecipitation.csv";
    pub const ANNUAL_PRECIPITATION_FILE: &str = "annualPrecipitation.csv";
    pub const DAILY_EVAPORATION_FILE: &str = "dailyEvaporation.csv";
    pub const ANNUAL_EVAPORATION_FILE: &str = "annualEvaporation.csv";
    pub const DAILY_TEMPERATURE_FILE: &str = "dailyTemperature.csv";
    pub const DAILY_DISCHARGE_FILE: &str = "dailyDischarge.csv";
    pub const DAILY_METEO_TIDY_FILE: &str = "dailyMeteo.csv";
}

// =============================================================================
// Directories
// =============================================================================

pub const DEFAULT_INPUT_ROOT: &str = "RawData";
pub const DEFAULT_OUTPUT_ROOT: &str = "Data";

// =============================================================================
// Logging
// =============================================================================

pub const LOG_TARGET: &str = "hydromet_processor";
