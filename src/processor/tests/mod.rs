//! Integration tests for the processor module
//!
//! Runs the complete pipeline against small synthetic station files.

pub mod error_handling;

use std::fs;
use std::path::Path;

/// Write a KNMI-style daily file with 51 metadata lines before the header
pub(crate) fn write_meteo_file(dir: &Path, header: &str, rows: &[&str]) {
    let mut contents = String::new();
    for line in 0..51 {
        contents.push_str(&format!("# metadata line {line}\n"));
    }
    contents.push_str(header);
    contents.push('\n');
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    fs::write(dir.join("etmgeg_260.txt"), contents).unwrap();
}

pub(crate) fn write_discharge_file(dir: &Path, contents: &str) {
    fs::write(dir.join("Rhine_total.txt"), contents).unwrap();
}
