//! Text-file ingest.
//!
//! Input files are plain whitespace-separated numbers:
//!
//! - frequency file: `Nf` values, any layout
//! - data file: one spectrum per line, `2 * Nf` values each
//!
//! Blank lines and lines starting with `#` are skipped. `nan` marks a missing
//! value. Structural checks (row length vs. frequency count) happen in the
//! preprocessor; this module only turns text into numbers.

use std::fs;
use std::path::Path;

use crate::domain::RawDataset;
use crate::error::AppError;

fn read_text(path: &Path, what: &str) -> Result<String, AppError> {
    fs::read_to_string(path)
        .map_err(|e| AppError::data(format!("Failed to read {what} '{}': {e}", path.display())))
}

fn parse_line(line: &str, line_nr: usize, path: &Path) -> Result<Vec<f64>, AppError> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                AppError::data(format!(
                    "Invalid number '{token}' in '{}' line {line_nr}.",
                    path.display()
                ))
            })
        })
        .collect()
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Read the frequency file into a flat vector.
pub fn read_frequencies(path: &Path) -> Result<Vec<f64>, AppError> {
    let text = read_text(path, "frequency file")?;
    let mut out = Vec::new();
    for (line_nr, line) in data_lines(&text) {
        out.extend(parse_line(line, line_nr, path)?);
    }
    if out.is_empty() {
        return Err(AppError::data(format!(
            "Frequency file '{}' contains no values.",
            path.display()
        )));
    }
    Ok(out)
}

/// Read the data file, one row per spectrum.
pub fn read_data_rows(path: &Path) -> Result<Vec<Vec<f64>>, AppError> {
    let text = read_text(path, "data file")?;
    data_lines(&text)
        .map(|(line_nr, line)| parse_line(line, line_nr, path))
        .collect()
}

/// Load both input files.
pub fn load_dataset(frequency_file: &Path, data_file: &Path) -> Result<RawDataset, AppError> {
    Ok(RawDataset {
        frequencies: read_frequencies(frequency_file)?,
        rows: read_data_rows(data_file)?,
    })
}

/// Fail if the output directory already exists.
pub fn ensure_output_dir_available(path: &Path) -> Result<(), AppError> {
    if path.exists() {
        return Err(AppError::config(format!(
            "Output directory '{}' already exists.",
            path.display()
        )));
    }
    Ok(())
}
