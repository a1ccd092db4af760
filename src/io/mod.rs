//! Input/output.
//!
//! - text ingest of frequency and data files (`ingest`)
//! - result aggregation (`FitBatch`) and writer selection (this module)
//! - plain ascii result directory (`export`)
//! - single annotated result file (`audit`)

pub mod audit;
pub mod export;
pub mod ingest;

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::{DdConfig, OutputFormat};
use crate::error::AppError;
use crate::fit::{JobLabel, SpectrumFit};

pub use ingest::*;

/// A job that failed while the rest of the batch kept running.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub label: JobLabel,
    pub error: AppError,
}

/// Ordered collection of fitted spectra handed to a writer.
#[derive(Debug, Clone, Default)]
pub struct FitBatch {
    pub fits: Vec<SpectrumFit>,
    pub failures: Vec<JobFailure>,
}

impl From<SpectrumFit> for FitBatch {
    fn from(fit: SpectrumFit) -> Self {
        Self {
            fits: vec![fit],
            failures: Vec::new(),
        }
    }
}

impl From<Vec<SpectrumFit>> for FitBatch {
    fn from(fits: Vec<SpectrumFit>) -> Self {
        Self {
            fits,
            failures: Vec::new(),
        }
    }
}

impl FitBatch {
    /// Split per-job outcomes (in job order) into fits and failures.
    pub fn from_outcomes(
        labels: Vec<JobLabel>,
        outcomes: Vec<Result<SpectrumFit, AppError>>,
    ) -> Self {
        let mut batch = FitBatch::default();
        for (label, outcome) in labels.into_iter().zip(outcomes) {
            match outcome {
                Ok(fit) => batch.fits.push(fit),
                Err(error) => {
                    warn!(spectrum = label.nr, prefix = %label.prefix, %error, "spectrum failed");
                    batch.failures.push(JobFailure { label, error });
                }
            }
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.fits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }
}

/// Write a batch with the selected output format.
///
/// `out_dir` is created; it must not exist yet.
pub fn save_fit_results(
    out_dir: &Path,
    batch: &FitBatch,
    format: OutputFormat,
    config: &DdConfig,
) -> Result<(), AppError> {
    ensure_output_dir_available(out_dir)?;
    fs::create_dir_all(out_dir).map_err(|e| {
        AppError::io(format!("Failed to create output directory '{}': {e}", out_dir.display()))
    })?;

    match format {
        OutputFormat::Ascii => export::write_ascii(out_dir, batch)?,
        OutputFormat::AsciiAudit => audit::write_ascii_audit(out_dir, batch, config)?,
    }

    info!(
        dir = %out_dir.display(),
        format = %format,
        spectra = batch.len(),
        failures = batch.failures.len(),
        "results saved"
    );
    Ok(())
}

/// Parse the output-format flag and write the batch.
///
/// An unknown flag is rejected before anything touches the filesystem.
pub fn save_fit_results_as(
    out_dir: &Path,
    batch: &FitBatch,
    format: &str,
    config: &DdConfig,
) -> Result<(), AppError> {
    let format: OutputFormat = format.parse()?;
    save_fit_results(out_dir, batch, format, config)
}
