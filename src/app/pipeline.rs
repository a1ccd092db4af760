//! Shared pipeline logic behind the CLI commands.
//!
//! `dd fit`: ingest -> preprocess -> build jobs -> dispatch -> aggregate -> save
//!
//! Config and data problems surface before the first spectrum is fitted and
//! before the output directory is created.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::data::prepare_spectra;
use crate::data::sample::{SynthOptions, synth_spectra};
use crate::domain::{DdConfig, FailurePolicy};
use crate::error::AppError;
use crate::fit::{FitJob, build_jobs, dispatch, dispatch_isolated, fit_one_spectrum};
use crate::io::export::{fmt_row, fmt_value, write_lines};
use crate::io::{FitBatch, ensure_output_dir_available, load_dataset, save_fit_results};

/// Run a complete fit and write the results to `config.output_dir`.
pub fn run_fit(config: &DdConfig) -> Result<FitBatch, AppError> {
    config.validate()?;
    ensure_output_dir_available(&config.output_dir)?;

    let raw = load_dataset(&config.frequency_file, &config.data_file)?;
    info!(
        frequencies = raw.frequencies.len(),
        spectra = raw.rows.len(),
        "input loaded"
    );

    let spectra = prepare_spectra(&raw, &config.prep, config.inversion.model)?;
    let jobs = build_jobs(spectra, &config.inversion, Arc::new(config.prep.clone()));

    let batch = match config.failure_policy {
        FailurePolicy::AbortBatch => {
            FitBatch::from(dispatch(jobs, config.workers, fit_one_spectrum)?)
        }
        FailurePolicy::Isolate => {
            let labels = jobs.iter().map(FitJob::label).collect();
            let outcomes = dispatch_isolated(jobs, config.workers, fit_one_spectrum)?;
            FitBatch::from_outcomes(labels, outcomes)
        }
    };

    save_fit_results(&config.output_dir, &batch, config.output_format, config)?;
    Ok(batch)
}

/// Write `frequencies.dat` and `data.dat` (rmag_rpha) into a new directory.
pub fn run_synth(out_dir: &Path, opts: &SynthOptions) -> Result<(), AppError> {
    let set = synth_spectra(opts)?;
    ensure_output_dir_available(out_dir)?;
    fs::create_dir_all(out_dir).map_err(|e| {
        AppError::io(format!("Failed to create output directory '{}': {e}", out_dir.display()))
    })?;

    write_lines(
        &out_dir.join("frequencies.dat"),
        set.frequencies.iter().map(|&f| fmt_value(f)),
    )?;
    write_lines(
        &out_dir.join("data.dat"),
        set.rows().into_iter().map(|row| fmt_row(&row)),
    )?;

    info!(dir = %out_dir.display(), spectra = set.spectra.len(), "synthetic data written");
    Ok(())
}
