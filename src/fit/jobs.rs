//! Job builder: one self-contained fit job per prepared spectrum.

use std::sync::Arc;

use crate::domain::{InversionConfig, PrepConfig, Spectrum};

/// Work item for one spectrum.
///
/// `inversion` is owned by the job; `prep` is shared read-only by the batch.
#[derive(Debug, Clone)]
pub struct FitJob {
    pub data: Vec<[f64; 2]>,
    /// Private settings; `inversion.frequencies` are the spectrum's frequencies.
    pub inversion: InversionConfig,
    pub prep: Arc<PrepConfig>,
    /// 1-based position in the batch.
    pub nr: usize,
    pub nr_of_spectra: usize,
    /// Input row of the spectrum (0-based).
    pub index: usize,
}

impl FitJob {
    pub fn label(&self) -> JobLabel {
        JobLabel {
            nr: self.nr,
            index: self.index,
            prefix: self.inversion.global_prefix.clone(),
        }
    }
}

/// Identity of a job, kept by the caller once the job itself is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLabel {
    pub nr: usize,
    pub index: usize,
    pub prefix: String,
}

/// Output prefix for the spectrum at input row `index`.
pub fn spectrum_prefix(index: usize) -> String {
    format!("spec_{index:03}_")
}

/// Build one job per spectrum, in input order.
///
/// Each job receives its own copy of `inversion`, specialized with the
/// spectrum's frequencies, normalization factor and output prefix.
pub fn build_jobs(
    spectra: Vec<Spectrum>,
    inversion: &InversionConfig,
    prep: Arc<PrepConfig>,
) -> Vec<FitJob> {
    let nr_of_spectra = spectra.len();
    spectra
        .into_iter()
        .enumerate()
        .map(|(i, spectrum)| {
            let mut settings = inversion.clone();
            settings.frequencies = spectrum.frequencies;
            settings.norm_factor = spectrum.norm_factor;
            settings.global_prefix = spectrum_prefix(spectrum.index);
            FitJob {
                data: spectrum.data,
                inversion: settings,
                prep: Arc::clone(&prep),
                nr: i + 1,
                nr_of_spectra,
                index: spectrum.index,
            }
        })
        .collect()
}
