//! Inversion adapter: turns one `FitJob` into a configured engine run.

use nalgebra::Complex;
use tracing::{debug, info};

use crate::data::convert::to_model_domain;
use crate::domain::ModelFormulation;
use crate::error::AppError;
use crate::fit::engine::{
    DecompositionEngine, EngineOptions, InversionEngine, Iteration, RmsComponent,
};
use crate::fit::jobs::FitJob;
use crate::fit::tau_grid::{TauGrid, tau_grid};
use crate::models::{predict, undo_normalization};
use crate::stats::{compute_stats, stats_callback};

/// Result of one spectrum.
#[derive(Debug, Clone)]
pub struct SpectrumFit {
    /// 1-based position in the batch.
    pub nr: usize,
    /// Input row (0-based).
    pub index: usize,
    pub prefix: String,
    pub model: ModelFormulation,
    pub frequencies: Vec<f64>,
    /// Measured data in the fitted domain, not normalized.
    pub data: Vec<Complex<f64>>,
    pub tau: TauGrid,
    /// All iterations; the last one is the final model.
    pub iterations: Vec<Iteration>,
    pub norm_factor: Option<f64>,
}

impl SpectrumFit {
    pub fn final_iteration(&self) -> Option<&Iteration> {
        self.iterations.last()
    }

    /// Model response of the final iteration at the data frequencies.
    pub fn model_response(&self) -> Vec<Complex<f64>> {
        let Some(last) = self.final_iteration() else {
            return Vec::new();
        };
        self.frequencies
            .iter()
            .map(|&f| predict(self.model, f, &last.pars, &self.tau.tau))
            .collect()
    }
}

/// Fit one spectrum.
pub fn fit_one_spectrum(job: FitJob) -> Result<SpectrumFit, AppError> {
    let FitJob {
        data,
        inversion,
        prep,
        nr,
        nr_of_spectra,
        index,
    } = job;

    info!(
        spectrum = nr,
        of = nr_of_spectra,
        prefix = %inversion.global_prefix,
        "fitting spectrum"
    );

    let model = inversion.model;
    let frequencies = inversion.frequencies.clone();
    let measured: Vec<Complex<f64>> = data
        .iter()
        .map(|&sample| to_model_domain(prep.data_format, model, sample))
        .collect();
    let scale = inversion.norm_factor.unwrap_or(1.0);
    let scaled: Vec<Complex<f64>> = measured.iter().map(|&d| d * scale).collect();

    let tau = tau_grid(&frequencies, inversion.tausel, inversion.nr_terms_decade)?;
    debug!(spectrum = nr, n_tau = tau.len(), "tau grid ready");

    let options = EngineOptions {
        spectrum: nr,
        frequencies: frequencies.clone(),
        data: scaled,
        tau: tau.clone(),
        lambda: prep.lambda,
        max_iterations: inversion.max_iterations,
        rms_component: RmsComponent::Imaginary,
    };
    let mut engine =
        DecompositionEngine::configure(model, options, stats_callback(prep.tau_x.clone()))?;
    let mut iterations = engine.run_inversion()?.to_vec();

    // The normalized RMS is unaffected by the data scale.
    if let Some(factor) = inversion.norm_factor {
        for it in &mut iterations {
            undo_normalization(model, &mut it.pars, factor);
            it.stats = compute_stats(&it.pars, &tau.tau, &tau.s, &prep.tau_x);
        }
    }

    if let Some(last) = iterations.last() {
        info!(
            spectrum = nr,
            iterations = last.nr,
            rms_im = last.rms.im,
            m_tot_n = last.stats.m_tot_n,
            "spectrum done"
        );
    }

    Ok(SpectrumFit {
        nr,
        index,
        prefix: inversion.global_prefix,
        model,
        frequencies,
        data: measured,
        tau,
        iterations,
        norm_factor: inversion.norm_factor,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::sample::{SynthOptions, synth_spectra};
    use crate::domain::{InversionConfig, PrepConfig, Spectrum};
    use crate::fit::jobs::build_jobs;

    fn job(norm_factor: Option<f64>) -> FitJob {
        let synth = synth_spectra(&SynthOptions {
            count: 1,
            noise: 0.0,
            ..SynthOptions::default()
        })
        .unwrap();
        let spectrum = Spectrum {
            index: 0,
            frequencies: synth.frequencies.clone(),
            data: synth.spectra[0].clone(),
            norm_factor,
        };
        let inversion = InversionConfig {
            nr_terms_decade: 8,
            ..InversionConfig::default()
        };
        build_jobs(vec![spectrum], &inversion, Arc::new(PrepConfig::default())).remove(0)
    }

    #[test]
    fn final_iteration_carries_statistics() {
        let fit = fit_one_spectrum(job(None)).unwrap();
        let last = fit.final_iteration().unwrap();
        assert_eq!(last.pars.len(), fit.tau.len() + 1);
        assert!(last.stats.m_tot.is_finite());
        assert_eq!(fit.model_response().len(), fit.frequencies.len());
        assert_eq!(fit.prefix, "spec_000_");
    }

    #[test]
    fn normalization_is_undone_in_reported_parameters() {
        let plain = fit_one_spectrum(job(None)).unwrap();
        let normed = fit_one_spectrum(job(Some(0.01))).unwrap();

        let a = plain.final_iteration().unwrap();
        let b = normed.final_iteration().unwrap();
        assert!((a.pars[0] - b.pars[0]).abs() / a.pars[0] < 1e-4);
        assert!((a.stats.m_tot - b.stats.m_tot).abs() < 1e-4);
        assert!((a.stats.m_tot_n - b.stats.m_tot_n).abs() < 1e-4);
    }

    #[test]
    fn fits_the_frequencies_of_its_own_settings() {
        let mut job = job(None);
        job.inversion.frequencies.truncate(20);
        job.data.truncate(20);
        let fit = fit_one_spectrum(job).unwrap();
        assert_eq!(fit.frequencies.len(), 20);
        assert_eq!(fit.data.len(), 20);
    }
}
