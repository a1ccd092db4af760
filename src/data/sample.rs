//! Synthetic Cole-Cole spectra.
//!
//! Used by `dd synth` to produce input files and by tests as a ground truth
//! with a known relaxation time. Output is always `rmag_rpha` (phase in mrad).

use nalgebra::Complex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::ModelFormulation;
use crate::error::AppError;
use crate::fit::tau_grid::log_space;
use crate::models::predict;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthOptions {
    /// Number of spectra.
    pub count: usize,
    pub seed: u64,
    pub f_min: f64,
    pub f_max: f64,
    pub nr_frequencies: usize,
    pub rho0: f64,
    /// Chargeability `m` of the single Cole-Cole term.
    pub m: f64,
    pub tau: f64,
    pub c: f64,
    /// Per-spectrum uniform jitter of `log10(tau)`, in decades.
    pub tau_spread: f64,
    /// Relative Gaussian noise on the complex resistivity.
    pub noise: f64,
    /// Probability that a sample is replaced by NaN.
    pub nan_fraction: f64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            count: 1,
            seed: 42,
            f_min: 1e-2,
            f_max: 1e3,
            nr_frequencies: 25,
            rho0: 100.0,
            m: 0.1,
            tau: 1e-2,
            c: 1.0,
            tau_spread: 0.0,
            noise: 0.001,
            nan_fraction: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticSet {
    pub frequencies: Vec<f64>,
    /// Per spectrum, `[magnitude, phase_mrad]` per frequency.
    pub spectra: Vec<Vec<[f64; 2]>>,
    /// True relaxation time of each spectrum.
    pub taus: Vec<f64>,
}

impl SyntheticSet {
    /// Rows in data-file layout: all magnitudes, then all phases.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.spectra
            .iter()
            .map(|spectrum| {
                spectrum
                    .iter()
                    .map(|s| s[0])
                    .chain(spectrum.iter().map(|s| s[1]))
                    .collect()
            })
            .collect()
    }
}

pub fn synth_spectra(opts: &SynthOptions) -> Result<SyntheticSet, AppError> {
    if opts.count == 0 {
        return Err(AppError::config("Spectrum count must be > 0."));
    }
    if opts.nr_frequencies < 2 {
        return Err(AppError::config("At least two frequencies are required."));
    }
    if !(opts.rho0.is_finite() && opts.rho0 > 0.0) {
        return Err(AppError::config("rho0 must be finite and > 0."));
    }
    if !(opts.m.is_finite() && (0.0..1.0).contains(&opts.m)) {
        return Err(AppError::config("Chargeability must lie in [0, 1)."));
    }
    if !(opts.tau.is_finite() && opts.tau > 0.0 && opts.c.is_finite() && opts.c > 0.0) {
        return Err(AppError::config("tau and c must be finite and > 0."));
    }
    if !(opts.tau_spread.is_finite() && opts.tau_spread >= 0.0) {
        return Err(AppError::config("tau spread must be finite and >= 0."));
    }
    if !(opts.noise.is_finite() && opts.noise >= 0.0) {
        return Err(AppError::config("Noise level must be finite and >= 0."));
    }
    if !(0.0..1.0).contains(&opts.nan_fraction) {
        return Err(AppError::config("NaN fraction must lie in [0, 1)."));
    }

    let frequencies = log_space(opts.f_min, opts.f_max, opts.nr_frequencies)?;
    let model = ModelFormulation::Resistivity { c: opts.c };
    let pars = [opts.rho0, opts.m];

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

    let mut spectra = Vec::with_capacity(opts.count);
    let mut taus = Vec::with_capacity(opts.count);
    for _ in 0..opts.count {
        let tau = if opts.tau_spread > 0.0 {
            opts.tau * 10f64.powf(rng.gen_range(-opts.tau_spread..=opts.tau_spread))
        } else {
            opts.tau
        };
        taus.push(tau);

        let spectrum = frequencies
            .iter()
            .map(|&f| {
                let z = predict(model, f, &pars, &[tau]);
                let jitter = Complex::new(
                    1.0 + opts.noise * normal.sample(&mut rng),
                    opts.noise * normal.sample(&mut rng),
                );
                let noisy = z * jitter;
                if opts.nan_fraction > 0.0 && rng.gen_bool(opts.nan_fraction) {
                    [f64::NAN, f64::NAN]
                } else {
                    [noisy.norm(), noisy.arg() * 1000.0]
                }
            })
            .collect();
        spectra.push(spectrum);
    }

    Ok(SyntheticSet {
        frequencies,
        spectra,
        taus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_free_spectrum_has_negative_phase_peak_near_tau() {
        let set = synth_spectra(&SynthOptions {
            noise: 0.0,
            nr_frequencies: 41,
            ..SynthOptions::default()
        })
        .unwrap();
        let spectrum = &set.spectra[0];

        assert!(spectrum.iter().all(|s| s[1] < 0.0));
        let (i_min, _) = spectrum
            .iter()
            .enumerate()
            .min_by(|a, b| a.1[1].total_cmp(&b.1[1]))
            .unwrap();
        // For c = 1 the phase minimum sits near 1 / (2 pi tau sqrt(1 - m)).
        let f_peak = set.frequencies[i_min];
        assert!((f_peak.log10() - 16.8f64.log10()).abs() < 0.2, "f_peak = {f_peak}");
        assert!((spectrum[0][0] - 100.0).abs() < 0.1);
    }

    #[test]
    fn same_seed_same_output() {
        let opts = SynthOptions {
            count: 3,
            tau_spread: 1.0,
            nan_fraction: 0.2,
            ..SynthOptions::default()
        };
        let a = synth_spectra(&opts).unwrap();
        let b = synth_spectra(&opts).unwrap();
        assert_eq!(a.taus, b.taus);
        assert_eq!(format!("{:?}", a.spectra), format!("{:?}", b.spectra));
        assert_eq!(a.rows()[0].len(), 2 * opts.nr_frequencies);
    }

    #[test]
    fn rejects_invalid_options() {
        assert!(synth_spectra(&SynthOptions { count: 0, ..SynthOptions::default() }).is_err());
        assert!(synth_spectra(&SynthOptions { m: 1.5, ..SynthOptions::default() }).is_err());
    }
}
