//! Relaxation-time grid generation.
//!
//! The decomposition is linear once the relaxation times are fixed, so each
//! spectrum gets a deterministic, log-spaced tau grid derived from its own
//! (possibly cropped) frequency range.

use crate::domain::TauSelection;
use crate::error::AppError;
use crate::math::tau_to_frequency;

/// Relaxation times and their log10 values, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct TauGrid {
    pub tau: Vec<f64>,
    pub s: Vec<f64>,
}

impl TauGrid {
    pub fn from_tau(tau: Vec<f64>) -> Self {
        let s = tau.iter().map(|t| t.log10()).collect();
        Self { tau, s }
    }

    pub fn len(&self) -> usize {
        self.tau.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tau.is_empty()
    }
}

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::config(format!(
            "Invalid tau range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::config("Tau steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}

/// Build the tau grid for a set of data frequencies.
///
/// A single-frequency spectrum spans no decade; the range is then widened to
/// one decade around that frequency before the extension factors apply.
pub fn tau_grid(
    frequencies: &[f64],
    tausel: TauSelection,
    nr_terms_decade: usize,
) -> Result<TauGrid, AppError> {
    let f_min = frequencies.iter().copied().fold(f64::INFINITY, f64::min);
    let f_max = frequencies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(f_min.is_finite() && f_max.is_finite() && f_min > 0.0) {
        return Err(AppError::data("Cannot build a tau grid without positive frequencies."));
    }

    let (mut f_lo, mut f_hi) = (f_min, f_max);
    if f_hi / f_lo < 10f64.sqrt() {
        let mid = (f_lo * f_hi).sqrt();
        f_lo = mid / 10f64.sqrt();
        f_hi = mid * 10f64.sqrt();
    }

    let (left, right) = match tausel {
        TauSelection::Data => (1.0, 1.0),
        TauSelection::DataExt { left, right } => (left, right),
    };

    // tau_to_frequency is its own inverse.
    let tau_max = tau_to_frequency(f_lo) * left;
    let tau_min = tau_to_frequency(f_hi) / right;

    let decades = (tau_max / tau_min).log10();
    // Guard against ceil() of values like 30.000000000000004.
    let steps = ((decades * nr_terms_decade as f64 - 1e-9).ceil() as usize).max(2);

    Ok(TauGrid::from_tau(log_space(tau_min, tau_max, steps)?))
}
