//! Model evaluation for the two decomposition formulations.
//!
//! Reported parameters (`pars`):
//!
//! - resistivity:  `rho(w)   = pars[0] * (1 - sum_k pars[k] * K(w, tau_k, c))`,
//!   `pars[1..]` are dimensionless chargeabilities
//! - conductivity: `sigma(w) = pars[0] + sum_k pars[k] * D(w, tau_k)`
//!
//! The least-squares system is solved for linear coefficients instead
//! (`pars[0]` and the amplitudes `pars[0] * m_k` for resistivity), which keeps
//! both formulations linear. `to_reported_pars` maps the solution back.

use nalgebra::Complex;

use crate::domain::ModelFormulation;
use crate::math::{cole_cole_term, debye_conductivity_term, omega};

/// Fill the complex design row of the linear coefficients for frequency `f` (Hz).
///
/// `out[0]` is the `pars[0]` column, `out[k]` the column for `taus[k - 1]`.
///
/// # Panics
/// Panics if `out.len() != taus.len() + 1`.
pub fn fill_design_row(model: ModelFormulation, f: f64, taus: &[f64], out: &mut [Complex<f64>]) {
    assert_eq!(out.len(), taus.len() + 1, "design row length mismatch");
    let w = omega(f);
    out[0] = Complex::new(1.0, 0.0);
    match model {
        ModelFormulation::Resistivity { c } => {
            for (slot, &tau) in out[1..].iter_mut().zip(taus) {
                *slot = -cole_cole_term(w, tau, c);
            }
        }
        ModelFormulation::Conductivity => {
            for (slot, &tau) in out[1..].iter_mut().zip(taus) {
                *slot = debye_conductivity_term(w, tau);
            }
        }
    }
}

/// Convert solved linear coefficients into reported `pars`.
///
/// Resistivity amplitudes are divided by `pars[0]`; a non-positive offset
/// yields NaN chargeabilities.
pub fn to_reported_pars(model: ModelFormulation, linear: &[f64]) -> Vec<f64> {
    match model {
        ModelFormulation::Resistivity { .. } => {
            let Some((&rho0, amplitudes)) = linear.split_first() else {
                return Vec::new();
            };
            let valid = rho0.is_finite() && rho0 > 0.0;
            std::iter::once(rho0)
                .chain(
                    amplitudes
                        .iter()
                        .map(|&a| if valid { a / rho0 } else { f64::NAN }),
                )
                .collect()
        }
        ModelFormulation::Conductivity => linear.to_vec(),
    }
}

/// Undo a data normalization by `factor` on reported `pars`.
///
/// Only entries carrying the unit of the data scale: `rho0` for resistivity,
/// every coefficient for conductivity.
pub fn undo_normalization(model: ModelFormulation, pars: &mut [f64], factor: f64) {
    match model {
        ModelFormulation::Resistivity { .. } => {
            if let Some(rho0) = pars.first_mut() {
                *rho0 /= factor;
            }
        }
        ModelFormulation::Conductivity => {
            for p in pars.iter_mut() {
                *p /= factor;
            }
        }
    }
}

/// Predict the complex response at frequency `f` (Hz) from reported `pars`.
pub fn predict(model: ModelFormulation, f: f64, pars: &[f64], taus: &[f64]) -> Complex<f64> {
    let mut row = vec![Complex::new(0.0, 0.0); taus.len() + 1];
    fill_design_row(model, f, taus, &mut row);
    let scale = match model {
        ModelFormulation::Resistivity { .. } => pars.first().copied().unwrap_or(0.0),
        ModelFormulation::Conductivity => 1.0,
    };
    row.iter()
        .zip(pars)
        .enumerate()
        .fold(Complex::new(0.0, 0.0), |acc, (k, (r, &p))| {
            let coefficient = if k == 0 { p } else { p * scale };
            acc + *r * coefficient
        })
}
