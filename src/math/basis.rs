//! Elementary relaxation responses.
//!
//! Both decompositions are linear combinations of one response per relaxation
//! time `tau_k`:
//!
//! - Cole-Cole (resistivity): `K(w, tau, c) = 1 - 1 / (1 + (i w tau)^c)`
//! - Debye (conductivity):    `D(w, tau) = (i w tau) / (1 + i w tau)`
//!
//! Numerical notes:
//! - `(i w tau)^c` is built in polar form: magnitude `(w tau)^c`, angle `c pi / 2`.
//! - `1 - 1 / (1 + x)` is evaluated as `x / (1 + x)`, and as `1 / (1 + 1/x)`
//!   for large `|x|`, which avoids cancellation at both ends of the band.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Complex;

/// Above this magnitude we switch to the `1 / (1 + 1/x)` form.
const LARGE_X: f64 = 1e8;

/// Angular frequency for a frequency in Hz.
pub fn omega(frequency: f64) -> f64 {
    2.0 * PI * frequency
}

/// Frequency (Hz) associated with a relaxation time: `1 / (2 pi tau)`.
pub fn tau_to_frequency(tau: f64) -> f64 {
    1.0 / (2.0 * PI * tau)
}

/// Cole-Cole response `1 - 1 / (1 + (i w tau)^c)`.
pub fn cole_cole_term(omega: f64, tau: f64, c: f64) -> Complex<f64> {
    let x = Complex::from_polar((omega * tau).powf(c), c * FRAC_PI_2);
    relaxation_ratio(x)
}

/// Debye conductivity response `(i w tau) / (1 + i w tau)`.
pub fn debye_conductivity_term(omega: f64, tau: f64) -> Complex<f64> {
    relaxation_ratio(Complex::new(0.0, omega * tau))
}

fn relaxation_ratio(x: Complex<f64>) -> Complex<f64> {
    let one = Complex::new(1.0, 0.0);
    if x.norm() > LARGE_X {
        one / (one + x.inv())
    } else {
        x / (one + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cole_cole_limits() {
        let tau = 0.01;
        let low = cole_cole_term(1e-9, tau, 1.0);
        let high = cole_cole_term(1e12, tau, 1.0);
        assert!(low.norm() < 1e-9, "term should vanish at low frequency, got {low}");
        assert!((high - Complex::new(1.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn debye_term_matches_cole_cole_with_unit_exponent() {
        for &f in &[0.01, 1.0, 100.0, 1e4] {
            let w = omega(f);
            let a = cole_cole_term(w, 1e-3, 1.0);
            let b = debye_conductivity_term(w, 1e-3);
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn imaginary_part_peaks_at_characteristic_frequency() {
        let tau = 1e-2;
        let peak = cole_cole_term(1.0 / tau, tau, 1.0).im;
        assert!((peak - 0.5).abs() < 1e-12);
        assert!(cole_cole_term(0.5 / tau, tau, 1.0).im < peak);
        assert!(cole_cole_term(2.0 / tau, tau, 1.0).im < peak);
    }
}
