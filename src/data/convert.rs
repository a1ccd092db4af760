//! Conversion of input columns to complex resistivity / conductivity.
//!
//! The inversion always works on complex numbers in the domain of the chosen
//! formulation: resistivity for `ModelFormulation::Resistivity`, conductivity
//! for `ModelFormulation::Conductivity`.

use nalgebra::Complex;

use crate::domain::{DataFormat, ModelFormulation};

/// Convert one sample (two columns) to complex resistivity.
pub fn to_resistivity(format: DataFormat, sample: [f64; 2]) -> Complex<f64> {
    let [a, b] = sample;
    match format {
        DataFormat::RmagRpha => Complex::from_polar(a, b / 1000.0),
        DataFormat::Log10RmagRpha => Complex::from_polar(10f64.powf(a), b / 1000.0),
        DataFormat::LnRmagRpha => Complex::from_polar(a.exp(), b / 1000.0),
        DataFormat::RreRim => Complex::new(a, b),
        DataFormat::RreRmim => Complex::new(a, -b),
        DataFormat::CmagCpha | DataFormat::CreCim | DataFormat::CreCmim => {
            to_conductivity(format, sample).inv()
        }
    }
}

/// Convert one sample (two columns) to complex conductivity.
pub fn to_conductivity(format: DataFormat, sample: [f64; 2]) -> Complex<f64> {
    let [a, b] = sample;
    match format {
        DataFormat::CmagCpha => Complex::from_polar(a, b / 1000.0),
        DataFormat::CreCim => Complex::new(a, b),
        DataFormat::CreCmim => Complex::new(a, -b),
        _ => to_resistivity(format, sample).inv(),
    }
}

/// Convert one sample to the domain fitted by `model`.
pub fn to_model_domain(format: DataFormat, model: ModelFormulation, sample: [f64; 2]) -> Complex<f64> {
    match model {
        ModelFormulation::Resistivity { .. } => to_resistivity(format, sample),
        ModelFormulation::Conductivity => to_conductivity(format, sample),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_phase_matches_real_imag() {
        let z = to_resistivity(DataFormat::RmagRpha, [100.0, -10.0]);
        assert!((z.norm() - 100.0).abs() < 1e-10);
        assert!((z.arg() + 0.01).abs() < 1e-12);

        let z2 = to_resistivity(DataFormat::RreRmim, [z.re, -z.im]);
        assert!((z - z2).norm() < 1e-12);

        let z3 = to_resistivity(DataFormat::Log10RmagRpha, [2.0, -10.0]);
        assert!((z - z3).norm() < 1e-9);
    }

    #[test]
    fn conductivity_is_the_inverse_of_resistivity() {
        let rho = to_resistivity(DataFormat::RreRim, [80.0, -4.0]);
        let sigma = to_conductivity(DataFormat::RreRim, [80.0, -4.0]);
        assert!((rho * sigma - Complex::new(1.0, 0.0)).norm() < 1e-12);

        let back = to_resistivity(DataFormat::CreCim, [sigma.re, sigma.im]);
        assert!((back - rho).norm() < 1e-9);
    }
}
