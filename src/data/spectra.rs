//! Spectrum preprocessing.
//!
//! Turns the raw multi-spectrum matrix into independent `Spectrum` records:
//!
//! 1. reshape each row (`2 * Nf` values, column 1 then column 2) into `Nf x 2`
//! 2. drop frequencies listed in the ignore list
//! 3. drop, per spectrum, every frequency where either column is NaN
//! 4. attach the optional normalization factor
//!
//! Spectra are cropped independently, so two spectra of the same batch can end
//! up with different frequency sets.

use tracing::{debug, warn};

use crate::data::convert::to_model_domain;
use crate::domain::{ModelFormulation, PrepConfig, RawDataset, Spectrum};
use crate::error::AppError;

/// Split the raw matrix into prepared spectra.
pub fn prepare_spectra(
    raw: &RawDataset,
    prep: &PrepConfig,
    model: ModelFormulation,
) -> Result<Vec<Spectrum>, AppError> {
    let nf = raw.frequencies.len();
    if nf == 0 {
        return Err(AppError::data("Frequency vector is empty."));
    }
    if let Some(f) = raw.frequencies.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
        return Err(AppError::data(format!(
            "Frequencies must be finite and > 0, found {f}."
        )));
    }
    if raw.rows.is_empty() {
        return Err(AppError::data("Data file contains no spectra."));
    }
    if let Some(&idx) = prep.ignore_frequencies.iter().find(|&&idx| idx >= nf) {
        return Err(AppError::config(format!(
            "Ignored frequency index {idx} is out of range (0..{nf})."
        )));
    }

    let mut spectra = Vec::with_capacity(raw.rows.len());
    for (index, row) in raw.rows.iter().enumerate() {
        let data = reshape_row(row, nf).ok_or_else(|| {
            AppError::data(format!(
                "Spectrum {} has {} values, expected {} (2 x {nf} frequencies).",
                index + 1,
                row.len(),
                2 * nf
            ))
        })?;

        let (frequencies, data) = if prep.ignore_frequencies.is_empty() {
            (raw.frequencies.clone(), data)
        } else {
            drop_indices(&raw.frequencies, &data, &prep.ignore_frequencies)
        };

        let kept = data.len();
        let (frequencies, data) = filter_nan_values(&frequencies, &data);
        if frequencies.is_empty() {
            return Err(AppError::data(format!(
                "Spectrum {} has no valid frequencies left after NaN filtering.",
                index + 1
            )));
        }
        let dropped = kept - frequencies.len();
        if dropped > 0 {
            debug!(spectrum = index + 1, dropped, "removed NaN frequency samples");
        }

        let norm_factor = match prep.norm {
            Some(norm) => Some(norm_factor(norm, prep, model, data[0], index)?),
            None => None,
        };

        spectra.push(Spectrum {
            index,
            frequencies,
            data,
            norm_factor,
        });
    }

    Ok(spectra)
}

/// Reshape a raw row into `nf` two-column samples.
///
/// The first `nf` values form column 1, the next `nf` column 2.
pub fn reshape_row(row: &[f64], nf: usize) -> Option<Vec<[f64; 2]>> {
    if row.len() != 2 * nf {
        return None;
    }
    Some((0..nf).map(|j| [row[j], row[nf + j]]).collect())
}

/// Remove every frequency sample where either column is NaN.
///
/// Returns the cropped frequencies and data; both keep the input order.
pub fn filter_nan_values(frequencies: &[f64], data: &[[f64; 2]]) -> (Vec<f64>, Vec<[f64; 2]>) {
    frequencies
        .iter()
        .zip(data.iter())
        .filter(|(_, d)| !(d[0].is_nan() || d[1].is_nan()))
        .map(|(&f, &d)| (f, d))
        .unzip()
}

fn drop_indices(
    frequencies: &[f64],
    data: &[[f64; 2]],
    ignore: &[usize],
) -> (Vec<f64>, Vec<[f64; 2]>) {
    frequencies
        .iter()
        .zip(data.iter())
        .enumerate()
        .filter(|(j, _)| !ignore.contains(j))
        .map(|(_, (&f, &d))| (f, d))
        .unzip()
}

fn norm_factor(
    norm: f64,
    prep: &PrepConfig,
    model: ModelFormulation,
    first: [f64; 2],
    index: usize,
) -> Result<f64, AppError> {
    let magnitude = to_model_domain(prep.data_format, model, first).norm();
    if !(magnitude.is_finite() && magnitude > 0.0) {
        warn!(spectrum = index + 1, magnitude, "cannot normalize spectrum");
        return Err(AppError::data(format!(
            "Spectrum {} cannot be normalized: first magnitude is {magnitude}.",
            index + 1
        )));
    }
    Ok(norm / magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataFormat;

    fn raw(rows: Vec<Vec<f64>>) -> RawDataset {
        RawDataset {
            frequencies: vec![1.0, 10.0, 100.0],
            rows,
        }
    }

    fn prep() -> PrepConfig {
        PrepConfig {
            data_format: DataFormat::RreRim,
            ..PrepConfig::default()
        }
    }

    #[test]
    fn reshape_takes_columns_one_after_the_other() {
        let data = reshape_row(&[1.0, 2.0, 3.0, -1.0, -2.0, -3.0], 3).unwrap();
        assert_eq!(data, vec![[1.0, -1.0], [2.0, -2.0], [3.0, -3.0]]);
        assert!(reshape_row(&[1.0, 2.0], 3).is_none());
    }

    #[test]
    fn nan_samples_are_cropped_per_spectrum() {
        let raw = raw(vec![
            vec![100.0, f64::NAN, 98.0, -1.0, -2.0, -3.0],
            vec![100.0, 99.0, 98.0, -1.0, -2.0, f64::NAN],
        ]);
        let spectra = prepare_spectra(&raw, &prep(), ModelFormulation::default()).unwrap();

        assert_eq!(spectra.len(), 2);
        assert_eq!(spectra[0].frequencies, vec![1.0, 100.0]);
        assert_eq!(spectra[0].data, vec![[100.0, -1.0], [98.0, -3.0]]);
        assert_eq!(spectra[1].frequencies, vec![1.0, 10.0]);
        assert_eq!(spectra[1].data.len(), spectra[1].frequencies.len());
    }

    #[test]
    fn all_nan_spectrum_is_a_data_error() {
        let raw = raw(vec![vec![f64::NAN; 6]]);
        let err = prepare_spectra(&raw, &prep(), ModelFormulation::default()).unwrap_err();
        assert!(matches!(err, AppError::Data(_)));
    }

    #[test]
    fn ignore_list_is_applied_before_nan_filtering() {
        let raw = raw(vec![vec![100.0, 99.0, f64::NAN, -1.0, -2.0, -3.0]]);
        let prep = PrepConfig {
            ignore_frequencies: vec![0],
            ..prep()
        };
        let spectra = prepare_spectra(&raw, &prep, ModelFormulation::default()).unwrap();
        assert_eq!(spectra[0].frequencies, vec![10.0]);

        let bad = PrepConfig {
            ignore_frequencies: vec![3],
            ..prep
        };
        let err = prepare_spectra(&raw, &bad, ModelFormulation::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn norm_factor_scales_first_magnitude_to_target() {
        let raw = raw(vec![vec![3.0, 3.0, 3.0, 4.0, 4.0, 4.0]]);
        let prep = PrepConfig {
            norm: Some(10.0),
            ..prep()
        };
        let spectra = prepare_spectra(&raw, &prep, ModelFormulation::default()).unwrap();
        assert!((spectra[0].norm_factor.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn row_length_mismatch_is_a_data_error() {
        let raw = raw(vec![vec![1.0, 2.0]]);
        assert!(matches!(
            prepare_spectra(&raw, &prep(), ModelFormulation::default()),
            Err(AppError::Data(_))
        ));
    }
}
