//! Plain ascii result directory.
//!
//! One file per quantity, one row per fitted spectrum, rows in batch order:
//!
//! - `frequencies.dat`, `tau.dat`: cropped frequencies and tau grid
//! - `fit_parameters.dat`: final `pars`
//! - `integrated_parameters.dat`: header of statistic names, then values
//! - `decade_loadings.dat` and the matching bin edges in `decade_bins.dat`
//! - `rms.dat` (re, im)
//! - `f_fit.dat`: model response, real parts then imaginary parts
//! - `spectrum_prefixes.dat`
//! - `failures.dat`: only written when some spectra failed

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::io::FitBatch;

/// Number formatting shared by the ascii writers.
pub fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        format!("{v:.8e}")
    }
}

pub fn fmt_row(values: &[f64]) -> String {
    values.iter().map(|&v| fmt_value(v)).collect::<Vec<_>>().join(" ")
}

pub(crate) fn write_lines<I>(path: &Path, lines: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = String>,
{
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut w = BufWriter::new(file);
    for line in lines {
        writeln!(w, "{line}")
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }
    w.flush()
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))
}

pub fn write_ascii(out_dir: &Path, batch: &FitBatch) -> Result<(), AppError> {
    let fits = &batch.fits;

    write_lines(
        &out_dir.join("frequencies.dat"),
        fits.iter().map(|fit| fmt_row(&fit.frequencies)),
    )?;
    write_lines(
        &out_dir.join("tau.dat"),
        fits.iter().map(|fit| fmt_row(&fit.tau.tau)),
    )?;

    let finals: Vec<_> = fits.iter().filter_map(|fit| fit.final_iteration()).collect();
    write_lines(
        &out_dir.join("fit_parameters.dat"),
        finals.iter().map(|it| fmt_row(&it.pars)),
    )?;

    let header = finals
        .first()
        .map(|it| {
            let names: Vec<String> = it.stats.scalars().into_iter().map(|(n, _)| n).collect();
            format!("# {}", names.join(" "))
        })
        .into_iter();
    let rows = finals.iter().map(|it| {
        let values: Vec<f64> = it.stats.scalars().into_iter().map(|(_, v)| v).collect();
        fmt_row(&values)
    });
    write_lines(&out_dir.join("integrated_parameters.dat"), header.chain(rows))?;

    write_lines(
        &out_dir.join("decade_loadings.dat"),
        finals.iter().map(|it| fmt_row(&it.stats.decade_loadings)),
    )?;
    write_lines(
        &out_dir.join("decade_bins.dat"),
        finals.iter().map(|it| fmt_row(&it.stats.decade_bins)),
    )?;
    write_lines(
        &out_dir.join("rms.dat"),
        finals.iter().map(|it| fmt_row(&[it.rms.re, it.rms.im])),
    )?;
    write_lines(
        &out_dir.join("f_fit.dat"),
        fits.iter().map(|fit| {
            let response = fit.model_response();
            let values: Vec<f64> = response
                .iter()
                .map(|z| z.re)
                .chain(response.iter().map(|z| z.im))
                .collect();
            fmt_row(&values)
        }),
    )?;
    write_lines(
        &out_dir.join("spectrum_prefixes.dat"),
        fits.iter().map(|fit| fit.prefix.clone()),
    )?;

    if !batch.failures.is_empty() {
        write_lines(
            &out_dir.join("failures.dat"),
            batch
                .failures
                .iter()
                .map(|f| format!("{} {}", f.label.prefix, f.error)),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_written_lowercase() {
        assert_eq!(fmt_value(f64::NAN), "nan");
        assert_eq!(fmt_row(&[1.5, f64::NAN]), "1.50000000e0 nan");
    }
}
