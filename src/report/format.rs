//! Formatted terminal output.
//!
//! Formatting lives here so the fitting code never prints, and output changes
//! stay local to one file.

use crate::domain::DdConfig;
use crate::fit::SpectrumFit;
use crate::io::FitBatch;

/// Run header plus one table row per spectrum.
pub fn format_run_summary(batch: &FitBatch, config: &DdConfig) -> String {
    let mut out = String::new();

    out.push_str("=== dd - relaxation time decomposition ===\n");
    out.push_str(&format!(
        "Model: {} | data format: {} | terms/decade: {} | max it: {}\n",
        config.inversion.model.display_name(),
        config.prep.data_format.name(),
        config.inversion.nr_terms_decade,
        config.inversion.max_iterations,
    ));
    out.push_str(&format!(
        "Spectra: {} fitted, {} failed | workers: {}\n\n",
        batch.fits.len(),
        batch.failures.len(),
        config.workers,
    ));

    out.push_str(&format_table(&batch.fits));

    if !batch.failures.is_empty() {
        out.push_str("\nFailed spectra:\n");
        for failure in &batch.failures {
            out.push_str(&format!("- {} {}\n", failure.label.prefix, failure.error));
        }
    }
    out
}

fn format_table(fits: &[SpectrumFit]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>4} {:>4} {:>9} {:>9} {:>9} {:>9} {:>10}\n",
            "spectrum", "nf", "it", "rho0", "m_tot_n", "tau_50", "tau_pk1", "rms_im"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<10} {:-<4} {:-<4} {:-<9} {:-<9} {:-<9} {:-<9} {:-<10}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for fit in fits {
        let Some(last) = fit.final_iteration() else {
            continue;
        };
        let s = &last.stats;
        out.push_str(
            format!(
                "{:<10} {:>4} {:>4} {:>9} {:>9} {:>9} {:>9} {:>10}\n",
                truncate(&fit.prefix, 10),
                fit.frequencies.len(),
                last.nr,
                fmt_stat(s.rho0),
                fmt_stat(s.m_tot_n),
                fmt_stat(s.tau_50),
                fmt_stat(s.tau_peak1),
                format!("{:.3e}", last.rms.im),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.3}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("spec_000_", 10), "spec_000_");
        assert_eq!(truncate("spec_000_long", 6), "spec_.");
    }

    #[test]
    fn undefined_statistics_render_as_dash() {
        assert_eq!(fmt_stat(f64::NAN), "-");
        assert_eq!(fmt_stat(-2.0), "-2.000");
    }
}
