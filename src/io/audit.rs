//! Single annotated result file (`results.dat`).
//!
//! The commented header records how the file was produced (tool version,
//! UTC timestamp, the full run configuration as JSON, failed spectra). Each
//! spectrum follows as a `[prefix]` block of `name value...` lines.

use std::path::Path;

use chrono::Utc;

use crate::domain::DdConfig;
use crate::error::AppError;
use crate::fit::SpectrumFit;
use crate::io::FitBatch;
use crate::io::export::{fmt_row, fmt_value, write_lines};
use crate::stats::StatValue;

pub const RESULTS_FILE: &str = "results.dat";

fn spectrum_block(fit: &SpectrumFit) -> Vec<String> {
    let mut lines = vec![
        format!("[{}]", fit.prefix),
        format!("nr {}", fit.nr),
        format!("index {}", fit.index),
        format!("model {}", fit.model.display_name()),
    ];
    if let Some(factor) = fit.norm_factor {
        lines.push(format!("norm_factor {}", fmt_value(factor)));
    }
    let Some(last) = fit.final_iteration() else {
        return lines;
    };
    lines.push(format!("iterations {}", last.nr));
    lines.push(format!("lambda {}", fmt_value(last.lambda.unwrap_or(f64::NAN))));
    lines.push(format!("rms_re {}", fmt_value(last.rms.re)));
    lines.push(format!("rms_im {}", fmt_value(last.rms.im)));
    lines.push(format!("frequencies {}", fmt_row(&fit.frequencies)));
    lines.push(format!("tau {}", fmt_row(&fit.tau.tau)));
    lines.push(format!("pars {}", fmt_row(&last.pars)));
    for (name, value) in last.stats.entries() {
        let text = match value {
            StatValue::Scalar(v) => fmt_value(v),
            StatValue::Array(v) => fmt_row(&v),
        };
        lines.push(format!("{name} {text}"));
    }
    lines
}

pub fn write_ascii_audit(out_dir: &Path, batch: &FitBatch, config: &DdConfig) -> Result<(), AppError> {
    let path = out_dir.join(RESULTS_FILE);
    let config_json = serde_json::to_string(config)
        .map_err(|e| AppError::io(format!("Failed to serialize configuration: {e}")))?;

    let mut lines = vec![
        format!("# dd-fit {}", env!("CARGO_PKG_VERSION")),
        format!("# created {}", Utc::now().to_rfc3339()),
        format!("# config {config_json}"),
        format!("# spectra {}", batch.fits.len()),
        format!("# failures {}", batch.failures.len()),
    ];
    for failure in &batch.failures {
        lines.push(format!("# failed {} {}", failure.label.prefix, failure.error));
    }
    for fit in &batch.fits {
        lines.extend(spectrum_block(fit));
    }

    write_lines(&path, lines)
}
