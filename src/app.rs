//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - turns arguments into one validated `DdConfig`
//! - runs the fit pipeline or the synthetic generator
//! - prints the terminal summary

use std::sync::Once;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::data::sample::SynthOptions;
use crate::domain::{
    DdConfig, InversionConfig, LambdaPolicy, ModelFormulation, PrepConfig, parse_index_list,
    parse_tau_x_list,
};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `dd` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.silent);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// Install the global subscriber once. `RUST_LOG` overrides the default
/// level unless `--silent` is given.
pub fn init_tracing(silent: bool) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = if silent {
            EnvFilter::new("warn")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let batch = pipeline::run_fit(&config)?;
    println!("{}", crate::report::format_run_summary(&batch, &config));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let opts = synth_options_from_args(&args);
    pipeline::run_synth(&args.output, &opts)?;
    println!(
        "Wrote {} synthetic spectra to {}",
        opts.count,
        args.output.display()
    );
    Ok(())
}

/// Map CLI arguments to a validated run configuration.
///
/// Every flag is checked here, so a bad value fails before any input file is
/// read or any output is created.
pub fn fit_config_from_args(args: &FitArgs) -> Result<DdConfig, AppError> {
    let prep = PrepConfig {
        data_format: args.data_format,
        lambda: match args.lambda {
            Some(lam) => LambdaPolicy::Fixed(lam),
            None => LambdaPolicy::Search,
        },
        ignore_frequencies: match &args.ignore {
            Some(list) => parse_index_list(list)?,
            None => Vec::new(),
        },
        norm: args.norm,
        tau_x: match &args.tau_x {
            Some(list) => parse_tau_x_list(list)?,
            None => Vec::new(),
        },
    };
    let inversion = InversionConfig {
        tausel: args.tausel.parse()?,
        nr_terms_decade: args.nr_terms,
        max_iterations: args.max_iterations,
        model: ModelFormulation::from_kind(args.model, args.cc_exponent),
        ..InversionConfig::default()
    };
    let config = DdConfig {
        frequency_file: args.frequency_file.clone(),
        data_file: args.data_file.clone(),
        output_dir: args.output.clone(),
        prep,
        inversion,
        workers: args.workers,
        output_format: args.output_format.parse()?,
        failure_policy: args.failure_policy,
    };
    config.validate()?;
    Ok(config)
}

pub fn synth_options_from_args(args: &SynthArgs) -> SynthOptions {
    SynthOptions {
        count: args.count,
        seed: args.seed,
        f_min: args.f_min,
        f_max: args.f_max,
        nr_frequencies: args.nr_frequencies,
        rho0: args.rho0,
        m: args.chargeability,
        tau: args.tau,
        c: args.cc_exponent,
        tau_spread: args.tau_spread,
        noise: args.noise,
        nan_fraction: args.nan_fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{FailurePolicy, OutputFormat, TauSelection};

    fn fit_args(extra: &[&str]) -> FitArgs {
        let mut argv = vec!["dd", "fit"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Fit(args) => args,
            Command::Synth(_) => unreachable!(),
        }
    }

    #[test]
    fn defaults_map_to_a_valid_config() {
        let cfg = fit_config_from_args(&fit_args(&[])).unwrap();
        assert_eq!(cfg.output_format, OutputFormat::AsciiAudit);
        assert_eq!(cfg.inversion.model, ModelFormulation::Resistivity { c: 1.0 });
        assert_eq!(cfg.inversion.tausel, TauSelection::default());
        assert_eq!(cfg.prep.lambda, LambdaPolicy::Search);
        assert_eq!(cfg.failure_policy, FailurePolicy::AbortBatch);
        assert_eq!(cfg.workers, 1);
    }

    #[test]
    fn flags_reach_the_config() {
        let cfg = fit_config_from_args(&fit_args(&[
            "--model",
            "conductivity",
            "--lambda",
            "5",
            "--tau-x",
            "0.2;0.6",
            "--ignore",
            "0,3",
            "-c",
            "4",
            "--output-format",
            "ascii",
            "--failure-policy",
            "isolate",
        ]))
        .unwrap();
        assert_eq!(cfg.inversion.model, ModelFormulation::Conductivity);
        assert_eq!(cfg.prep.lambda, LambdaPolicy::Fixed(5.0));
        assert_eq!(cfg.prep.tau_x, vec![0.2, 0.6]);
        assert_eq!(cfg.prep.ignore_frequencies, vec![0, 3]);
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.output_format, OutputFormat::Ascii);
        assert_eq!(cfg.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn bad_flags_are_config_errors() {
        for extra in [
            &["--output-format", "netcdf"][..],
            &["-c", "0"][..],
            &["--tau-x", "1.2"][..],
            &["--cc-exponent=-1"][..],
        ] {
            let err = fit_config_from_args(&fit_args(extra)).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{extra:?}: {err}");
        }
    }
}
