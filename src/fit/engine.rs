//! Linear decomposition engine.
//!
//! Fits the linear coefficients `p` (rho0 / sigma0 followed by one amplitude
//! per tau) to one complex spectrum:
//!
//! ```text
//! minimize || W (G p - d) ||^2 + lambda || R p ||^2,   p[1..] >= 0
//! ```
//!
//! where `G` stacks the real and imaginary parts of the model kernels, `W`
//! scales every sample by `1 / |d_j|` and `R` is a first-order smoothing
//! operator on the chargeabilities.
//!
//! Non-negativity is enforced with a simple active set: after each solve,
//! negative chargeabilities are clamped to zero and held fixed for the
//! following iterations. Recorded iterations carry the reported `pars`
//! (see `models::to_reported_pars`).

use nalgebra::{Complex, DMatrix, DVector};
use serde::Serialize;
use tracing::debug;

use crate::domain::{LambdaPolicy, ModelFormulation};
use crate::error::AppError;
use crate::fit::regularization::{
    first_order_smoothing, initial_lambda, lambda_candidates, pick_lambda, restrict_columns,
};
use crate::fit::tau_grid::TauGrid;
use crate::math::solve_regularized;
use crate::models::{fill_design_row, to_reported_pars};
use crate::stats::{RtdStats, StatsCallback};

/// Change of the designated RMS below which the iteration stops.
const RMS_TOLERANCE: f64 = 1e-6;

/// Component of the combined real/imaginary misfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RmsComponent {
    Real,
    Imaginary,
}

/// The `rms_re_im` metric: RMS of the normalized real and imaginary residuals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RmsValues {
    pub re: f64,
    pub im: f64,
}

impl RmsValues {
    pub fn get(&self, component: RmsComponent) -> f64 {
        match component {
            RmsComponent::Real => self.re,
            RmsComponent::Imaginary => self.im,
        }
    }
}

/// One step of the inversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    /// 0 is the starting model.
    pub nr: usize,
    /// Reported parameters: offset, then one chargeability per tau.
    pub pars: Vec<f64>,
    /// Regularization strength used; `None` for the starting model.
    pub lambda: Option<f64>,
    pub rms: RmsValues,
    pub stats: RtdStats,
}

/// Everything the engine needs for one spectrum.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 1-based spectrum number, used in error messages.
    pub spectrum: usize,
    pub frequencies: Vec<f64>,
    /// Complex data in the domain of the model formulation.
    pub data: Vec<Complex<f64>>,
    pub tau: TauGrid,
    pub lambda: LambdaPolicy,
    pub max_iterations: usize,
    /// RMS component used for stopping and for the lambda search.
    pub rms_component: RmsComponent,
}

/// Common contract of inversion engines.
pub trait InversionEngine {
    /// Run to completion and return all iterations, starting model first.
    fn run_inversion(&mut self) -> Result<&[Iteration], AppError>;
}

pub struct DecompositionEngine {
    model: ModelFormulation,
    options: EngineOptions,
    stats: StatsCallback,
    /// Weighted design matrix, real rows then imaginary rows.
    x: DMatrix<f64>,
    y: DVector<f64>,
    r: DMatrix<f64>,
    iterations: Vec<Iteration>,
}

impl DecompositionEngine {
    /// Build the weighted linear system for one spectrum.
    pub fn configure(
        model: ModelFormulation,
        options: EngineOptions,
        stats_callback: StatsCallback,
    ) -> Result<Self, AppError> {
        let spectrum = options.spectrum;
        let n = options.frequencies.len();
        if n == 0 {
            return Err(AppError::engine(spectrum, "no samples to fit"));
        }
        if options.data.len() != n {
            return Err(AppError::engine(
                spectrum,
                format!("{} data samples for {} frequencies", options.data.len(), n),
            ));
        }
        if options.tau.is_empty() {
            return Err(AppError::engine(spectrum, "tau grid is empty"));
        }
        if options.max_iterations == 0 {
            return Err(AppError::engine(spectrum, "iteration cap must be >= 1"));
        }

        let p = options.tau.len() + 1;
        let mut x = DMatrix::<f64>::zeros(2 * n, p);
        let mut y = DVector::<f64>::zeros(2 * n);
        let mut row = vec![Complex::new(0.0, 0.0); p];

        for (j, (&f, &d)) in options.frequencies.iter().zip(&options.data).enumerate() {
            let mag = d.norm();
            if !(mag.is_finite() && mag > 0.0) {
                return Err(AppError::engine(
                    spectrum,
                    format!("sample {j} has magnitude {mag}"),
                ));
            }
            let w = 1.0 / mag;
            fill_design_row(model, f, &options.tau.tau, &mut row);
            for (k, g) in row.iter().enumerate() {
                x[(j, k)] = g.re * w;
                x[(n + j, k)] = g.im * w;
            }
            y[j] = d.re * w;
            y[n + j] = d.im * w;
        }

        let r = first_order_smoothing(options.tau.len());

        Ok(Self {
            model,
            options,
            stats: stats_callback,
            x,
            y,
            r,
            iterations: Vec::new(),
        })
    }

    fn rms(&self, pars: &DVector<f64>) -> RmsValues {
        let n = self.options.frequencies.len();
        let residual = &self.x * pars - &self.y;
        RmsValues {
            re: (residual.rows(0, n).norm_squared() / n as f64).sqrt(),
            im: (residual.rows(n, n).norm_squared() / n as f64).sqrt(),
        }
    }

    fn record(&mut self, nr: usize, linear: &DVector<f64>, lambda: Option<f64>) {
        let rms = self.rms(linear);
        let pars = to_reported_pars(self.model, linear.as_slice());
        let stats = (self.stats)(&pars, &self.options.tau.tau, &self.options.tau.s);
        debug!(
            spectrum = self.options.spectrum,
            iteration = nr,
            lambda = lambda.unwrap_or(f64::NAN),
            rms_re = rms.re,
            rms_im = rms.im,
            "inversion step"
        );
        self.iterations.push(Iteration {
            nr,
            pars,
            lambda,
            rms,
            stats,
        });
    }

    fn check_offset(&self, pars: &DVector<f64>) -> Result<(), AppError> {
        let p0 = pars[0];
        if !(p0.is_finite() && p0 > 0.0) {
            return Err(AppError::engine(
                self.options.spectrum,
                format!("non-physical {} offset {p0}", self.model.display_name()),
            ));
        }
        if pars.iter().any(|v| !v.is_finite()) {
            return Err(AppError::engine(self.options.spectrum, "non-finite parameters"));
        }
        Ok(())
    }

    /// Solve on the free columns and scatter back into a full parameter vector.
    fn solve(
        &self,
        x_free: &DMatrix<f64>,
        r_free: &DMatrix<f64>,
        free: &[usize],
        lambda: f64,
    ) -> Option<DVector<f64>> {
        let sol = solve_regularized(x_free, &self.y, r_free, lambda)?;
        let mut full = DVector::<f64>::zeros(self.x.ncols());
        for (&j, &v) in free.iter().zip(sol.iter()) {
            full[j] = v;
        }
        Some(full)
    }
}

fn clamp_chargeabilities(pars: &DVector<f64>) -> DVector<f64> {
    let mut out = pars.clone();
    for v in out.iter_mut().skip(1) {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
    out
}

impl InversionEngine for DecompositionEngine {
    fn run_inversion(&mut self) -> Result<&[Iteration], AppError> {
        self.iterations.clear();
        let spectrum = self.options.spectrum;
        let component = self.options.rms_component;
        let n = self.options.frequencies.len();
        let p = self.x.ncols();

        let mut start = DVector::<f64>::zeros(p);
        start[0] = self.options.data.iter().map(|d| d.re).sum::<f64>() / n as f64;
        self.check_offset(&start)?;
        self.record(0, &start, None);

        let lam0 = initial_lambda(&self.x);
        let mut fixed = vec![false; p];
        let mut prev_rms = self.iterations[0].rms.get(component);

        for nr in 1..=self.options.max_iterations {
            let free: Vec<usize> = (0..p).filter(|&j| !fixed[j]).collect();
            let x_free = restrict_columns(&self.x, &free);
            let r_free = restrict_columns(&self.r, &free);

            let solved = match self.options.lambda {
                LambdaPolicy::Fixed(lam) => self
                    .solve(&x_free, &r_free, &free, lam)
                    .map(|sol| (lam, sol)),
                LambdaPolicy::Search => pick_lambda(&lambda_candidates(lam0), |lam| {
                    let sol = self.solve(&x_free, &r_free, &free, lam)?;
                    let score = self.rms(&clamp_chargeabilities(&sol)).get(component);
                    Some((score, sol))
                }),
            };
            let Some((lambda, mut pars)) = solved else {
                return Err(AppError::engine(spectrum, "linear system could not be solved"));
            };

            let mut newly_fixed = 0usize;
            for j in 1..p {
                if !fixed[j] && pars[j] < 0.0 {
                    fixed[j] = true;
                    newly_fixed += 1;
                }
                if fixed[j] {
                    pars[j] = 0.0;
                }
            }
            self.check_offset(&pars)?;
            self.record(nr, &pars, Some(lambda));

            let rms = self.iterations[nr].rms.get(component);
            if newly_fixed == 0 || (prev_rms - rms).abs() < RMS_TOLERANCE {
                break;
            }
            prev_rms = rms;
        }

        Ok(&self.iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TauSelection;
    use crate::fit::tau_grid::tau_grid;
    use crate::models::predict;
    use crate::stats::stats_callback;

    fn log_frequencies(lo: f64, hi: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / (n - 1) as f64))
            .collect()
    }

    fn single_relaxation(model: ModelFormulation, freqs: &[f64]) -> Vec<Complex<f64>> {
        let pars = [100.0, 0.1];
        freqs.iter().map(|&f| predict(model, f, &pars, &[1e-2])).collect()
    }

    fn options(freqs: Vec<f64>, data: Vec<Complex<f64>>, lambda: LambdaPolicy) -> EngineOptions {
        let tau = tau_grid(&freqs, TauSelection::default(), 10).unwrap();
        EngineOptions {
            spectrum: 1,
            frequencies: freqs,
            data,
            tau,
            lambda,
            max_iterations: 20,
            rms_component: RmsComponent::Imaginary,
        }
    }

    #[test]
    fn recovers_a_single_relaxation() {
        let model = ModelFormulation::Resistivity { c: 1.0 };
        let freqs = log_frequencies(-2.0, 4.0, 25);
        let data = single_relaxation(model, &freqs);
        let mut engine = DecompositionEngine::configure(
            model,
            options(freqs, data, LambdaPolicy::Search),
            stats_callback(vec![]),
        )
        .unwrap();

        let its = engine.run_inversion().unwrap();
        assert!(its.len() >= 2);
        assert_eq!(its[0].nr, 0);
        assert!(its[0].lambda.is_none());

        let last = its.last().unwrap();
        assert!(last.pars[1..].iter().all(|&m| m >= 0.0));
        assert!((last.pars[0] - 100.0).abs() < 5.0, "rho0 = {}", last.pars[0]);
        assert!(last.rms.im < its[0].rms.im);
        assert!((last.stats.tau_50 + 2.0).abs() < 0.5, "tau_50 = {}", last.stats.tau_50);
        // pars[1..] are dimensionless chargeabilities summing to m = 0.1.
        assert!((last.stats.m_tot + 1.0).abs() < 0.05, "m_tot = {}", last.stats.m_tot);
        assert!((last.stats.m_tot_n + 3.0).abs() < 0.05, "m_tot_n = {}", last.stats.m_tot_n);
    }

    #[test]
    fn every_iteration_matches_the_tau_grid() {
        let model = ModelFormulation::Conductivity;
        let freqs = log_frequencies(-1.0, 3.0, 15);
        let data = single_relaxation(model, &freqs);
        let opts = options(freqs, data, LambdaPolicy::Fixed(1.0));
        let n_tau = opts.tau.len();
        let mut engine =
            DecompositionEngine::configure(model, opts, stats_callback(vec![0.2])).unwrap();

        let its = engine.run_inversion().unwrap();
        for (i, it) in its.iter().enumerate() {
            assert_eq!(it.nr, i);
            assert_eq!(it.pars.len(), n_tau + 1);
            assert_eq!(it.stats.tau_x.len(), 1);
        }
        assert!(its.iter().skip(1).all(|it| it.lambda == Some(1.0)));
    }

    #[test]
    fn negative_offset_is_an_engine_error() {
        let model = ModelFormulation::Resistivity { c: 1.0 };
        let freqs = log_frequencies(0.0, 2.0, 5);
        let data = vec![Complex::new(-50.0, -1.0); 5];
        let mut engine = DecompositionEngine::configure(
            model,
            options(freqs, data, LambdaPolicy::Search),
            stats_callback(vec![]),
        )
        .unwrap();
        let err = engine.run_inversion().unwrap_err();
        assert!(matches!(err, AppError::Engine { spectrum: 1, .. }));
    }

    #[test]
    fn zero_sample_is_rejected_at_configure() {
        let model = ModelFormulation::Resistivity { c: 1.0 };
        let freqs = log_frequencies(0.0, 2.0, 3);
        let data = vec![Complex::new(10.0, 0.0), Complex::new(0.0, 0.0), Complex::new(10.0, 0.0)];
        let res = DecompositionEngine::configure(
            model,
            options(freqs, data, LambdaPolicy::Search),
            stats_callback(vec![]),
        );
        assert!(res.is_err());
    }
}
