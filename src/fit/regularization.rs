//! Smoothing regularization and lambda selection.
//!
//! The penalty acts on the chargeabilities only: `pars[0]` (rho0 / sigma0)
//! has an all-zero column in `R`.

use nalgebra::{DMatrix, DVector};

/// First-order difference operator over `pars[1..]`.
///
/// Returns a `(n_tau - 1) x (n_tau + 1)` matrix; empty when there is fewer than
/// two taus.
pub fn first_order_smoothing(n_tau: usize) -> DMatrix<f64> {
    let rows = n_tau.saturating_sub(1);
    let mut r = DMatrix::<f64>::zeros(rows, n_tau + 1);
    for i in 0..rows {
        r[(i, i + 1)] = -1.0;
        r[(i, i + 2)] = 1.0;
    }
    r
}

/// Drop the columns of `r` whose parameter is held fixed.
///
/// Differences that touch a fixed parameter keep only their free side, so the
/// remaining free chargeabilities are still pulled toward zero at the edge of
/// an active constraint.
pub fn restrict_columns(r: &DMatrix<f64>, free: &[usize]) -> DMatrix<f64> {
    let mut out = DMatrix::<f64>::zeros(r.nrows(), free.len());
    for (j_new, &j) in free.iter().enumerate() {
        out.set_column(j_new, &r.column(j));
    }
    out
}

/// Starting lambda scaled to the design matrix.
pub fn initial_lambda(x: &DMatrix<f64>) -> f64 {
    let ncols = x.ncols().max(1) as f64;
    let trace: f64 = x.column_iter().map(|c| c.norm_squared()).sum();
    let lam = trace / ncols;
    if lam.is_finite() && lam > 0.0 { lam } else { 1.0 }
}

/// Log-spaced lambda candidates from `lam0 * 1e-4` to `lam0 * 1e2`, ascending.
pub fn lambda_candidates(lam0: f64) -> Vec<f64> {
    const STEPS: usize = 13;
    let lo = -4.0f64;
    let hi = 2.0f64;
    (0..STEPS)
        .map(|i| lam0 * 10f64.powf(lo + (hi - lo) * i as f64 / (STEPS - 1) as f64))
        .collect()
}

/// Pick the candidate with the smallest score; ties go to the larger lambda.
///
/// Candidates whose score is not finite are skipped. Returns `None` if no
/// candidate produced a finite score.
pub fn pick_lambda<F>(candidates: &[f64], mut score: F) -> Option<(f64, DVector<f64>)>
where
    F: FnMut(f64) -> Option<(f64, DVector<f64>)>,
{
    let mut best: Option<(f64, f64, DVector<f64>)> = None;
    for &lam in candidates {
        let Some((value, sol)) = score(lam) else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        let better = match &best {
            None => true,
            Some((best_value, best_lam, _)) => {
                value < *best_value || (value == *best_value && lam > *best_lam)
            }
        };
        if better {
            best = Some((value, lam, sol));
        }
    }
    best.map(|(_, lam, sol)| (lam, sol))
}
