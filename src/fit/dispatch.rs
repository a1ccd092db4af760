//! Parallel dispatch of fit jobs.
//!
//! Results always come back in job order, whatever order the workers finish
//! in. `workers == 1` runs on the calling thread.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::AppError;

fn build_pool(workers: usize) -> Result<ThreadPool, AppError> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("dd-worker-{i}"))
        .build()
        .map_err(|e| AppError::config(format!("Cannot start worker pool: {e}")))
}

/// Run every job; the first failure aborts the batch.
///
/// With several workers, jobs already running when a failure occurs finish
/// but no new jobs are started.
pub fn dispatch<J, T, F>(jobs: Vec<J>, workers: usize, run: F) -> Result<Vec<T>, AppError>
where
    J: Send,
    T: Send,
    F: Fn(J) -> Result<T, AppError> + Sync + Send,
{
    if workers == 0 {
        return Err(AppError::config("Worker count must be >= 1."));
    }
    debug!(jobs = jobs.len(), workers, "dispatching");
    if workers == 1 {
        return jobs.into_iter().map(run).collect();
    }
    let pool = build_pool(workers)?;
    pool.install(|| jobs.into_par_iter().map(&run).collect())
}

/// Run every job and keep each outcome, in job order.
pub fn dispatch_isolated<J, T, F>(
    jobs: Vec<J>,
    workers: usize,
    run: F,
) -> Result<Vec<Result<T, AppError>>, AppError>
where
    J: Send,
    T: Send,
    F: Fn(J) -> Result<T, AppError> + Sync + Send,
{
    if workers == 0 {
        return Err(AppError::config("Worker count must be >= 1."));
    }
    debug!(jobs = jobs.len(), workers, "dispatching (isolated)");
    if workers == 1 {
        return Ok(jobs.into_iter().map(run).collect());
    }
    let pool = build_pool(workers)?;
    Ok(pool.install(|| jobs.into_par_iter().map(&run).collect()))
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use rand::prelude::*;
    use rand::rngs::StdRng;

    use super::*;

    fn jittered_jobs(n: usize) -> Vec<(usize, u64)> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..n).map(|i| (i, rng.gen_range(0..5))).collect()
    }

    fn slow_square((i, sleep_ms): (usize, u64)) -> Result<usize, AppError> {
        thread::sleep(Duration::from_millis(sleep_ms));
        Ok(i * i)
    }

    #[test]
    fn results_keep_job_order_for_any_worker_count() {
        let n = 12;
        let expected: Vec<usize> = (0..n).map(|i| i * i).collect();
        for workers in 1..=n {
            let out = dispatch(jittered_jobs(n), workers, slow_square).unwrap();
            assert_eq!(out, expected, "workers = {workers}");
        }
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = dispatch(jittered_jobs(2), 0, slow_square).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(dispatch_isolated(jittered_jobs(2), 0, slow_square).is_err());
    }

    #[test]
    fn abort_mode_surfaces_a_job_error() {
        let run = |i: usize| {
            if i == 3 {
                Err(AppError::engine(i + 1, "boom"))
            } else {
                Ok(i)
            }
        };
        for workers in [1, 3] {
            let err = dispatch((0..6).collect(), workers, run).unwrap_err();
            assert_eq!(err, AppError::engine(4, "boom"));
        }
    }

    #[test]
    fn isolate_mode_reports_every_outcome_in_order() {
        let run = |i: usize| {
            if i % 2 == 1 {
                Err(AppError::engine(i + 1, "odd"))
            } else {
                Ok(i)
            }
        };
        let out = dispatch_isolated((0..7).collect(), 4, run).unwrap();
        assert_eq!(out.len(), 7);
        for (i, res) in out.iter().enumerate() {
            match res {
                Ok(v) => assert_eq!(*v, i),
                Err(e) => assert_eq!(*e, AppError::engine(i + 1, "odd")),
            }
        }
        assert_eq!(out.iter().filter(|r| r.is_err()).count(), 3);
    }
}
