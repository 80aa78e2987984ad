//! Sequential estimator runner.
//!
//! Runs every estimator over the same input in order, timing each one. A
//! failing estimator is logged and recorded; the rest still run.

use std::time::{Duration, Instant};

use es_core::{Error, Estimator, EstimatorResult};

/// Wall-clock time spent in one named stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    /// Stage name (estimator name for estimation stages).
    pub stage: String,
    /// Elapsed wall-clock time.
    pub elapsed: Duration,
}

/// An estimator that returned an error.
#[derive(Debug)]
pub struct EstimatorFailure {
    /// Estimator name.
    pub estimator: String,
    /// The error it returned.
    pub error: Error,
}

/// Outcome of [`run_estimators`].
#[derive(Debug, Default)]
pub struct EstimatorRun {
    /// Successful results, in estimator order.
    pub results: Vec<EstimatorResult>,
    /// Failed estimators, in estimator order.
    pub failures: Vec<EstimatorFailure>,
    /// One timing per estimator, successful or not.
    pub timings: Vec<StageTiming>,
}

impl EstimatorRun {
    /// True when every estimator succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total time spent across estimators.
    pub fn total_elapsed(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

/// Run `estimators` over `data` one after another.
pub fn run_estimators<D: ?Sized>(data: &D, estimators: &[Box<dyn Estimator<D>>]) -> EstimatorRun {
    let mut run = EstimatorRun::default();

    for est in estimators {
        let name = est.name().to_string();
        let start = Instant::now();
        let outcome = est.estimate(data);
        let elapsed = start.elapsed();

        match outcome {
            Ok(series) => {
                log::info!(
                    "estimator '{name}' finished in {:.3}s ({} coefficients)",
                    elapsed.as_secs_f64(),
                    series.len()
                );
                run.results.push(EstimatorResult::new(name.clone(), series));
            }
            Err(error) => {
                log::warn!(
                    "estimator '{name}' failed after {:.3}s: {error}",
                    elapsed.as_secs_f64()
                );
                run.failures.push(EstimatorFailure { estimator: name.clone(), error });
            }
        }
        run.timings.push(StageTiming { stage: name, elapsed });
    }

    run
}
