//! Accuracy-driven search over which ops stay in fp32.
//!
//! Trial 1 quantizes every candidate op. Each failed trial moves one more op
//! to fp32, in the order chosen by the strategy, until the metric meets the
//! accuracy criterion or the exit policy stops the search.

use std::time::Instant;
use tracing::{debug, info};

use crate::config::TuningConfig;
use crate::error::{Error, Result};

/// Result of a converged search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TuningOutcome {
    pub trials: usize,
    pub metric: f32,
    pub fallback: Vec<String>,
}

/// Run the search.
///
/// `fallback_order` lists candidate ops, first to fall back first.
/// `run_trial` evaluates a candidate in which the given ops stay fp32.
pub(crate) fn search<F>(
    tuning: &TuningConfig,
    baseline: f32,
    fallback_order: Vec<String>,
    mut run_trial: F,
) -> Result<TuningOutcome>
where
    F: FnMut(&[String]) -> Result<f32>,
{
    let criterion = tuning.accuracy_criterion;
    let deadline = tuning.exit_policy.timeout().map(|t| Instant::now() + t);
    let better = |a: f32, b: f32| if criterion.higher_is_better { a > b } else { a < b };

    let mut pending = fallback_order.into_iter();
    let mut fallback = Vec::new();
    let mut best: Option<f32> = None;
    let mut trials = 0;

    let reason = loop {
        trials += 1;
        let metric = run_trial(&fallback)?;
        debug!(trial = trials, metric, fallback = fallback.len(), "tuning trial");

        if criterion.accepts(baseline, metric) {
            info!(trials, baseline, metric, fallback = fallback.len(), "tuning converged");
            return Ok(TuningOutcome { trials, metric, fallback });
        }
        if metric.is_finite() && best.is_none_or(|b| better(metric, b)) {
            best = Some(metric);
        }

        if trials >= tuning.exit_policy.max_trials {
            break format!("max_trials ({}) reached", tuning.exit_policy.max_trials);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break format!("timeout ({}s) reached", tuning.exit_policy.timeout_secs);
        }
        match pending.next() {
            Some(op) => fallback.push(op),
            None => break "every candidate op already falls back to fp32".to_string(),
        }
    };

    Err(Error::OptimizationFailed {
        trials,
        baseline,
        best: best.unwrap_or(f32::NAN),
        reason: format!("{reason}; threshold {:.4}", criterion.threshold(baseline)),
    })
}
