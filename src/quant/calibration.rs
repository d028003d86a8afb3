//! Activation-range calibration for static quantization.
//!
//! Callers record sample activations per op in a [`CalibrationSet`]; a
//! [`RangeObserver`] per op reduces them to a range, which becomes a fixed
//! scale and zero-point.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::int8::{params_from_range, QuantScheme};
use crate::config::{CalibrationConfig, CalibrationMethod};

/// Upper bound on values kept for percentile estimation per op.
const MAX_PERCENTILE_SAMPLES: usize = 1 << 20;

/// Representative input activations, keyed by the weight that consumes them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationSet {
    batches: BTreeMap<String, Vec<Vec<f32>>>,
}

impl CalibrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_batch(mut self, op: impl Into<String>, activations: Vec<f32>) -> Self {
        self.push(op, activations);
        self
    }

    pub fn push(&mut self, op: impl Into<String>, activations: Vec<f32>) {
        self.batches.entry(op.into()).or_default().push(activations);
    }

    pub fn batches(&self, op: &str) -> &[Vec<f32>] {
        self.batches.get(op).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ops(&self) -> impl Iterator<Item = &str> {
        self.batches.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.batches.values().all(Vec::is_empty)
    }
}

/// Fixed quantization range of one op's input activations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationRange {
    pub min: f32,
    pub max: f32,
    pub scale: f32,
    pub zero_point: i32,
}

/// Running statistics over activation batches.
#[derive(Debug, Clone)]
pub struct RangeObserver {
    method: CalibrationMethod,
    percentile: f32,
    running_min: Option<f32>,
    running_max: Option<f32>,
    samples: Vec<f32>,
    num_batches: usize,
}

impl RangeObserver {
    /// `percentile` is clamped to `[50, 100]`; NaN falls back to 100.
    pub fn new(method: CalibrationMethod, percentile: f32) -> Self {
        let percentile = if percentile.is_nan() { 100.0 } else { percentile.clamp(50.0, 100.0) };
        Self {
            method,
            percentile,
            running_min: None,
            running_max: None,
            samples: Vec::new(),
            num_batches: 0,
        }
    }

    pub fn observe(&mut self, data: &[f32]) {
        let finite = data.iter().copied().filter(|v| v.is_finite());
        let (batch_min, batch_max) = finite
            .clone()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if batch_min > batch_max {
            return;
        }

        self.running_min = Some(self.running_min.map_or(batch_min, |m| m.min(batch_min)));
        self.running_max = Some(self.running_max.map_or(batch_max, |m| m.max(batch_max)));
        if self.method == CalibrationMethod::Percentile {
            let room = MAX_PERCENTILE_SAMPLES.saturating_sub(self.samples.len());
            self.samples.extend(finite.take(room));
        }
        self.num_batches += 1;
    }

    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    /// Observed `(min, max)`, `None` before any finite value was seen.
    pub fn range(&self) -> Option<(f32, f32)> {
        let (min, max) = (self.running_min?, self.running_max?);
        match self.method {
            CalibrationMethod::MinMax => Some((min, max)),
            CalibrationMethod::Percentile => {
                let mut sorted = self.samples.clone();
                sorted.sort_by(f32::total_cmp);
                let n = sorted.len();
                let at = |p: f32| {
                    let idx = ((p / 100.0) * (n - 1) as f32).round() as usize;
                    sorted[idx.min(n - 1)]
                };
                Some((at(100.0 - self.percentile), at(self.percentile)))
            }
        }
    }

    pub fn compute(&self, scheme: QuantScheme) -> Option<ActivationRange> {
        let (min, max) = self.range()?;
        let (scale, zero_point) = params_from_range(min, max, scheme);
        Some(ActivationRange { min, max, scale, zero_point })
    }
}

/// Ranges for every op in `ops` that has samples in `set`, observing at most
/// `config.sampling_size` batches each.
pub fn calibrate_activations<'a>(
    set: &CalibrationSet,
    ops: impl IntoIterator<Item = &'a str>,
    config: &CalibrationConfig,
    scheme: QuantScheme,
) -> BTreeMap<String, ActivationRange> {
    ops.into_iter()
        .filter_map(|op| {
            let mut observer = RangeObserver::new(config.method, config.percentile);
            for batch in set.batches(op).iter().take(config.sampling_size) {
                observer.observe(batch);
            }
            observer.compute(scheme).map(|range| (op.to_string(), range))
        })
        .collect()
}
