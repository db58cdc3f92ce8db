//! Telemetry sink that keeps everything in memory.

use portcullis_types::{counter_name, AdmissionMethod, Telemetry};
use std::sync::{Mutex, MutexGuard};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records decision counters and timings for assertions.
///
/// Counter names follow the `human_verification.<method>.<outcome>`
/// convention so tests can assert on exactly what an operator would see.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    counters: Mutex<Vec<String>>,
    timings: Mutex<Vec<f64>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All counter increments so far, in order.
    pub fn counters(&self) -> Vec<String> {
        locked(&self.counters).clone()
    }

    /// All evaluation timings observed so far, in milliseconds.
    pub fn timings(&self) -> Vec<f64> {
        locked(&self.timings).clone()
    }

    pub fn reset(&self) {
        locked(&self.counters).clear();
        locked(&self.timings).clear();
    }
}

impl Telemetry for RecordingTelemetry {
    fn record_decision(&self, method: AdmissionMethod, admitted: bool) {
        locked(&self.counters).push(counter_name(method, admitted));
    }

    fn observe_eval_ms(&self, elapsed_ms: f64) {
        locked(&self.timings).push(elapsed_ms);
    }
}
