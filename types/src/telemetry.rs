//! Telemetry capability consumed by the gate.

use crate::method::AdmissionMethod;

/// Counter and latency sink the gate reports decisions to.
///
/// Implementations must be cheap and must never panic; telemetry cannot be
/// allowed to change an admission outcome.
pub trait Telemetry: Send + Sync {
    /// Record one terminal decision.
    fn record_decision(&self, method: AdmissionMethod, admitted: bool);

    /// Record how long one evaluation took, in milliseconds.
    fn observe_eval_ms(&self, elapsed_ms: f64);
}

/// Dot-separated counter name for a decision, for sinks keyed by flat names.
pub fn counter_name(method: AdmissionMethod, admitted: bool) -> String {
    let outcome = if admitted { "admitted" } else { "denied" };
    format!("human_verification.{}.{}", method.as_str(), outcome)
}

/// Telemetry that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record_decision(&self, _method: AdmissionMethod, _admitted: bool) {}

    fn observe_eval_ms(&self, _elapsed_ms: f64) {}
}
