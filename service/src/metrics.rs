//! Prometheus metrics for the admission gate.
//!
//! The gate reports decisions through the [`Telemetry`] capability using the
//! logical `human_verification.<method>.<outcome>` convention; Prometheus
//! names cannot contain dots, so here that becomes a single
//! `human_verification_decisions_total` counter with `method` and `outcome`
//! labels. [`GateMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the text exposition format.

use portcullis_types::{AdmissionMethod, Telemetry};
use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Central collection of gate-level Prometheus metrics.
pub struct GateMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    /// Admission decisions by method and outcome.
    pub decisions: IntCounterVec,
    /// Wall-clock time of one gate evaluation, in milliseconds.
    pub eval_ms: Histogram,
}

impl GateMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let decisions = register_int_counter_vec_with_registry!(
            Opts::new(
                "human_verification_decisions_total",
                "Admission decisions by method and outcome"
            ),
            &["method", "outcome"],
            registry
        )
        .expect("failed to register decisions counter");

        // Exponential buckets covering sub-millisecond local calls up to
        // multi-second remote timeouts.
        let eval_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "human_verification_eval_ms",
                "Gate evaluation time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 16).unwrap()),
            registry
        )
        .expect("failed to register eval_ms histogram");

        Self {
            registry,
            decisions,
            eval_ms,
        }
    }

    /// Encode every registered metric in the text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for GateMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry for GateMetrics {
    fn record_decision(&self, method: AdmissionMethod, admitted: bool) {
        let outcome = if admitted { "admitted" } else { "denied" };
        self.decisions
            .with_label_values(&[method.as_str(), outcome])
            .inc();
    }

    fn observe_eval_ms(&self, elapsed_ms: f64) {
        self.eval_ms.observe(elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_increment_by_label_pair() {
        let metrics = GateMetrics::new();
        metrics.record_decision(AdmissionMethod::Recaptcha, true);
        metrics.record_decision(AdmissionMethod::Recaptcha, true);
        metrics.record_decision(AdmissionMethod::None, false);

        assert_eq!(
            metrics
                .decisions
                .with_label_values(&["recaptcha", "admitted"])
                .get(),
            2
        );
        assert_eq!(
            metrics.decisions.with_label_values(&["none", "denied"]).get(),
            1
        );
    }

    #[test]
    fn render_exposes_the_counter_family() {
        let metrics = GateMetrics::new();
        metrics.record_decision(AdmissionMethod::Bypass, true);
        metrics.observe_eval_ms(1.5);

        let text = metrics.render();
        assert!(text.contains("human_verification_decisions_total"));
        assert!(text.contains("method=\"bypass\""));
        assert!(text.contains("outcome=\"admitted\""));
        assert!(text.contains("human_verification_eval_ms"));
    }
}
