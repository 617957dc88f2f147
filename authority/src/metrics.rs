//! Prometheus metrics for the request pipeline.

use prometheus_client::{
    metrics::{counter::Counter, histogram::Histogram},
    registry::Registry,
};

/// Metrics tracked per authority process.
#[derive(Clone)]
pub struct Metrics {
    /// Requests received, before validation.
    pub requests: Counter,
    /// Requests that produced an SRD.
    pub completed: Counter,
    /// Requests rejected for invalid parameters.
    pub rejected: Counter,
    /// Requests that failed internally or timed out.
    pub failed: Counter,
    /// Build-and-sign latency of completed requests, in seconds.
    pub build_duration: Histogram,
}

impl Metrics {
    /// Creates the metrics and registers them with `registry`.
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self {
            requests: Counter::default(),
            completed: Counter::default(),
            rejected: Counter::default(),
            failed: Counter::default(),
            build_duration: Histogram::new(
                prometheus_client::metrics::histogram::exponential_buckets(0.005, 2.0, 14),
            ),
        };
        registry.register("requests", "Requests received", metrics.requests.clone());
        registry.register(
            "completed",
            "Requests that produced an SRD",
            metrics.completed.clone(),
        );
        registry.register(
            "rejected",
            "Requests rejected for invalid parameters",
            metrics.rejected.clone(),
        );
        registry.register(
            "failed",
            "Requests that failed internally or timed out",
            metrics.failed.clone(),
        );
        registry.register(
            "build_duration",
            "Build-and-sign latency of completed requests in seconds",
            metrics.build_duration.clone(),
        );
        metrics
    }
}
