//! Prometheus metrics for the integrity core.
//!
//! All metrics follow the naming convention: `fi_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // AUDIT CHAIN
    // =========================================================================

    /// Audit records committed
    pub static ref AUDIT_APPENDS: Counter = Counter::new(
        "fi_audit_appends_total",
        "Total number of audit records committed"
    ).expect("metric creation failed");

    /// Audit appends that failed and aborted their mutation
    pub static ref AUDIT_APPEND_FAILURES: Counter = Counter::new(
        "fi_audit_append_failures_total",
        "Audit appends that failed and aborted the enclosing mutation"
    ).expect("metric creation failed");

    /// Chain verifications that found a divergence
    pub static ref CHAIN_VIOLATIONS: Counter = Counter::new(
        "fi_audit_chain_violations_total",
        "Chain verifications that found a broken link"
    ).expect("metric creation failed");

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Version conflicts by entity type
    pub static ref VERSION_CONFLICTS: CounterVec = CounterVec::new(
        Opts::new("fi_concurrency_conflicts_total", "Stale-version writes rejected"),
        &["entity_type"]
    ).expect("metric creation failed");

    /// Ledger rejections by reason
    pub static ref LEDGER_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("fi_ledger_rejections_total", "Material returns and adjustments rejected"),
        &["reason"]  // reason: exceeded/adjustment_exceeds_returned/zero_quantity
    ).expect("metric creation failed");

    /// Scope denials
    pub static ref SCOPE_DENIALS: Counter = Counter::new(
        "fi_scope_denials_total",
        "Mutations refused because the partition is outside the actor's scope"
    ).expect("metric creation failed");

    /// End-to-end commit pipeline duration
    pub static ref MUTATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "fi_mutation_duration_seconds",
            "Time from scope check to committed audit record"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("valid buckets")),
        &["operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Events published on the bus
    pub static ref EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("fi_events_published_total", "Integrity events published"),
        &["topic"]
    ).expect("metric creation failed");

    /// Invalidation deliveries handed to subscribers
    pub static ref INVALIDATIONS_DELIVERED: Counter = Counter::new(
        "fi_invalidations_delivered_total",
        "Invalidation deliveries handed to subscribers"
    ).expect("metric creation failed");

    /// Bus events the router missed by falling behind
    pub static ref INVALIDATION_EVENTS_LAGGED: Counter = Counter::new(
        "fi_invalidation_events_lagged_total",
        "Bus events skipped because the invalidation router fell behind"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Audit
        Box::new(AUDIT_APPENDS.clone()),
        Box::new(AUDIT_APPEND_FAILURES.clone()),
        Box::new(CHAIN_VIOLATIONS.clone()),
        // Mutations
        Box::new(VERSION_CONFLICTS.clone()),
        Box::new(LEDGER_REJECTIONS.clone()),
        Box::new(SCOPE_DENIALS.clone()),
        Box::new(MUTATION_DURATION.clone()),
        // Events
        Box::new(EVENTS_PUBLISHED.clone()),
        Box::new(INVALIDATIONS_DELIVERED.clone()),
        Box::new(INVALIDATION_EVENTS_LAGGED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing one operation of [`MUTATION_DURATION`]. Observation happens on drop.
pub fn time_mutation(operation: &str) -> HistogramTimer {
    HistogramTimer::new(&MUTATION_DURATION.with_label_values(&[operation]))
}
