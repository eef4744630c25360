// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the cloud gateway controller.
//!
//! All metrics carry the `cloud_gateway` prefix.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Outcomes and durations per watched kind
//! - **Derived Resource Metrics** - Writes issued by the apply engine
//!
//! # Example
//!
//! ```rust,no_run
//! use cloud_gateway_controller::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Gateway", std::time::Duration::from_secs(1));
//! ```

use prometheus::core::Collector;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all controller metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "cloud_gateway";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Register `metric` in [`METRICS_REGISTRY`].
///
/// Metric names are static, so a registration failure is a programming error.
fn registered<M: Collector + Clone + 'static>(metric: M) -> M {
    METRICS_REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric names are unique");
    metric
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `Gateway`, `HTTPRoute`)
/// - `status`: Outcome (`success`, `skipped`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    registered(counter)
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `resource_type`: Kind of resource
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    registered(histogram)
});

// ============================================================================
// Derived Resource Metrics
// ============================================================================

/// Total number of writes issued for derived resources
///
/// Labels:
/// - `kind`: Kind of the derived resource
/// - `operation`: `create`, `replace` or `apply`
pub static DERIVED_WRITES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_derived_writes_total"),
        "Total number of writes issued for derived resources by kind and operation",
    );
    let counter = CounterVec::new(opts, &["kind", "operation"]).unwrap();
    registered(counter)
});

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "success", duration);
}

/// Record a reconciliation that was skipped (not ours, or parent gone)
pub fn record_reconciliation_skipped(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "skipped", duration);
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "error", duration);
}

fn record_reconciliation(resource_type: &str, status: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, status])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a write against a derived resource
pub fn record_derived_write(kind: &str, operation: &str) {
    DERIVED_WRITES_TOTAL.with_label_values(&[kind, operation]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
