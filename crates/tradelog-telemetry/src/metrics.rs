//! Prometheus metrics for the trade list engine.
//!
//! Covers:
//! - Intents received and fetches issued
//! - Stale responses and fetch failures
//! - Aggregation cache hits, misses and evictions
//! - Validation rejections and storage failures
//! - Current engine state
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, which is a programming error that should
//! crash at first use rather than silently drop observability.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    Encoder, GaugeVec, Histogram, IntCounter, IntCounterVec, TextEncoder,
};

/// Engine states, in the order they are reported.
pub const ENGINE_STATES: [&str; 5] = ["idle", "debouncing", "fetching", "ready", "error"];

/// Intents received.
/// Labels: kind (text/discrete)
pub static INTENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tradelog_intents_total",
        "Total view intents received",
        &["kind"]
    )
    .unwrap()
});

/// Record queries issued to the record source.
pub static FETCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("tradelog_fetches_total", "Total record queries issued").unwrap()
});

/// Responses discarded because a newer query superseded them.
pub static STALE_RESPONSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tradelog_stale_responses_total",
        "Total superseded fetch responses discarded"
    )
    .unwrap()
});

/// Failed record queries.
pub static FETCH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("tradelog_fetch_failures_total", "Total failed record queries").unwrap()
});

/// Record query latency in milliseconds.
pub static FETCH_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "tradelog_fetch_latency_ms",
        "Record query latency in milliseconds",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Aggregation cache lookups.
/// Labels: result (hit/miss)
pub static CACHE_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tradelog_cache_lookups_total",
        "Aggregation cache lookups",
        &["result"]
    )
    .unwrap()
});

/// Aggregation cache entries evicted by capacity.
pub static CACHE_EVICTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tradelog_cache_evictions_total",
        "Aggregation cache entries evicted by capacity"
    )
    .unwrap()
});

/// Aggregation cache entries purged because their record set changed.
pub static CACHE_INVALIDATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tradelog_cache_invalidations_total",
        "Aggregation cache entries purged after a record set change"
    )
    .unwrap()
});

/// Fields dropped by the validator.
/// Labels: source (url/storage/intent), field
pub static VALIDATION_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tradelog_validation_rejections_total",
        "Fields dropped during validation",
        &["source", "field"]
    )
    .unwrap()
});

/// Storage operations that failed and were swallowed.
/// Labels: op (save/load/clear)
pub static STORAGE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tradelog_storage_failures_total",
        "Persistence operations that failed",
        &["op"]
    )
    .unwrap()
});

/// Query strings written to history.
/// Labels: mode (replace/push)
pub static URL_WRITES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "tradelog_url_writes_total",
        "Query strings written to history",
        &["mode"]
    )
    .unwrap()
});

/// Engine state (1 = active, 0 = inactive).
/// Labels: state
pub static ENGINE_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "tradelog_engine_state",
        "Engine state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Record an intent of the given debounce kind.
    pub fn intent_received(kind: &str) {
        INTENTS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a query sent to the record source.
    pub fn fetch_issued() {
        FETCHES_TOTAL.inc();
    }

    /// Record a superseded response.
    pub fn stale_response() {
        STALE_RESPONSES_TOTAL.inc();
    }

    /// Record a failed query.
    pub fn fetch_failed() {
        FETCH_FAILURES_TOTAL.inc();
    }

    pub fn fetch_latency(latency_ms: f64) {
        FETCH_LATENCY_MS.observe(latency_ms);
    }

    pub fn cache_hit() {
        CACHE_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
    }

    pub fn cache_miss() {
        CACHE_LOOKUPS_TOTAL.with_label_values(&["miss"]).inc();
    }

    pub fn cache_evicted() {
        CACHE_EVICTIONS_TOTAL.inc();
    }

    pub fn cache_invalidated(entries: usize) {
        CACHE_INVALIDATIONS_TOTAL.inc_by(entries as u64);
    }

    /// Record a field dropped by the validator.
    pub fn validation_rejected(source: &str, field: &str) {
        VALIDATION_REJECTIONS_TOTAL
            .with_label_values(&[source, field])
            .inc();
    }

    /// Record a swallowed storage failure.
    pub fn storage_failed(op: &str) {
        STORAGE_FAILURES_TOTAL.with_label_values(&[op]).inc();
    }

    /// Record a history write.
    pub fn url_written(mode: &str) {
        URL_WRITES_TOTAL.with_label_values(&[mode]).inc();
    }

    /// Set the engine state.
    /// Only the active state is set to 1, all others to 0.
    pub fn engine_state_set(state: &str) {
        for s in ENGINE_STATES {
            ENGINE_STATE.with_label_values(&[s]).set(0.0);
        }
        ENGINE_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
