// Prometheus metrics for Arbiter API

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

lazy_static! {
    // Global registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Synchronous evaluations finished (language and verdict status)
    pub static ref EVALUATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("arbiter_evaluations_total", "Total number of synchronous evaluations"),
        &["language", "status"]
    )
    .expect("metric can be created");

    // Submissions rejected before dispatch, by reason code
    pub static ref SUBMISSIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("arbiter_submissions_rejected_total", "Total submissions rejected"),
        &["reason"]
    )
    .expect("metric can be created");

    // Submissions handed to the worker queue
    pub static ref SUBMISSIONS_QUEUED: CounterVec = CounterVec::new(
        Opts::new("arbiter_submissions_queued_total", "Total submissions queued"),
        &["language"]
    )
    .expect("metric can be created");

    // End-to-end evaluation latency (milliseconds)
    pub static ref EVALUATION_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "arbiter_evaluation_duration_ms",
            "Synchronous evaluation time in milliseconds"
        )
        .buckets(vec![100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]),
        &["language"]
    )
    .expect("metric can be created");
}

/// Initialize metrics registry
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(EVALUATIONS_TOTAL.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(SUBMISSIONS_REJECTED.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(SUBMISSIONS_QUEUED.clone()))
        .expect("collector can be registered");

    REGISTRY
        .register(Box::new(EVALUATION_DURATION.clone()))
        .expect("collector can be registered");
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_evaluation(language: &str, status: &str, duration_ms: f64) {
    EVALUATIONS_TOTAL.with_label_values(&[language, status]).inc();
    EVALUATION_DURATION
        .with_label_values(&[language])
        .observe(duration_ms);
}

pub fn record_rejected(reason: &str) {
    SUBMISSIONS_REJECTED.with_label_values(&[reason]).inc();
}

pub fn record_queued(language: &str) {
    SUBMISSIONS_QUEUED.with_label_values(&[language]).inc();
}
