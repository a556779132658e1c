//! # Metrics
//!
//! Prometheus metrics for monitoring the manifest engine.
//!
//! ## Metrics Exposed
//!
//! - `manifest_engine_operations_total` - Total number of engine operations by operation
//! - `manifest_engine_operation_errors_total` - Total number of failed engine operations by operation
//! - `manifest_engine_operation_duration_seconds` - Duration of engine operations by operation
//! - `manifest_engine_documents_processed_total` - Total number of YAML documents decoded

use anyhow::Result;
use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "manifest_engine_operations_total",
            "Total number of manifest engine operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create OPERATIONS_TOTAL metric - this should never happen")
});

static OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "manifest_engine_operation_errors_total",
            "Total number of failed manifest engine operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "manifest_engine_operation_duration_seconds",
            "Duration of manifest engine operations in seconds by operation",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["operation"],
    )
    .expect("Failed to create OPERATION_DURATION metric - this should never happen")
});

static DOCUMENTS_PROCESSED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "manifest_engine_documents_processed_total",
        "Total number of YAML documents decoded by the splitter",
    )
    .expect("Failed to create DOCUMENTS_PROCESSED_TOTAL metric - this should never happen")
});

/// Register all engine metrics with the crate registry.
///
/// Safe to call more than once; repeated registrations are ignored.
pub fn register_metrics() -> Result<()> {
    register(Box::new(OPERATIONS_TOTAL.clone()))?;
    register(Box::new(OPERATION_ERRORS_TOTAL.clone()))?;
    register(Box::new(OPERATION_DURATION.clone()))?;
    register(Box::new(DOCUMENTS_PROCESSED_TOTAL.clone()))?;

    Ok(())
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<()> {
    match REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Render every registered metric in the Prometheus text exposition format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn record_operation(operation: &str, duration: f64) {
    OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
    OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_operation_errors(operation: &str) {
    OPERATION_ERRORS_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_documents_processed(count: usize) {
    DOCUMENTS_PROCESSED_TOTAL.inc_by(count as u64);
}
