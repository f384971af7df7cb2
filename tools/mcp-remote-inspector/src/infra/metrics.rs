use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, TextEncoder, register_histogram_vec,
    register_int_counter_vec, register_int_gauge,
};

use crate::shared::types::TransportKind;

pub static LATENCY_HISTO: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "inspector_latency_ms",
        "Latency of inspector network operations in ms",
        &["operation"]
    )
    .expect("register inspector_latency_ms")
});

pub static INSPECTOR_INFLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("inspector_inflight", "In-flight inspector network operations")
        .expect("register inspector_inflight")
});

pub static OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "inspector_operations_total",
        "Settled inspector operations by transport and outcome",
        &["operation", "transport", "outcome"]
    )
    .expect("register inspector_operations_total")
});

pub struct PendingGaugeGuard;

impl PendingGaugeGuard {
    pub fn new() -> Self {
        INSPECTOR_INFLIGHT.inc();
        PendingGaugeGuard
    }
}

impl Default for PendingGaugeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PendingGaugeGuard {
    fn drop(&mut self) {
        INSPECTOR_INFLIGHT.dec();
    }
}

pub fn observe_latency(operation: &'static str, latency_ms: u64) {
    LATENCY_HISTO
        .with_label_values(&[operation])
        .observe(latency_ms as f64);
}

pub fn record_outcome(operation: &'static str, kind: TransportKind, outcome: &'static str) {
    OPERATIONS
        .with_label_values(&[operation, kind.as_str(), outcome])
        .inc();
}

/// Text exposition of the default registry.
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = Vec::new();
    encoder
        .encode(&metrics, &mut buf)
        .context("encode metrics")?;
    String::from_utf8(buf).context("metrics are not utf-8")
}
