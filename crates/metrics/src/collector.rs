use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use crate::metrics::*;

/// Thin handle over the process-wide Prometheus metrics
///
/// Labels are plain strings so lower crates can record without depending
/// on each other's types.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_provider_call(&self, provider: &str, capability: &str, outcome: &str) {
        PROVIDER_CALLS
            .with_label_values(&[provider, capability, outcome])
            .inc();
    }

    pub fn record_route_duration(&self, capability: &str, duration: Duration) {
        ROUTE_DURATION
            .with_label_values(&[capability])
            .observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CIRCUIT BREAKER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_breaker_rejection(&self, provider: &str) {
        BREAKER_REJECTIONS.with_label_values(&[provider]).inc();
    }

    /// `state` uses the gauge encoding: 0 closed, 1 open, 2 half-open
    pub fn set_breaker_state(&self, provider: &str, state: u8) {
        BREAKER_STATE
            .with_label_values(&[provider])
            .set(i64::from(state));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_cache_lookup(&self, kind: &str, result: &str) {
        CACHE_LOOKUPS.with_label_values(&[kind, result]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATUS MONITOR METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_status_poll(&self, status: &str) {
        STATUS_POLLS.with_label_values(&[status]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Render every registered metric in Prometheus text format
    pub fn gather_text(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}
