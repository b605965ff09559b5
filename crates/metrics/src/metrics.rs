use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Calls into provider adapters by outcome (success / failure)
    pub static ref PROVIDER_CALLS: IntCounterVec = register_int_counter_vec!(
        "swap_engine_provider_calls_total",
        "Total provider adapter calls",
        &["provider", "capability", "outcome"]
    )
    .unwrap();

    /// End-to-end routing latency in milliseconds
    pub static ref ROUTE_DURATION: HistogramVec = register_histogram_vec!(
        "swap_engine_route_duration_ms",
        "Route selection duration in milliseconds",
        &["capability"],
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // CIRCUIT BREAKER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Calls rejected or skipped because a breaker was open
    pub static ref BREAKER_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "swap_engine_breaker_rejections_total",
        "Total calls short-circuited by an open breaker",
        &["provider"]
    )
    .unwrap();

    /// Breaker state per provider (0 = closed, 1 = open, 2 = half-open)
    pub static ref BREAKER_STATE: IntGaugeVec = register_int_gauge_vec!(
        "swap_engine_breaker_state",
        "Circuit breaker state per provider",
        &["provider"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Cache lookups by kind (quote / approval) and result (hit / miss / unavailable)
    pub static ref CACHE_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "swap_engine_cache_lookups_total",
        "Total cache lookups",
        &["kind", "result"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // STATUS MONITOR METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Status polls by observed status
    pub static ref STATUS_POLLS: IntCounterVec = register_int_counter_vec!(
        "swap_engine_status_polls_total",
        "Total transaction status polls",
        &["status"]
    )
    .unwrap();
}
