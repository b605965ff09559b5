//! Metrics and tracing for the swap routing engine
//!
//! Tracks provider calls, circuit breaker activity, cache effectiveness
//! and settlement polling.
//!
//! # Features
//!
//! - Prometheus metrics in the text exposition format
//! - JSON tracing with an `EnvFilter`
//! - Correlation IDs threaded through request spans
//!
//! # Example
//!
//! ```no_run
//! use swap_engine_metrics::{init_tracing, MetricsCollector};
//! use std::time::Duration;
//!
//! init_tracing("info,swap_engine=debug").unwrap();
//!
//! let collector = MetricsCollector::new();
//! collector.record_provider_call("uniswap", "quote", "success");
//! collector.record_route_duration("quote", Duration::from_millis(120));
//!
//! println!("{}", collector.gather_text().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError};
pub use self::tracing::{init_tracing, CorrelationId, ErrorContext, RequestSpan, TracingError};
