//! Multi-provider swap routing with circuit breaking, quote/approval
//! caching and settlement monitoring
//!
//! The engine lives in the member crates; this crate re-exports them under
//! one roof and hosts the end-to-end scenario tests.

pub use swap_engine_cache as cache;
pub use swap_engine_config as config;
pub use swap_engine_metrics as metrics;
pub use swap_engine_ratelimit as ratelimit;
pub use swap_engine_router as router;
pub use swap_engine_service as service;
pub use swap_engine_types as types;

pub use swap_engine_service::{
    ProviderSelector, QuoteParams, SelectorQuote, SwapEngine, SwapEngineBuilder, SwapError,
    SwapService,
};
