//! Provider routing for the swap engine
//!
//! A [`Router`] walks the configured candidate order for a route, skips
//! providers the [`CapabilityRegistry`] or the adapter itself rejects,
//! gates each call through the provider's circuit breaker and returns the
//! first success. When nothing succeeds the caller gets one aggregated
//! [`RouteError`] naming every candidate and why it was passed over.

pub mod error;
pub mod mock;
pub mod registry;
pub mod router;
pub mod table;
pub mod traits;

pub use error::*;
pub use mock::*;
pub use registry::*;
pub use router::*;
pub use table::*;
pub use traits::*;
