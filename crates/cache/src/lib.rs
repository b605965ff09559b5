//! Quote and approval caching in front of the swap providers
//!
//! The cache is strictly an optimisation: when the backing store is down
//! every read is a miss and every write is dropped, with a warning.

pub mod error;
pub mod keys;
pub mod layer;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::CacheError;
pub use keys::{approval_key, quote_key};
pub use layer::{CacheTtls, SwapCache};
pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use store::CacheStore;
