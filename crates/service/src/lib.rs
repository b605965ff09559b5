//! Swap domain service and provider selector
//!
//! [`ProviderSelector`] is the entry point for user-facing quote and
//! prepare requests. It normalises input, consults the quote cache and
//! delegates to [`SwapService`], which validates requests, routes them,
//! runs the optional custodial path and monitors submitted transactions.
//! [`SwapEngine`] wires everything from an `AppConfig`.

pub mod builder;
pub mod error;
pub mod execution;
pub mod fees;
pub mod monitor;
pub mod selector;
pub mod service;
pub mod store;
pub mod tokens;
pub mod validator;

pub use builder::*;
pub use error::*;
pub use execution::*;
pub use fees::*;
pub use monitor::*;
pub use selector::*;
pub use service::*;
pub use store::*;
pub use tokens::*;
pub use validator::*;
