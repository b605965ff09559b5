pub mod amount;
pub mod chain;
pub mod codec;
pub mod fees;
pub mod provider;
pub mod swap;

pub use amount::*;
pub use chain::*;
pub use codec::*;
pub use fees::*;
pub use provider::*;
pub use swap::*;
