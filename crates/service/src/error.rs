use swap_engine_router::RouteError;
use swap_engine_types::{AmountError, ChainId};
use thiserror::Error;

use crate::StoreError;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(ChainId),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("unknown token '{token}' on chain {chain_id}")]
    UnknownToken { chain_id: ChainId, token: String },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("transaction {tx_hash} failed on chain {chain_id}")]
    TransactionFailed { tx_hash: String, chain_id: ChainId },

    #[error("no provider can monitor transactions on chain {0}")]
    NoStatusProvider(ChainId),

    #[error("custodial execution is disabled")]
    CustodialDisabled,

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("token metadata unavailable: {0}")]
    Metadata(String),

    #[error("audit store error: {0}")]
    Store(#[from] StoreError),
}

impl SwapError {
    /// True when the caller sent something the engine cannot serve
    pub fn is_client_error(&self) -> bool {
        match self {
            SwapError::Validation(_)
            | SwapError::UnsupportedChain(_)
            | SwapError::InvalidAmount(_)
            | SwapError::UnknownToken { .. }
            | SwapError::CustodialDisabled => true,
            SwapError::Route(route) => route.is_client_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(SwapError::UnsupportedChain(ChainId(56)).is_client_error());
        assert!(SwapError::InvalidAmount(AmountError::Empty).is_client_error());
        assert!(SwapError::Route(RouteError::Unsupported { attempts: vec![] }).is_client_error());
        assert!(!SwapError::Route(RouteError::Exhausted { attempts: vec![] }).is_client_error());
        assert!(!SwapError::Execution("bundler down".to_string()).is_client_error());
    }
}
