use async_trait::async_trait;
use rust_decimal::Decimal;
use swap_engine_types::{
    BaseUnits, ChainId, PreparedSwap, ProviderId, ProviderKind, SwapQuote, SwapRequest,
    TransactionStatus,
};

use crate::ProviderError;

/// Uniform contract every swap/bridge adapter implements
///
/// Adapters own their HTTP clients and timeouts; the router only observes
/// outcomes.
#[async_trait]
pub trait SwapProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn kind(&self) -> ProviderKind {
        self.id().default_kind()
    }

    /// Adapter-side route check, consulted after the capability registry
    fn supports_route(&self, request: &SwapRequest) -> bool;

    async fn get_quote(&self, request: &SwapRequest) -> Result<SwapQuote, ProviderError>;

    /// Build the unsigned transaction bundle the client signs and broadcasts
    async fn prepare_swap(&self, request: &SwapRequest) -> Result<PreparedSwap, ProviderError>;

    async fn monitor_transaction(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
    ) -> Result<TransactionStatus, ProviderError>;
}

/// Spot USD price lookup; `None` when the token is not priced
#[async_trait]
pub trait SpotPriceSource: Send + Sync {
    async fn get_token_spot_usd_price(&self, chain_id: ChainId, token: &str) -> Option<Decimal>;
}

#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn get_token_decimals(&self, chain_id: ChainId, token: &str) -> Result<u8, ProviderError>;
}

/// ERC-20 allowance of `owner` towards `spender`
#[async_trait]
pub trait AllowanceSource: Send + Sync {
    async fn get_allowance(
        &self,
        chain_id: ChainId,
        token: &str,
        owner: &str,
        spender: &str,
    ) -> Result<BaseUnits, ProviderError>;
}
