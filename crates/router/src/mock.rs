//! In-process adapters and lookup ports for tests and local runs

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use swap_engine_types::{
    is_native_token, BaseUnits, ChainId, PreparedSwap, PreparedTransaction, ProviderId,
    ProviderKind, SwapQuote, SwapRequest, TransactionKind, TransactionStatus,
    NATIVE_PSEUDO_ADDRESS,
};

use crate::{
    AllowanceSource, CapabilityRegistry, ChainInfo, ProviderCapability, ProviderError,
    SpotPriceSource, SwapProvider, TokenMetadataSource,
};

/// Ethereum, Polygon and Base with their USDC deployments; every provider
/// listed on all three except LI.FI, which skips Base
pub fn sample_registry() -> CapabilityRegistry {
    let ethereum = ChainInfo::new(ChainId(1), "ethereum")
        .with_alias("eth")
        .with_alias("mainnet")
        .with_token("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6)
        .with_token("USDT", "0xdac17f958d2ee523a2206206994597c13d831ec7", 6)
        .with_token("WETH", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 18);
    let polygon = ChainInfo::new(ChainId(137), "polygon")
        .with_alias("matic")
        .with_native("POL", 18)
        .with_token("USDC", "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359", 6);
    let base = ChainInfo::new(ChainId(8453), "base")
        .with_token("USDC", "0x833589fcd6edb6e08f4c3c32d4f71b54bda02913", 6);

    let all = [ChainId(1), ChainId(137), ChainId(8453)];
    CapabilityRegistry::new()
        .with_chain(ethereum)
        .with_chain(polygon)
        .with_chain(base)
        .with_provider(ProviderId::Uniswap, ProviderCapability::new(ProviderKind::Amm, all))
        .with_provider(ProviderId::Thirdweb, ProviderCapability::new(ProviderKind::Bridge, all))
        .with_provider(
            ProviderId::LiFi,
            ProviderCapability::new(ProviderKind::Bridge, [ChainId(1), ChainId(137)]),
        )
}

/// Scriptable adapter that counts every call
pub struct MockSwapProvider {
    id: ProviderId,
    supported: AtomicBool,
    always_fail: AtomicBool,
    fail_remaining: AtomicU32,
    quote_calls: AtomicU32,
    prepare_calls: AtomicU32,
    status_calls: AtomicU32,
    statuses: Mutex<Vec<Result<TransactionStatus, ProviderError>>>,
}

impl MockSwapProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            supported: AtomicBool::new(true),
            always_fail: AtomicBool::new(false),
            fail_remaining: AtomicU32::new(0),
            quote_calls: AtomicU32::new(0),
            prepare_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            statuses: Mutex::new(Vec::new()),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// Fail every quote/prepare call until `recover` is called
    pub fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.always_fail.store(false, Ordering::SeqCst);
        self.fail_remaining.store(0, Ordering::SeqCst);
    }

    /// Fail the next `n` quote/prepare calls
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Script `monitor_transaction` responses; the last one repeats
    pub fn script_statuses(&self, statuses: Vec<Result<TransactionStatus, ProviderError>>) {
        *self.statuses.lock().unwrap_or_else(|p| p.into_inner()) = statuses;
    }

    pub fn quote_calls(&self) -> u32 {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn prepare_calls(&self) -> u32 {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self) -> Result<(), ProviderError> {
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Upstream(format!("{} unavailable", self.id)));
        }
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Upstream(format!("{} unavailable", self.id)));
        }
        Ok(())
    }

    fn router_address(&self) -> &'static str {
        match self.id {
            ProviderId::Uniswap => "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad",
            ProviderId::Thirdweb => "0xf8ab2dbe6c43bf1a856471182290f91d621ba76d",
            ProviderId::LiFi => "0x1231deb6f5749ef6ce6943a275a1d3e7486f4eae",
        }
    }
}

#[async_trait]
impl SwapProvider for MockSwapProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn supports_route(&self, _request: &SwapRequest) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    async fn get_quote(&self, request: &SwapRequest) -> Result<SwapQuote, ProviderError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;

        let bridge = self.kind() == ProviderKind::Bridge && !request.is_same_chain();
        let bridge_fee = if bridge {
            request
                .amount
                .mul_bips(5)
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?
        } else {
            BaseUnits::zero()
        };

        Ok(SwapQuote {
            estimated_receive_amount: request.amount,
            exchange_rate: Decimal::ONE,
            bridge_fee,
            gas_fee: BaseUnits::from_u128(21_000),
            estimated_duration: if bridge { 120 } else { 15 },
            provider: self.id,
        })
    }

    async fn prepare_swap(&self, request: &SwapRequest) -> Result<PreparedSwap, ProviderError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail()?;

        let native = is_native_token(&request.from_token)
            || request.from_token.eq_ignore_ascii_case(NATIVE_PSEUDO_ADDRESS);
        let mut transactions = Vec::new();
        if !native {
            transactions.push(PreparedTransaction {
                chain_id: request.from_chain_id,
                to: request.from_token.clone(),
                data: "0x095ea7b3".to_string(),
                value: BaseUnits::zero(),
                kind: TransactionKind::Approval,
            });
        }
        transactions.push(PreparedTransaction {
            chain_id: request.from_chain_id,
            to: self.router_address().to_string(),
            data: "0x3593564c".to_string(),
            value: if native { request.amount } else { BaseUnits::zero() },
            kind: TransactionKind::Swap,
        });

        Ok(PreparedSwap {
            provider: self.id,
            transactions,
            expires_at: Some(chrono::Utc::now() + chrono::Duration::minutes(5)),
        })
    }

    async fn monitor_transaction(
        &self,
        _tx_hash: &str,
        _chain_id: ChainId,
    ) -> Result<TransactionStatus, ProviderError> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst) as usize;
        let statuses = self.statuses.lock().unwrap_or_else(|p| p.into_inner());
        match statuses.get(call).or_else(|| statuses.last()) {
            Some(status) => status.clone(),
            None => Ok(TransactionStatus::Pending),
        }
    }
}

/// Fixed USD prices keyed by `(chain, lower-case token)`
#[derive(Default)]
pub struct MockSpotPriceSource {
    prices: Mutex<HashMap<(ChainId, String), Decimal>>,
}

impl MockSpotPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, chain_id: ChainId, token: &str, price: Decimal) {
        self.prices
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((chain_id, token.to_ascii_lowercase()), price);
    }
}

#[async_trait]
impl SpotPriceSource for MockSpotPriceSource {
    async fn get_token_spot_usd_price(&self, chain_id: ChainId, token: &str) -> Option<Decimal> {
        self.prices
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&(chain_id, token.to_ascii_lowercase()))
            .copied()
    }
}

/// Token decimals keyed by `(chain, lower-case token)`; unknown tokens fail
#[derive(Default)]
pub struct MockTokenMetadata {
    decimals: Mutex<HashMap<(ChainId, String), u8>>,
    calls: AtomicU32,
}

impl MockTokenMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decimals(self, chain_id: ChainId, token: &str, decimals: u8) -> Self {
        self.decimals
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((chain_id, token.to_ascii_lowercase()), decimals);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenMetadataSource for MockTokenMetadata {
    async fn get_token_decimals(&self, chain_id: ChainId, token: &str) -> Result<u8, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.decimals
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&(chain_id, token.to_ascii_lowercase()))
            .copied()
            .ok_or_else(|| ProviderError::NotFound(format!("decimals for {token} on chain {chain_id}")))
    }
}

/// Allowances keyed by `(chain, token, owner)`; unknown entries are zero
#[derive(Default)]
pub struct MockAllowanceSource {
    allowances: Mutex<HashMap<(ChainId, String, String), BaseUnits>>,
    calls: AtomicU32,
}

impl MockAllowanceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_allowance(&self, chain_id: ChainId, token: &str, owner: &str, amount: BaseUnits) {
        self.allowances.lock().unwrap_or_else(|p| p.into_inner()).insert(
            (chain_id, token.to_ascii_lowercase(), owner.to_ascii_lowercase()),
            amount,
        );
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AllowanceSource for MockAllowanceSource {
    async fn get_allowance(
        &self,
        chain_id: ChainId,
        token: &str,
        owner: &str,
        _spender: &str,
    ) -> Result<BaseUnits, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .allowances
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&(chain_id, token.to_ascii_lowercase(), owner.to_ascii_lowercase()))
            .copied()
            .unwrap_or_else(BaseUnits::zero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(from_token: &str) -> SwapRequest {
        SwapRequest {
            from_chain_id: ChainId(1),
            to_chain_id: ChainId(1),
            from_token: from_token.to_string(),
            to_token: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            amount: BaseUnits::from_u128(1_000),
            sender: "0x1111111111111111111111111111111111111111".to_string(),
            receiver: "0x1111111111111111111111111111111111111111".to_string(),
            slippage_bps: None,
        }
    }

    #[tokio::test]
    async fn test_erc20_prepare_includes_approval() {
        let provider = MockSwapProvider::new(ProviderId::Uniswap);
        let prepared = provider
            .prepare_swap(&request("0xdac17f958d2ee523a2206206994597c13d831ec7"))
            .await
            .unwrap();
        assert_eq!(prepared.transactions.len(), 2);
        assert_eq!(prepared.approvals().count(), 1);

        let native = provider.prepare_swap(&request(NATIVE_PSEUDO_ADDRESS)).await.unwrap();
        assert_eq!(native.transactions.len(), 1);
        assert_eq!(native.transactions[0].value, BaseUnits::from_u128(1_000));
    }

    #[tokio::test]
    async fn test_scripted_statuses_repeat_last() {
        let provider = MockSwapProvider::new(ProviderId::Thirdweb);
        provider.script_statuses(vec![
            Ok(TransactionStatus::NotFound),
            Ok(TransactionStatus::Completed),
        ]);

        let hash = "0xabc";
        assert_eq!(provider.monitor_transaction(hash, ChainId(1)).await.unwrap(), TransactionStatus::NotFound);
        assert_eq!(provider.monitor_transaction(hash, ChainId(1)).await.unwrap(), TransactionStatus::Completed);
        assert_eq!(provider.monitor_transaction(hash, ChainId(1)).await.unwrap(), TransactionStatus::Completed);
        assert_eq!(provider.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_fail_next_then_recovers() {
        let provider = MockSwapProvider::new(ProviderId::Uniswap);
        provider.fail_next(1);
        assert!(provider.get_quote(&request(NATIVE_PSEUDO_ADDRESS)).await.is_err());
        assert!(provider.get_quote(&request(NATIVE_PSEUDO_ADDRESS)).await.is_ok());
        assert_eq!(provider.quote_calls(), 2);
    }
}
