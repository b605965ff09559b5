use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use swap_engine_metrics::MetricsCollector;
use swap_engine_types::{BaseUnits, ChainId, EnvelopeCodec, SwapQuote, SwapRequest};
use tracing::{debug, warn};

use crate::keys::{approval_key, quote_key, APPROVAL_PREFIX, QUOTE_PREFIX};
use crate::CacheStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub quote: Duration,
    pub approval: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(30),
            approval: Duration::from_secs(300),
        }
    }
}

/// Fail-open quote/approval cache over any `CacheStore`
///
/// Values are written through `EnvelopeCodec`, so integer amounts survive
/// the round trip exactly. Store errors never reach the caller.
#[derive(Clone)]
pub struct SwapCache {
    store: Arc<dyn CacheStore>,
    ttls: CacheTtls,
    metrics: MetricsCollector,
}

impl SwapCache {
    pub fn new(store: Arc<dyn CacheStore>, ttls: CacheTtls) -> Self {
        Self {
            store,
            ttls,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    pub fn quote_key_for(request: &SwapRequest) -> String {
        quote_key(
            request.from_chain_id,
            request.to_chain_id,
            &request.from_token,
            &request.to_token,
            request.amount,
            request.slippage_bps,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUOTES
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn get_quote(&self, request: &SwapRequest) -> Option<SwapQuote> {
        self.read(QUOTE_PREFIX, &Self::quote_key_for(request)).await
    }

    /// Cache a quote for the default quote TTL unless `ttl` overrides it
    pub async fn put_quote(&self, request: &SwapRequest, quote: &SwapQuote, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.ttls.quote);
        self.write(QUOTE_PREFIX, &Self::quote_key_for(request), quote, ttl)
            .await;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // APPROVALS
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn get_allowance(&self, chain: ChainId, token: &str, wallet: &str) -> Option<BaseUnits> {
        self.read(APPROVAL_PREFIX, &approval_key(chain, token, wallet))
            .await
    }

    pub async fn put_allowance(
        &self,
        chain: ChainId,
        token: &str,
        wallet: &str,
        allowance: BaseUnits,
        ttl: Option<Duration>,
    ) {
        let ttl = ttl.unwrap_or(self.ttls.approval);
        self.write(APPROVAL_PREFIX, &approval_key(chain, token, wallet), &allowance, ttl)
            .await;
    }

    /// Drop a cached allowance after an allowance-changing transaction
    pub async fn invalidate_approval(&self, chain: ChainId, token: &str, wallet: &str) {
        let key = approval_key(chain, token, wallet);
        match self.store.del(&key).await {
            Ok(()) => debug!(chain_id = %chain, token, "approval cache entry invalidated"),
            Err(e) => warn!(error = %e, key = %key, "cache delete failed, continuing"),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    async fn read<T: DeserializeOwned>(&self, kind: &str, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.metrics.record_cache_lookup(kind, "miss");
                return None;
            }
            Err(e) => {
                self.metrics.record_cache_lookup(kind, "unavailable");
                warn!(error = %e, key = %key, "cache read failed, treating as miss");
                return None;
            }
        };

        match EnvelopeCodec::decode(&raw) {
            Ok(value) => {
                self.metrics.record_cache_lookup(kind, "hit");
                Some(value)
            }
            Err(e) => {
                self.metrics.record_cache_lookup(kind, "miss");
                warn!(error = %e, key = %key, "undecodable cache entry, treating as miss");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, kind: &str, key: &str, value: &T, ttl: Duration) {
        let raw = match EnvelopeCodec::encode(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, kind, "cache encode failed, skipping write");
                return;
            }
        };

        // Whole seconds, rounded up; Redis rejects a zero expiry
        let ttl_secs = (ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0)).max(1);
        if let Err(e) = self.store.set_ex(key, &raw, ttl_secs).await {
            warn!(error = %e, key = %key, "cache write failed, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryCacheStore;
    use rust_decimal::Decimal;
    use swap_engine_types::{ProviderId, NATIVE_PSEUDO_ADDRESS};

    fn request() -> SwapRequest {
        SwapRequest {
            from_chain_id: ChainId(1),
            to_chain_id: ChainId(1),
            from_token: NATIVE_PSEUDO_ADDRESS.to_string(),
            to_token: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
            amount: BaseUnits::from_u128(10_000_000_000_000_000),
            sender: "0x1111111111111111111111111111111111111111".to_string(),
            receiver: "0x1111111111111111111111111111111111111111".to_string(),
            slippage_bps: Some(50),
        }
    }

    fn quote() -> SwapQuote {
        SwapQuote {
            // 2^100, beyond any float's exact integer range
            estimated_receive_amount: "1267650600228229401496703205376".parse().unwrap(),
            exchange_rate: Decimal::new(250012, 2),
            bridge_fee: BaseUnits::zero(),
            gas_fee: BaseUnits::from_u128(21_000),
            estimated_duration: 15,
            provider: ProviderId::Uniswap,
        }
    }

    fn cache() -> (Arc<InMemoryCacheStore>, SwapCache) {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = SwapCache::new(store.clone(), CacheTtls::default());
        (store, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_round_trips_exactly_within_ttl() {
        let (_, cache) = cache();
        cache.put_quote(&request(), &quote(), None).await;

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get_quote(&request()).await, Some(quote()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get_quote(&request()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_ttl_override() {
        let (_, cache) = cache();
        cache
            .put_quote(&request(), &quote(), Some(Duration::from_secs(5)))
            .await;

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get_quote(&request()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_ttl_rounds_up() {
        let (_, cache) = cache();
        cache
            .put_quote(&request(), &quote(), Some(Duration::from_millis(1900)))
            .await;

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(cache.get_quote(&request()).await, Some(quote()));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(cache.get_quote(&request()).await, None);
    }

    #[tokio::test]
    async fn test_amounts_are_stored_as_envelopes() {
        let (store, cache) = cache();
        cache.put_quote(&request(), &quote(), None).await;

        let raw = store
            .get(&SwapCache::quote_key_for(&request()))
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains(r#""estimatedReceiveAmount":{"__type":"bigint","value":"1267650600228229401496703205376"}"#));
    }

    #[tokio::test]
    async fn test_outage_degrades_to_miss() {
        let (store, cache) = cache();
        store.set_available(false);

        cache.put_quote(&request(), &quote(), None).await;
        assert_eq!(cache.get_quote(&request()).await, None);
        cache.invalidate_approval(ChainId(1), "0xabc", "0xdef").await;

        store.set_available(true);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let (store, cache) = cache();
        store
            .set(&SwapCache::quote_key_for(&request()), "{not json")
            .await
            .unwrap();
        assert_eq!(cache.get_quote(&request()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowance_cached_then_invalidated() {
        let (_, cache) = cache();
        let chain = ChainId(137);
        let allowance = BaseUnits::from_u128(1_000_000);

        cache.put_allowance(chain, "0xusdc", "0xwallet", allowance, None).await;
        assert_eq!(cache.get_allowance(chain, "0xUSDC", "0xWALLET").await, Some(allowance));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get_allowance(chain, "0xusdc", "0xwallet").await.is_some());

        cache.invalidate_approval(chain, "0xusdc", "0xwallet").await;
        assert_eq!(cache.get_allowance(chain, "0xusdc", "0xwallet").await, None);
    }
}
