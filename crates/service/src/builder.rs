use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use swap_engine_cache::{CacheStore, CacheTtls, InMemoryCacheStore, RedisCacheStore, SwapCache};
use swap_engine_config::{validate_config, AppConfig};
use swap_engine_ratelimit::{
    BreakerRegistry, BreakerStats, CircuitBreakerConfig, ReconnectBackoff,
};
use swap_engine_router::{
    AllowanceSource, CapabilityRegistry, ChainInfo, ProviderCapability, ProviderTable, Router,
    RouterConfig, SpotPriceSource, SwapProvider, TokenMetadataSource,
};
use swap_engine_types::{ChainId, ProviderId};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    InMemoryAuditStore, MonitorSettings, OriginTxExecutor, ProtocolFeeSource, ProtocolFees,
    ProviderSelector, StatusMonitor, SwapAuditStore, SwapService, TokenResolver,
};

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Fully wired engine; owns the single breaker registry for the process
pub struct SwapEngine {
    config: AppConfig,
    registry: Arc<CapabilityRegistry>,
    breakers: Arc<BreakerRegistry>,
    service: Arc<SwapService>,
    selector: Arc<ProviderSelector>,
}

impl SwapEngine {
    pub fn builder() -> SwapEngineBuilder {
        SwapEngineBuilder::new()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    pub fn service(&self) -> &Arc<SwapService> {
        &self.service
    }

    pub fn selector(&self) -> &Arc<ProviderSelector> {
        &self.selector
    }

    pub fn breaker_stats(&self) -> Vec<BreakerStats> {
        self.breakers.stats()
    }
}

/// Builder for SwapEngine
pub struct SwapEngineBuilder {
    config: Option<AppConfig>,
    providers: Vec<Arc<dyn SwapProvider>>,
    cache_store: Option<Arc<dyn CacheStore>>,
    audit_store: Option<Arc<dyn SwapAuditStore>>,
    executor: Option<Arc<dyn OriginTxExecutor>>,
    prices: Option<Arc<dyn SpotPriceSource>>,
    metadata: Option<Arc<dyn TokenMetadataSource>>,
    allowances: Option<Arc<dyn AllowanceSource>>,
    fee_source: Option<Arc<dyn ProtocolFeeSource>>,
}

impl SwapEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            providers: Vec::new(),
            cache_store: None,
            audit_store: None,
            executor: None,
            prices: None,
            metadata: None,
            allowances: None,
            fee_source: None,
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a provider adapter; a later adapter with the same id wins
    pub fn with_provider(mut self, provider: Arc<dyn SwapProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    pub fn with_audit_store(mut self, store: Arc<dyn SwapAuditStore>) -> Self {
        self.audit_store = Some(store);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn OriginTxExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_price_source(mut self, prices: Arc<dyn SpotPriceSource>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_token_metadata(mut self, metadata: Arc<dyn TokenMetadataSource>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_allowance_source(mut self, allowances: Arc<dyn AllowanceSource>) -> Self {
        self.allowances = Some(allowances);
        self
    }

    pub fn with_fee_source(mut self, source: Arc<dyn ProtocolFeeSource>) -> Self {
        self.fee_source = Some(source);
        self
    }

    /// Connect the configured Redis store before building
    ///
    /// Falls through to [`build`](Self::build) unchanged when a store was
    /// supplied or no `redis_url` is configured.
    pub async fn build_async(mut self) -> anyhow::Result<SwapEngine> {
        if self.cache_store.is_none() {
            if let Some(config) = &self.config {
                if let Some(url) = &config.cache.redis_url {
                    let backoff = ReconnectBackoff::new(
                        Duration::from_millis(config.cache.reconnect_base_ms),
                        Duration::from_millis(config.cache.reconnect_cap_ms),
                        config.cache.reconnect_max_attempts,
                    );
                    let store = RedisCacheStore::connect(url, backoff).await;
                    self.cache_store = Some(Arc::new(store));
                }
            }
        }
        Ok(self.build()?)
    }

    pub fn build(self) -> Result<SwapEngine, BuilderError> {
        let config = self.config.ok_or_else(|| BuilderError::MissingField {
            field: "config".to_string(),
        })?;
        validate_config(&config).map_err(|e| BuilderError::InvalidConfig(e.to_string()))?;

        if self.providers.is_empty() {
            return Err(BuilderError::MissingField {
                field: "providers".to_string(),
            });
        }
        let executor = match (config.features.custodial_execution, self.executor) {
            (true, None) => {
                return Err(BuilderError::MissingField {
                    field: "executor".to_string(),
                })
            }
            (_, executor) => executor,
        };

        let registry = Arc::new(capability_registry(&config)?);
        let router_config = router_config(&config)?;
        let breakers = Arc::new(BreakerRegistry::new(breaker_config(&config)));

        let mut table = ProviderTable::new();
        for provider in self.providers {
            table.register(provider);
        }
        for id in router_config
            .same_chain_order
            .iter()
            .chain(router_config.cross_chain_order.iter())
        {
            if table.get(*id).is_none() {
                warn!(provider = %id, "provider in candidate order has no registered adapter");
            }
        }

        let cache_store = match self.cache_store {
            Some(store) => store,
            None => {
                if config.cache.redis_url.is_some() {
                    warn!("redis_url configured but not connected; use build_async. Falling back to in-memory cache");
                }
                Arc::new(InMemoryCacheStore::new()) as Arc<dyn CacheStore>
            }
        };
        let cache = SwapCache::new(
            cache_store,
            CacheTtls {
                quote: config.cache.quote_ttl(),
                approval: config.cache.approval_ttl(),
            },
        );

        let router = Arc::new(Router::new(
            table,
            registry.clone(),
            breakers.clone(),
            router_config,
        ));
        let monitor = StatusMonitor::new(MonitorSettings {
            poll_interval: Duration::from_secs(config.monitor.poll_interval_secs),
            max_attempts: config.monitor.max_attempts,
        });
        let audit_store = self
            .audit_store
            .unwrap_or_else(|| Arc::new(InMemoryAuditStore::new()));

        let mut service = SwapService::new(router, audit_store, cache.clone(), monitor)
            .with_custodial_execution(config.features.custodial_execution);
        if let Some(executor) = executor {
            service = service.with_executor(executor);
        }
        let service = Arc::new(service);

        let mut selector = ProviderSelector::new(
            service.clone(),
            TokenResolver::new(registry.clone(), self.metadata),
            cache,
            ProtocolFees::new(self.fee_source, config.fees.default_tax_in_percent),
        );
        if let Some(prices) = self.prices {
            selector = selector.with_price_source(prices);
        }
        if let Some(allowances) = self.allowances {
            selector = selector.with_allowance_source(allowances);
        }

        info!(
            environment = ?config.service.environment,
            chains = registry.chains().count(),
            custodial = config.features.custodial_execution,
            "swap engine built"
        );

        Ok(SwapEngine {
            config,
            registry,
            breakers,
            service,
            selector: Arc::new(selector),
        })
    }
}

impl Default for SwapEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn capability_registry(config: &AppConfig) -> Result<CapabilityRegistry, BuilderError> {
    let mut registry = CapabilityRegistry::new();

    for (name, chain) in &config.chains {
        let mut info = ChainInfo::new(ChainId(chain.chain_id), name.as_str())
            .with_native(chain.native_symbol.as_str(), chain.native_decimals);
        for alias in &chain.aliases {
            info = info.with_alias(alias.as_str());
        }
        for (symbol, token) in &chain.tokens {
            info = info.with_token(symbol, &token.address, token.decimals);
        }
        registry = registry.with_chain(info);
    }

    for (name, capability) in &config.providers.capabilities {
        let id = parse_provider(name)?;
        let kind = capability.kind.unwrap_or_else(|| id.default_kind());
        let mut entry = ProviderCapability::new(kind, capability.chains.iter().copied().map(ChainId));
        for [a, b] in &capability.pairs {
            entry = entry.with_pair(a, b);
        }
        registry = registry.with_provider(id, entry);
    }

    Ok(registry)
}

fn router_config(config: &AppConfig) -> Result<RouterConfig, BuilderError> {
    let parse_order = |order: &[String]| {
        order
            .iter()
            .map(|name| parse_provider(name))
            .collect::<Result<Vec<_>, _>>()
    };
    Ok(RouterConfig {
        same_chain_order: parse_order(&config.providers.same_chain_order)?,
        cross_chain_order: parse_order(&config.providers.cross_chain_order)?,
    })
}

fn breaker_config(config: &AppConfig) -> CircuitBreakerConfig {
    let settings = &config.circuit_breaker;
    CircuitBreakerConfig {
        failure_threshold: settings.failure_threshold,
        monitoring_window: Duration::from_secs(settings.monitoring_window_secs),
        timeout: Duration::from_secs(settings.timeout_secs),
        success_threshold: settings.success_threshold,
        half_open_max_probes: settings.half_open_max_probes,
    }
}

fn parse_provider(name: &str) -> Result<ProviderId, BuilderError> {
    ProviderId::from_str(name).map_err(|e| BuilderError::InvalidConfig(e.to_string()))
}
