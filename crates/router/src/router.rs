use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use swap_engine_metrics::MetricsCollector;
use swap_engine_ratelimit::{BreakerRegistry, CircuitBreaker, CircuitBreakerError};
use swap_engine_types::{Capability, PreparedSwap, ProviderId, SwapQuote, SwapRequest};
use tracing::{debug, info, warn};

use crate::{
    CandidateFailure, CapabilityRegistry, FailureReason, ProviderError, ProviderTable, RouteError,
    SwapProvider,
};

/// Candidate preference per route shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    pub same_chain_order: Vec<ProviderId>,
    pub cross_chain_order: Vec<ProviderId>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            same_chain_order: vec![ProviderId::Uniswap, ProviderId::Thirdweb],
            cross_chain_order: vec![ProviderId::Thirdweb],
        }
    }
}

/// Result of a routed call together with the provider that served it
#[derive(Debug, Clone, PartialEq)]
pub struct Routed<T> {
    pub provider: ProviderId,
    pub result: T,
}

/// Orders candidate providers for a route and calls them through their
/// breakers, falling back on failure
pub struct Router {
    table: ProviderTable,
    registry: Arc<CapabilityRegistry>,
    breakers: Arc<BreakerRegistry>,
    config: RouterConfig,
    metrics: MetricsCollector,
}

impl Router {
    pub fn new(
        table: ProviderTable,
        registry: Arc<CapabilityRegistry>,
        breakers: Arc<BreakerRegistry>,
        config: RouterConfig,
    ) -> Self {
        Self {
            table,
            registry,
            breakers,
            config,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn table(&self) -> &ProviderTable {
        &self.table
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Ordered candidates; a pinned provider replaces the configured order
    pub fn candidates(&self, request: &SwapRequest, pinned: Option<ProviderId>) -> Vec<ProviderId> {
        if let Some(provider) = pinned {
            return vec![provider];
        }
        if request.is_same_chain() {
            self.config.same_chain_order.clone()
        } else {
            self.config.cross_chain_order.clone()
        }
    }

    pub async fn select_quote(
        &self,
        request: &SwapRequest,
        pinned: Option<ProviderId>,
    ) -> Result<Routed<SwapQuote>, RouteError> {
        self.select_with(request, Capability::Quote, pinned, |adapter, req| async move {
            adapter.get_quote(&req).await
        })
        .await
    }

    pub async fn select_prepare(
        &self,
        request: &SwapRequest,
        pinned: Option<ProviderId>,
    ) -> Result<Routed<PreparedSwap>, RouteError> {
        self.select_with(request, Capability::Prepare, pinned, |adapter, req| async move {
            adapter.prepare_swap(&req).await
        })
        .await
    }

    /// Try each candidate in order until one succeeds
    ///
    /// Candidates are skipped when the capability registry or the adapter
    /// rejects the route, or when their breaker is cooling down. The first
    /// success is returned without touching later candidates.
    pub async fn select_with<T, F, Fut>(
        &self,
        request: &SwapRequest,
        capability: Capability,
        pinned: Option<ProviderId>,
        call: F,
    ) -> Result<Routed<T>, RouteError>
    where
        F: Fn(Arc<dyn SwapProvider>, SwapRequest) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let started = tokio::time::Instant::now();
        let mut attempts = Vec::new();
        let mut any_supported = false;

        for provider in self.candidates(request, pinned) {
            let Some(adapter) = self.routable_adapter(provider, request) else {
                debug!(provider = %provider, capability = %capability, "candidate does not support route");
                attempts.push(CandidateFailure {
                    provider,
                    reason: FailureReason::Unsupported,
                });
                continue;
            };
            any_supported = true;

            let breaker = self.breakers.get_or_create(provider.as_str());
            if !breaker.is_operational() {
                let retry_in = retry_in(&breaker);
                self.metrics.record_breaker_rejection(provider.as_str());
                debug!(provider = %provider, retry_in_ms = retry_in.as_millis() as u64, "skipping provider with open circuit");
                attempts.push(CandidateFailure {
                    provider,
                    reason: FailureReason::CircuitOpen { retry_in },
                });
                continue;
            }

            let outcome = breaker
                .execute(|| call(adapter.clone(), request.clone()))
                .await;
            self.metrics
                .set_breaker_state(provider.as_str(), breaker.state().into());

            match outcome {
                Ok(result) => {
                    self.metrics
                        .record_provider_call(provider.as_str(), capability.as_str(), "success");
                    self.metrics
                        .record_route_duration(capability.as_str(), started.elapsed());
                    info!(provider = %provider, capability = %capability, "provider selected");
                    return Ok(Routed { provider, result });
                }
                Err(CircuitBreakerError::Open { retry_in, .. }) => {
                    self.metrics.record_breaker_rejection(provider.as_str());
                    attempts.push(CandidateFailure {
                        provider,
                        reason: FailureReason::CircuitOpen { retry_in },
                    });
                }
                Err(CircuitBreakerError::Operation(e)) => {
                    self.metrics
                        .record_provider_call(provider.as_str(), capability.as_str(), "failure");
                    warn!(provider = %provider, capability = %capability, error = %e, "provider call failed, trying next candidate");
                    attempts.push(CandidateFailure {
                        provider,
                        reason: FailureReason::Provider(e.to_string()),
                    });
                }
            }
        }

        self.metrics
            .record_route_duration(capability.as_str(), started.elapsed());

        if any_supported {
            Err(RouteError::Exhausted { attempts })
        } else {
            Err(RouteError::Unsupported { attempts })
        }
    }

    fn routable_adapter(
        &self,
        provider: ProviderId,
        request: &SwapRequest,
    ) -> Option<Arc<dyn SwapProvider>> {
        if !self.registry.supports_route(provider, request) {
            return None;
        }
        self.table
            .get(provider)
            .filter(|adapter| adapter.supports_route(request))
    }
}

fn retry_in(breaker: &CircuitBreaker) -> Duration {
    Duration::from_millis(breaker.stats().retry_in_ms.unwrap_or(0))
}
