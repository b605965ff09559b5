use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swap_engine_cache::SwapCache;
use swap_engine_metrics::ErrorContext;
use swap_engine_router::{Router, SwapProvider};
use swap_engine_types::{
    ChainId, PreparedSwap, ProviderId, SwapQuote, SwapRequest, SwapResult, SwapTransaction,
    TransactionStatus,
};
use tracing::{debug, info};

use crate::{
    ExecutionMeta, ExecutionOptions, OriginTxExecutor, RequestValidator, StatusMonitor,
    SwapAuditStore, SwapError, SwapRequestRecord,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote: SwapQuote,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    pub prepared: PreparedSwap,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSwapResponse {
    pub transaction_hashes: Vec<String>,
    /// Seconds, taken from the quote that priced the swap
    pub estimated_duration: u64,
}

/// Outcome of the custodial path: the persisted result and the quote it
/// was executed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodialSwap {
    pub result: SwapResult,
    pub quote: SwapQuote,
}

/// Swap orchestration over the router
///
/// Quote and prepare are stateless. The custodial path persists the request
/// before anything is executed and the result afterwards, so a crash in
/// between still leaves an audit trail.
pub struct SwapService {
    router: Arc<Router>,
    validator: RequestValidator,
    store: Arc<dyn SwapAuditStore>,
    cache: SwapCache,
    monitor: StatusMonitor,
    executor: Option<Arc<dyn OriginTxExecutor>>,
    custodial_enabled: bool,
}

impl SwapService {
    pub fn new(
        router: Arc<Router>,
        store: Arc<dyn SwapAuditStore>,
        cache: SwapCache,
        monitor: StatusMonitor,
    ) -> Self {
        Self {
            validator: RequestValidator::new(router.registry().clone()),
            router,
            store,
            cache,
            monitor,
            executor: None,
            custodial_enabled: false,
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn OriginTxExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_custodial_execution(mut self, enabled: bool) -> Self {
        self.custodial_enabled = enabled;
        self
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn custodial_enabled(&self) -> bool {
        self.custodial_enabled
    }

    pub fn validate_swap_request(&self, request: &SwapRequest) -> Result<(), SwapError> {
        self.validator.validate(request)
    }

    pub async fn get_quote(&self, request: &SwapRequest) -> Result<QuoteResponse, SwapError> {
        self.validate_swap_request(request)?;
        let routed = self.router.select_quote(request, None).await?;
        Ok(QuoteResponse {
            quote: routed.result,
            provider: routed.provider,
        })
    }

    /// Non-custodial prepare; the provider is reselected independently of
    /// any earlier quote
    pub async fn prepare_swap(&self, request: &SwapRequest) -> Result<PrepareResponse, SwapError> {
        self.prepare(request, None).await
    }

    /// Prepare through exactly one provider, typically the one that quoted
    pub async fn prepare_swap_pinned(
        &self,
        request: &SwapRequest,
        provider: ProviderId,
    ) -> Result<PrepareResponse, SwapError> {
        self.prepare(request, Some(provider)).await
    }

    async fn prepare(
        &self,
        request: &SwapRequest,
        pinned: Option<ProviderId>,
    ) -> Result<PrepareResponse, SwapError> {
        self.validate_swap_request(request)?;
        let routed = self.router.select_prepare(request, pinned).await?;
        Ok(PrepareResponse {
            prepared: routed.result,
            provider: routed.provider,
        })
    }

    /// Custodial execution: audit, quote, prepare with the quoting provider,
    /// execute, persist
    pub async fn process_swap(
        &self,
        request: &SwapRequest,
        options: &ExecutionOptions,
    ) -> Result<CustodialSwap, SwapError> {
        if !self.custodial_enabled {
            return Err(SwapError::CustodialDisabled);
        }
        let executor = self
            .executor
            .as_ref()
            .ok_or_else(|| SwapError::Execution("no origin transaction executor configured".to_string()))?;

        self.validate_swap_request(request)?;

        let user_address = if options.user_address.is_empty() {
            request.sender.to_ascii_lowercase()
        } else {
            options.user_address.to_ascii_lowercase()
        };
        let swap_id = uuid::Uuid::new_v4().to_string();
        let start_time = Utc::now();

        self.store
            .save_swap_request(&SwapRequestRecord {
                id: swap_id.clone(),
                user_address: user_address.clone(),
                request: request.clone(),
                created_at: start_time,
            })
            .await?;

        let quote = self.router.select_quote(request, None).await?;
        let prepared = self
            .router
            .select_prepare(request, Some(quote.provider))
            .await?;

        let meta = ExecutionMeta {
            swap_id: swap_id.clone(),
            provider: prepared.provider,
        };
        let executed = executor
            .execute_origin_txs(&prepared.result.transactions, options, &meta)
            .await
            .with_provider(prepared.provider.as_str())
            .map_err(|e| SwapError::Execution(e.to_string()))?;

        let result = SwapResult {
            id: swap_id,
            user_address,
            provider: prepared.provider,
            transactions: executed
                .into_iter()
                .map(|tx| SwapTransaction {
                    hash: tx.transaction_hash,
                    chain_id: tx.chain_id,
                    status: TransactionStatus::Pending,
                    user_op_hash: tx.user_op_hash,
                })
                .collect(),
            start_time,
            end_time: Utc::now(),
        };
        self.store.save_swap_result(&result).await?;

        info!(
            swap_id = %result.id,
            provider = %result.provider,
            transactions = result.transactions.len(),
            "custodial swap submitted"
        );
        Ok(CustodialSwap {
            result,
            quote: quote.result,
        })
    }

    pub async fn execute_swap(
        &self,
        request: &SwapRequest,
        options: &ExecutionOptions,
    ) -> Result<ExecuteSwapResponse, SwapError> {
        let swap = self.process_swap(request, options).await?;
        Ok(ExecuteSwapResponse {
            transaction_hashes: swap.result.transactions.into_iter().map(|t| t.hash).collect(),
            estimated_duration: swap.quote.estimated_duration,
        })
    }

    pub async fn get_swap_history(&self, user_address: &str) -> Result<Vec<SwapResult>, SwapError> {
        Ok(self.store.get_swap_history(user_address).await?)
    }

    /// Provider whose status API should be asked about `tx_hash`
    ///
    /// A persisted result for the hash names its provider. Otherwise the
    /// first bridge in the cross-chain order that lists the chain is used,
    /// then the same-chain order.
    pub async fn resolve_status_owner(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
    ) -> Result<ProviderId, SwapError> {
        if let Some(result) = self.store.find_by_tx_hash(tx_hash, chain_id).await? {
            return Ok(result.provider);
        }

        let config = self.router.config();
        config
            .cross_chain_order
            .iter()
            .chain(config.same_chain_order.iter())
            .copied()
            .find(|p| {
                self.router.table().get(*p).is_some()
                    && self.router.registry().provider_lists_chain(*p, chain_id)
            })
            .ok_or(SwapError::NoStatusProvider(chain_id))
    }

    pub async fn monitor_status(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
    ) -> Result<TransactionStatus, SwapError> {
        let owner = self.resolve_status_owner(tx_hash, chain_id).await?;
        let adapter = self
            .router
            .table()
            .get(owner)
            .ok_or(SwapError::NoStatusProvider(chain_id))?;

        debug!(tx_hash, chain_id = %chain_id, provider = %owner, "monitoring transaction");
        self.watch(adapter, tx_hash, chain_id).await
    }

    /// Monitor an approval and drop the cached allowance once it lands
    pub async fn monitor_approval(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
        token: &str,
        wallet: &str,
    ) -> Result<TransactionStatus, SwapError> {
        let status = self.monitor_status(tx_hash, chain_id).await?;
        if status == TransactionStatus::Completed {
            self.cache.invalidate_approval(chain_id, token, wallet).await;
            debug!(tx_hash, token, wallet, "approval settled, cached allowance invalidated");
        }
        Ok(status)
    }

    async fn watch(
        &self,
        adapter: Arc<dyn SwapProvider>,
        tx_hash: &str,
        chain_id: ChainId,
    ) -> Result<TransactionStatus, SwapError> {
        self.monitor
            .watch(tx_hash, chain_id, || {
                let adapter = adapter.clone();
                let tx_hash = tx_hash.to_string();
                async move { adapter.monitor_transaction(&tx_hash, chain_id).await }
            })
            .await
    }
}
