use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use swap_engine_router::ProviderError;
use swap_engine_types::{ChainId, PreparedTransaction, ProviderId};

/// Per-call execution options passed through to the session-key executor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Smart-account owner the session key acts for
    pub user_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Submit as an ERC-4337 user operation rather than a plain transaction
    #[serde(default)]
    pub sponsored: bool,
}

/// Context recorded by the executor alongside the submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMeta {
    pub swap_id: String,
    pub provider: ProviderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutedTx {
    pub transaction_hash: String,
    pub chain_id: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_op_hash: Option<String>,
}

/// Custodial execution port; submits a prepared bundle on the user's behalf
#[async_trait]
pub trait OriginTxExecutor: Send + Sync {
    async fn execute_origin_txs(
        &self,
        txs: &[PreparedTransaction],
        options: &ExecutionOptions,
        meta: &ExecutionMeta,
    ) -> Result<Vec<ExecutedTx>, ProviderError>;
}

/// Executor that fabricates sequential hashes
#[derive(Debug, Default)]
pub struct MockOriginTxExecutor {
    counter: AtomicU64,
    failing: AtomicBool,
}

impl MockOriginTxExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn executed(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OriginTxExecutor for MockOriginTxExecutor {
    async fn execute_origin_txs(
        &self,
        txs: &[PreparedTransaction],
        options: &ExecutionOptions,
        _meta: &ExecutionMeta,
    ) -> Result<Vec<ExecutedTx>, ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Upstream("bundler rejected user operation".to_string()));
        }

        Ok(txs
            .iter()
            .map(|tx| {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                ExecutedTx {
                    transaction_hash: format!("0x{n:064x}"),
                    chain_id: tx.chain_id,
                    user_op_hash: options.sponsored.then(|| format!("0x{:064x}", n << 32)),
                }
            })
            .collect())
    }
}
