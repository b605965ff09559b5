use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AmountError, BaseUnits, ChainId, ProviderId};

/// A request to swap `amount` of `from_token` on `from_chain_id` into
/// `to_token` on `to_chain_id`
///
/// Tokens are normalised addresses (or the native pseudo-address) by the
/// time a request reaches the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_chain_id: ChainId,
    pub to_chain_id: ChainId,
    pub from_token: String,
    pub to_token: String,
    pub amount: BaseUnits,
    pub sender: String,
    pub receiver: String,
    /// Maximum slippage in basis points; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u32>,
}

impl SwapRequest {
    pub fn is_same_chain(&self) -> bool {
        self.from_chain_id == self.to_chain_id
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u32) -> Self {
        self.slippage_bps = Some(slippage_bps);
        self
    }
}

/// Non-binding estimate produced by one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    pub estimated_receive_amount: BaseUnits,
    /// Output per unit of input, in whole tokens
    pub exchange_rate: Decimal,
    pub bridge_fee: BaseUnits,
    pub gas_fee: BaseUnits,
    /// Expected settlement time in seconds
    pub estimated_duration: u64,
    pub provider: ProviderId,
}

impl SwapQuote {
    pub fn total_fee(&self) -> Result<BaseUnits, AmountError> {
        self.bridge_fee.checked_add(self.gas_fee)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// ERC-20 allowance change that must land before the swap
    Approval,
    #[default]
    Swap,
}

/// Unsigned transaction the client signs and broadcasts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    pub chain_id: ChainId,
    pub to: String,
    pub data: String,
    pub value: BaseUnits,
    #[serde(default)]
    pub kind: TransactionKind,
}

/// Ordered transaction bundle from a single `prepare_swap` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSwap {
    pub provider: ProviderId,
    pub transactions: Vec<PreparedTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PreparedSwap {
    pub fn approvals(&self) -> impl Iterator<Item = &PreparedTransaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Approval)
    }
}

/// Settlement status reported by a provider's status API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotFound,
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::NotFound => "NOT_FOUND",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction submitted on the custodial path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransaction {
    pub hash: String,
    pub chain_id: ChainId,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_op_hash: Option<String>,
}

/// Persisted outcome of a custodial swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    pub id: String,
    pub user_address: String,
    pub provider: ProviderId,
    pub transactions: Vec<SwapTransaction>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl SwapResult {
    pub fn contains_hash(&self, tx_hash: &str) -> bool {
        self.transactions
            .iter()
            .any(|tx| tx.hash.eq_ignore_ascii_case(tx_hash))
    }
}
