use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use swap_engine_types::{ChainId, SwapRequest, SwapResult};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// CORE TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Audit record of a custodial swap request, written before execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequestRecord {
    pub id: String,
    pub user_address: String,
    pub request: SwapRequest,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record ID: {0}")]
    DuplicateId(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Audit repository for custodial swaps
#[async_trait]
pub trait SwapAuditStore: Send + Sync {
    async fn save_swap_request(&self, record: &SwapRequestRecord) -> Result<(), StoreError>;

    async fn save_swap_result(&self, result: &SwapResult) -> Result<(), StoreError>;

    /// Results for a user, newest first
    async fn get_swap_history(&self, user_address: &str) -> Result<Vec<SwapResult>, StoreError>;

    /// Result that produced `tx_hash` on `chain_id`, if any
    async fn find_by_tx_hash(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
    ) -> Result<Option<SwapResult>, StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE (for testing)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    requests: Arc<RwLock<HashMap<String, SwapRequestRecord>>>,
    results: Arc<RwLock<Vec<SwapResult>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn result_count(&self) -> usize {
        self.results.read().map(|r| r.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::DatabaseError("lock poisoned".to_string())
}

#[async_trait]
impl SwapAuditStore for InMemoryAuditStore {
    async fn save_swap_request(&self, record: &SwapRequestRecord) -> Result<(), StoreError> {
        let mut requests = self.requests.write().map_err(poisoned)?;
        if requests.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        requests.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn save_swap_result(&self, result: &SwapResult) -> Result<(), StoreError> {
        let mut results = self.results.write().map_err(poisoned)?;
        if results.iter().any(|r| r.id == result.id) {
            return Err(StoreError::DuplicateId(result.id.clone()));
        }
        results.push(result.clone());
        Ok(())
    }

    async fn get_swap_history(&self, user_address: &str) -> Result<Vec<SwapResult>, StoreError> {
        let results = self.results.read().map_err(poisoned)?;
        let mut history: Vec<_> = results
            .iter()
            .filter(|r| r.user_address.eq_ignore_ascii_case(user_address))
            .cloned()
            .collect();
        history.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(history)
    }

    async fn find_by_tx_hash(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
    ) -> Result<Option<SwapResult>, StoreError> {
        let results = self.results.read().map_err(poisoned)?;
        Ok(results
            .iter()
            .find(|r| {
                r.transactions
                    .iter()
                    .any(|t| t.chain_id == chain_id && t.hash.eq_ignore_ascii_case(tx_hash))
            })
            .cloned())
    }
}
