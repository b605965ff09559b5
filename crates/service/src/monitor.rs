use std::future::Future;
use std::time::Duration;
use swap_engine_metrics::MetricsCollector;
use swap_engine_router::ProviderError;
use swap_engine_types::{ChainId, TransactionStatus};
use tracing::{debug, info, warn};

use crate::SwapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            max_attempts: 30,
        }
    }
}

/// Bounded sequential polling of one transaction's status
///
/// Each attempt sleeps first, then queries. `COMPLETED` returns, `FAILED`
/// errors, anything else (including a failed query) keeps polling. When
/// attempts run out the last observed status is returned, since the
/// transaction may still settle.
#[derive(Debug, Clone)]
pub struct StatusMonitor {
    settings: MonitorSettings,
    metrics: MetricsCollector,
}

impl StatusMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            settings,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    pub async fn watch<F, Fut>(
        &self,
        tx_hash: &str,
        chain_id: ChainId,
        mut query: F,
    ) -> Result<TransactionStatus, SwapError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<TransactionStatus, ProviderError>>,
    {
        let mut last = TransactionStatus::Pending;

        for attempt in 1..=self.settings.max_attempts {
            tokio::time::sleep(self.settings.poll_interval).await;

            match query().await {
                Ok(TransactionStatus::Completed) => {
                    self.metrics.record_status_poll(TransactionStatus::Completed.as_str());
                    info!(tx_hash, chain_id = %chain_id, attempt, "transaction completed");
                    return Ok(TransactionStatus::Completed);
                }
                Ok(TransactionStatus::Failed) => {
                    self.metrics.record_status_poll(TransactionStatus::Failed.as_str());
                    warn!(tx_hash, chain_id = %chain_id, attempt, "transaction failed");
                    return Err(SwapError::TransactionFailed {
                        tx_hash: tx_hash.to_string(),
                        chain_id,
                    });
                }
                Ok(status) => {
                    self.metrics.record_status_poll(status.as_str());
                    debug!(tx_hash, status = %status, attempt, "transaction not settled yet");
                    last = status;
                }
                Err(e) => {
                    self.metrics.record_status_poll("ERROR");
                    warn!(tx_hash, error = %e, attempt, "status query failed, will retry");
                }
            }
        }

        warn!(
            tx_hash,
            chain_id = %chain_id,
            status = %last,
            attempts = self.settings.max_attempts,
            "status polling exhausted"
        );
        Ok(last)
    }
}

impl Default for StatusMonitor {
    fn default() -> Self {
        Self::new(MonitorSettings::default())
    }
}
