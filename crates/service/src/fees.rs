use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use swap_engine_types::{AmountError, BaseUnits, ProtocolFeeConfig, ProviderId};
use tracing::debug;

/// Persisted protocol fee records
#[async_trait]
pub trait ProtocolFeeSource: Send + Sync {
    async fn get_fee_config(&self, provider: ProviderId) -> Option<ProtocolFeeConfig>;
}

#[derive(Debug, Default)]
pub struct InMemoryFeeSource {
    configs: RwLock<HashMap<ProviderId, ProtocolFeeConfig>>,
}

impl InMemoryFeeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, config: ProtocolFeeConfig) {
        self.configs
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(config.provider, config);
    }
}

#[async_trait]
impl ProtocolFeeSource for InMemoryFeeSource {
    async fn get_fee_config(&self, provider: ProviderId) -> Option<ProtocolFeeConfig> {
        self.configs
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&provider)
            .cloned()
    }
}

/// Fee charged on an input amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolFee {
    pub bips: u32,
    pub amount: BaseUnits,
}

/// Resolves the fee for a provider, falling back to the configured default
/// when no active record exists
pub struct ProtocolFees {
    source: Option<Arc<dyn ProtocolFeeSource>>,
    default_tax_in_percent: Decimal,
}

impl ProtocolFees {
    pub fn new(source: Option<Arc<dyn ProtocolFeeSource>>, default_tax_in_percent: Decimal) -> Self {
        Self {
            source,
            default_tax_in_percent,
        }
    }

    pub async fn resolve(&self, provider: ProviderId) -> ProtocolFeeConfig {
        if let Some(source) = &self.source {
            if let Some(config) = source.get_fee_config(provider).await {
                if config.is_active {
                    return config;
                }
                debug!(provider = %provider, "protocol fee record inactive, using default");
            }
        }
        ProtocolFeeConfig::new(provider, self.default_tax_in_percent)
    }

    pub async fn fee_for(&self, provider: ProviderId, amount: BaseUnits) -> Result<ProtocolFee, AmountError> {
        let bips = self.resolve(provider).await.effective_bips();
        Ok(ProtocolFee {
            bips,
            amount: amount.mul_bips(bips)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_default_when_absent() {
        let fees = ProtocolFees::new(None, Decimal::from_str("0.3").unwrap());
        let fee = fees
            .fee_for(ProviderId::Uniswap, BaseUnits::from_u128(1_000_000))
            .await
            .unwrap();
        assert_eq!(fee.bips, 30);
        assert_eq!(fee.amount, BaseUnits::from_u128(3_000));
    }

    #[tokio::test]
    async fn test_persisted_record_wins() {
        let source = Arc::new(InMemoryFeeSource::new());
        let mut config = ProtocolFeeConfig::new(ProviderId::Thirdweb, Decimal::ONE);
        config.tax_in_bips = Some(15);
        source.upsert(config);

        let fees = ProtocolFees::new(Some(source), Decimal::ZERO);
        assert_eq!(fees.resolve(ProviderId::Thirdweb).await.effective_bips(), 15);
        assert_eq!(fees.resolve(ProviderId::Uniswap).await.effective_bips(), 0);
    }

    #[tokio::test]
    async fn test_inactive_record_falls_back() {
        let source = Arc::new(InMemoryFeeSource::new());
        let mut config = ProtocolFeeConfig::new(ProviderId::Thirdweb, Decimal::from(2));
        config.is_active = false;
        source.upsert(config);

        let fees = ProtocolFees::new(Some(source), Decimal::from_str("0.1").unwrap());
        assert_eq!(fees.resolve(ProviderId::Thirdweb).await.effective_bips(), 10);
    }
}
