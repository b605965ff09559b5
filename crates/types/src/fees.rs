use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProviderId;

/// Protocol fee charged on top of a provider's route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolFeeConfig {
    pub provider: ProviderId,
    pub tax_in_percent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_in_bips: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_in_eth: Option<Decimal>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl ProtocolFeeConfig {
    pub fn new(provider: ProviderId, tax_in_percent: Decimal) -> Self {
        Self {
            provider,
            tax_in_percent,
            tax_in_bips: None,
            tax_in_eth: None,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    /// Fee in basis points; explicit bips win over the percentage
    pub fn effective_bips(&self) -> u32 {
        if !self.is_active {
            return 0;
        }
        self.tax_in_bips.unwrap_or_else(|| {
            (self.tax_in_percent * Decimal::from(100u32))
                .trunc()
                .to_u32()
                .unwrap_or(0)
        })
    }
}
