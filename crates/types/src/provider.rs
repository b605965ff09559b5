use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Known swap/bridge provider identities
///
/// The set is closed; adding a provider means adding a variant here and
/// registering its adapter in the provider table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Uniswap,
    Thirdweb,
    #[serde(rename = "lifi")]
    LiFi,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Uniswap, ProviderId::Thirdweb, ProviderId::LiFi];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Uniswap => "uniswap",
            ProviderId::Thirdweb => "thirdweb",
            ProviderId::LiFi => "lifi",
        }
    }

    /// Default routing style of the provider
    pub fn default_kind(&self) -> ProviderKind {
        match self {
            ProviderId::Uniswap => ProviderKind::Amm,
            ProviderId::Thirdweb | ProviderId::LiFi => ProviderKind::Bridge,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// How a provider settles a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// On-chain AMM; same-chain routes only
    Amm,
    /// Bridge or cross-chain aggregator; also serves same-chain as fallback
    Bridge,
}

/// Provider call being routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Quote,
    Prepare,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Quote => "quote",
            Capability::Prepare => "prepare",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
