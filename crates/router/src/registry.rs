use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use swap_engine_types::{ChainId, ProviderId, ProviderKind, SwapRequest, NATIVE_PSEUDO_ADDRESS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub decimals: u8,
}

/// Static description of one supported chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    pub name: String,
    /// Lower-case aliases usable in `SYMBOL@alias` token references
    pub aliases: Vec<String>,
    pub native_symbol: String,
    pub native_decimals: u8,
    /// Known tokens keyed by upper-case symbol
    pub tokens: HashMap<String, TokenInfo>,
}

impl ChainInfo {
    pub fn new(chain_id: ChainId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            chain_id,
            aliases: vec![name.to_ascii_lowercase()],
            name,
            native_symbol: "ETH".to_string(),
            native_decimals: 18,
            tokens: HashMap::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into().to_ascii_lowercase();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    pub fn with_native(mut self, symbol: impl Into<String>, decimals: u8) -> Self {
        self.native_symbol = symbol.into();
        self.native_decimals = decimals;
        self
    }

    pub fn with_token(mut self, symbol: &str, address: &str, decimals: u8) -> Self {
        self.tokens.insert(
            symbol.to_ascii_uppercase(),
            TokenInfo {
                address: address.to_ascii_lowercase(),
                decimals,
            },
        );
        self
    }

    pub fn matches_alias(&self, alias: &str) -> bool {
        let alias = alias.to_ascii_lowercase();
        self.aliases.iter().any(|a| *a == alias)
    }

    pub fn token_by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens.get(&symbol.to_ascii_uppercase())
    }

    /// Decimals for a normalised address, including the native pseudo-address
    pub fn decimals_of(&self, address: &str) -> Option<u8> {
        let address = address.to_ascii_lowercase();
        if address == NATIVE_PSEUDO_ADDRESS {
            return Some(self.native_decimals);
        }
        self.tokens
            .values()
            .find(|t| t.address == address)
            .map(|t| t.decimals)
    }
}

/// What one provider can route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCapability {
    pub kind: ProviderKind,
    pub chains: BTreeSet<ChainId>,
    /// Optional allow-list of lower-case `(token_a, token_b)` pairs, unordered
    pub pairs: Option<BTreeSet<(String, String)>>,
}

impl ProviderCapability {
    pub fn new(kind: ProviderKind, chains: impl IntoIterator<Item = ChainId>) -> Self {
        Self {
            kind,
            chains: chains.into_iter().collect(),
            pairs: None,
        }
    }

    pub fn with_pair(mut self, token_a: &str, token_b: &str) -> Self {
        let (a, b) = ordered_pair(token_a, token_b);
        self.pairs.get_or_insert_with(BTreeSet::new).insert((a, b));
        self
    }

    pub fn allows_pair(&self, token_a: &str, token_b: &str) -> bool {
        match &self.pairs {
            None => true,
            Some(pairs) => pairs.contains(&ordered_pair(token_a, token_b)),
        }
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    let (a, b) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Chains the engine knows about and the support matrix of each provider
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    chains: BTreeMap<ChainId, ChainInfo>,
    providers: HashMap<ProviderId, ProviderCapability>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, chain: ChainInfo) -> Self {
        self.chains.insert(chain.chain_id, chain);
        self
    }

    pub fn with_provider(mut self, provider: ProviderId, capability: ProviderCapability) -> Self {
        self.providers.insert(provider, capability);
        self
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainInfo> {
        self.chains.get(&chain_id)
    }

    pub fn has_chain(&self, chain_id: ChainId) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainInfo> {
        self.chains.values()
    }

    pub fn chain_by_alias(&self, alias: &str) -> Option<&ChainInfo> {
        self.chains.values().find(|c| c.matches_alias(alias))
    }

    pub fn capability(&self, provider: ProviderId) -> Option<&ProviderCapability> {
        self.providers.get(&provider)
    }

    pub fn provider_lists_chain(&self, provider: ProviderId, chain_id: ChainId) -> bool {
        self.capability(provider)
            .map(|c| c.chains.contains(&chain_id))
            .unwrap_or(false)
    }

    /// Both chains listed, AMMs same-chain only, pair allowed when restricted
    pub fn supports_route(&self, provider: ProviderId, request: &SwapRequest) -> bool {
        let Some(capability) = self.capability(provider) else {
            return false;
        };

        if !capability.chains.contains(&request.from_chain_id)
            || !capability.chains.contains(&request.to_chain_id)
        {
            return false;
        }

        if capability.kind == ProviderKind::Amm && !request.is_same_chain() {
            return false;
        }

        capability.allows_pair(&request.from_token, &request.to_token)
    }
}
