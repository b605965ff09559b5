use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use swap_engine_router::{CapabilityRegistry, TokenMetadataSource};
use swap_engine_types::{is_evm_address, ChainId, NATIVE_PSEUDO_ADDRESS, NATIVE_TOKEN};
use tracing::debug;

use crate::SwapError;

/// Maps user-facing token references to normalised addresses and resolves
/// their decimals
///
/// Accepted forms are `native`, a bare symbol known on the chain,
/// `SYMBOL@alias` where the alias names the same chain, and raw `0x`
/// addresses. Decimals never change on chain, so lookups that reach the
/// metadata source are memoised for the life of the resolver.
pub struct TokenResolver {
    registry: Arc<CapabilityRegistry>,
    metadata: Option<Arc<dyn TokenMetadataSource>>,
    decimals: RwLock<HashMap<(ChainId, String), u8>>,
}

impl TokenResolver {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        metadata: Option<Arc<dyn TokenMetadataSource>>,
    ) -> Self {
        Self {
            registry,
            metadata,
            decimals: RwLock::new(HashMap::new()),
        }
    }

    pub fn normalize(&self, chain_id: ChainId, token: &str) -> Result<String, SwapError> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(NATIVE_TOKEN) {
            return Ok(NATIVE_PSEUDO_ADDRESS.to_string());
        }
        if is_evm_address(token) {
            return Ok(token.to_ascii_lowercase());
        }

        let chain = self
            .registry
            .chain(chain_id)
            .ok_or(SwapError::UnsupportedChain(chain_id))?;

        let symbol = match token.split_once('@') {
            Some((symbol, alias)) => {
                if !chain.matches_alias(alias) {
                    return match self.registry.chain_by_alias(alias) {
                        Some(other) => Err(SwapError::Validation(format!(
                            "token {token} refers to chain {}, request is on chain {chain_id}",
                            other.chain_id
                        ))),
                        None => Err(unknown(chain_id, token)),
                    };
                }
                symbol
            }
            None => token,
        };

        if symbol.eq_ignore_ascii_case(&chain.native_symbol) {
            return Ok(NATIVE_PSEUDO_ADDRESS.to_string());
        }

        chain
            .token_by_symbol(symbol)
            .map(|t| t.address.clone())
            .ok_or_else(|| unknown(chain_id, token))
    }

    pub async fn decimals(&self, chain_id: ChainId, address: &str) -> Result<u8, SwapError> {
        if let Some(decimals) = self
            .registry
            .chain(chain_id)
            .and_then(|c| c.decimals_of(address))
        {
            return Ok(decimals);
        }

        let key = (chain_id, address.to_ascii_lowercase());
        if let Some(decimals) = self
            .decimals
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&key)
        {
            return Ok(*decimals);
        }

        let source = self.metadata.as_ref().ok_or_else(|| unknown(chain_id, address))?;
        let decimals = source
            .get_token_decimals(chain_id, &key.1)
            .await
            .map_err(|e| SwapError::Metadata(e.to_string()))?;

        debug!(chain_id = %chain_id, token = %key.1, decimals, "memoised token decimals");
        self.decimals
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, decimals);
        Ok(decimals)
    }
}

fn unknown(chain_id: ChainId, token: &str) -> SwapError {
    SwapError::UnknownToken {
        chain_id,
        token: token.to_string(),
    }
}
