use std::sync::Arc;
use swap_engine_router::CapabilityRegistry;
use swap_engine_types::{is_evm_address, is_native_token, SwapRequest};

use crate::SwapError;

/// Largest accepted slippage, 50%
pub const MAX_SLIPPAGE_BPS: u32 = 5_000;

/// Request checks that need no provider round trip
pub struct RequestValidator {
    registry: Arc<CapabilityRegistry>,
}

impl RequestValidator {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn validate(&self, request: &SwapRequest) -> Result<(), SwapError> {
        self.validate_chains(request)?;
        self.validate_parties(request)?;
        self.validate_tokens(request)?;
        self.validate_amount(request)?;
        Ok(())
    }

    fn validate_chains(&self, request: &SwapRequest) -> Result<(), SwapError> {
        for chain_id in [request.from_chain_id, request.to_chain_id] {
            if !self.registry.has_chain(chain_id) {
                return Err(SwapError::UnsupportedChain(chain_id));
            }
        }
        Ok(())
    }

    fn validate_parties(&self, request: &SwapRequest) -> Result<(), SwapError> {
        for (field, address) in [("sender", &request.sender), ("receiver", &request.receiver)] {
            if !is_evm_address(address) {
                return Err(SwapError::Validation(format!(
                    "{field} must be a 0x-prefixed 20-byte address"
                )));
            }
        }
        Ok(())
    }

    fn validate_tokens(&self, request: &SwapRequest) -> Result<(), SwapError> {
        for (field, token) in [("fromToken", &request.from_token), ("toToken", &request.to_token)] {
            if !is_native_token(token) && !is_evm_address(token) {
                return Err(SwapError::Validation(format!(
                    "{field} must be a token address or the native token"
                )));
            }
        }
        if request.is_same_chain() && request.from_token.eq_ignore_ascii_case(&request.to_token) {
            return Err(SwapError::Validation(
                "fromToken and toToken are identical on the same chain".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_amount(&self, request: &SwapRequest) -> Result<(), SwapError> {
        if request.amount.is_zero() {
            return Err(SwapError::Validation("amount must be greater than zero".to_string()));
        }
        if let Some(slippage) = request.slippage_bps {
            if slippage > MAX_SLIPPAGE_BPS {
                return Err(SwapError::Validation(format!(
                    "slippageBps must be <= {MAX_SLIPPAGE_BPS}"
                )));
            }
        }
        Ok(())
    }
}
