use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbolic token identifier for a chain's native gas token
pub const NATIVE_TOKEN: &str = "native";

/// Canonical pseudo-address used by EVM providers for the native token
pub const NATIVE_PSEUDO_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// EVM chain identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ChainId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ChainId)
    }
}

/// Returns true if the identifier names the native token, either symbolically
/// or by its pseudo-address
pub fn is_native_token(token: &str) -> bool {
    token.eq_ignore_ascii_case(NATIVE_TOKEN) || token.eq_ignore_ascii_case(NATIVE_PSEUDO_ADDRESS)
}

/// Returns true for a `0x`-prefixed, 20-byte hex address
pub fn is_evm_address(value: &str) -> bool {
    value.len() == 42
        && (value.starts_with("0x") || value.starts_with("0X"))
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_detection() {
        assert!(is_native_token("native"));
        assert!(is_native_token("NATIVE"));
        assert!(is_native_token("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"));
        assert!(!is_native_token("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
    }

    #[test]
    fn test_evm_address_shape() {
        assert!(is_evm_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
        assert!(!is_evm_address("0xa0b8"));
        assert!(!is_evm_address("USDC"));
        assert!(!is_evm_address("0xz0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
    }

    #[test]
    fn test_chain_id_parse() {
        assert_eq!("137".parse::<ChainId>().unwrap(), ChainId(137));
        assert!("polygon".parse::<ChainId>().is_err());
    }
}
