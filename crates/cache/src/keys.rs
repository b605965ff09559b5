use sha2::{Digest, Sha256};
use swap_engine_types::{BaseUnits, ChainId};

pub const QUOTE_PREFIX: &str = "quote";
pub const APPROVAL_PREFIX: &str = "approval";

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    hex::encode(hasher.finalize())
}

/// Cache key for a quote over `(chains, token_in, token_out, amount, slippage)`
///
/// Both chain ids are hashed so a same-chain and a cross-chain route over
/// identical token addresses never share an entry.
pub fn quote_key(
    from_chain: ChainId,
    to_chain: ChainId,
    token_in: &str,
    token_out: &str,
    amount: BaseUnits,
    slippage_bps: Option<u32>,
) -> String {
    let slippage = slippage_bps.map(|s| s.to_string()).unwrap_or_default();
    let hash = digest(&[
        &from_chain.to_string(),
        &to_chain.to_string(),
        &token_in.to_ascii_lowercase(),
        &token_out.to_ascii_lowercase(),
        &amount.to_string(),
        &slippage,
    ]);
    format!("{QUOTE_PREFIX}:{hash}")
}

/// Cache key for an allowance check over `(chain, token, wallet)`
pub fn approval_key(chain: ChainId, token: &str, wallet: &str) -> String {
    let hash = digest(&[
        &chain.to_string(),
        &token.to_ascii_lowercase(),
        &wallet.to_ascii_lowercase(),
    ]);
    format!("{APPROVAL_PREFIX}:{hash}")
}
