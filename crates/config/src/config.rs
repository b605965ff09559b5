//! Core configuration structures for the swap routing engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use swap_engine_types::ProviderKind;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    /// Chains by name (e.g. `ethereum`, `polygon`)
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub fees: FeeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    #[default]
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub address: String,
    pub decimals: u8,
}

/// Configuration for one EVM chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,

    /// Extra names accepted in `SYMBOL@alias` token references
    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,

    #[serde(default = "default_native_decimals")]
    pub native_decimals: u8,

    /// Known tokens by symbol
    #[serde(default)]
    pub tokens: HashMap<String, TokenConfig>,
}

/// Candidate ordering and the support matrix of each provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_same_chain_order")]
    pub same_chain_order: Vec<String>,

    #[serde(default = "default_cross_chain_order")]
    pub cross_chain_order: Vec<String>,

    /// Capability per provider name
    #[serde(default)]
    pub capabilities: HashMap<String, ProviderCapabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilityConfig {
    /// Defaults to the provider's natural kind when omitted
    #[serde(default)]
    pub kind: Option<ProviderKind>,

    pub chains: Vec<u64>,

    /// Optional allow-list of token address pairs
    #[serde(default)]
    pub pairs: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_monitoring_window_secs")]
    pub monitoring_window_secs: u64,

    #[serde(default = "default_breaker_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    #[serde(default = "default_half_open_max_probes")]
    pub half_open_max_probes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// In-memory store when absent
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,

    #[serde(default = "default_approval_ttl_secs")]
    pub approval_ttl_secs: u64,

    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,

    #[serde(default = "default_reconnect_cap_ms")]
    pub reconnect_cap_ms: u64,

    #[serde(default = "default_reconnect_max_attempts")]
    pub reconnect_max_attempts: u32,
}

impl CacheConfig {
    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }

    pub fn approval_ttl(&self) -> Duration {
        Duration::from_secs(self.approval_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_monitor_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Server-side execution of prepared bundles
    #[serde(default)]
    pub custodial_execution: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Used when no persisted protocol fee exists for a provider
    #[serde(default)]
    pub default_tax_in_percent: Decimal,
}

impl AppConfig {
    /// Ethereum, Polygon and Base with USDC, every provider enabled
    pub fn local() -> Self {
        let mut chains = HashMap::new();
        chains.insert(
            "ethereum".to_string(),
            chain(
                1,
                &["eth", "mainnet"],
                "ETH",
                &[
                    ("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6),
                    ("USDT", "0xdac17f958d2ee523a2206206994597c13d831ec7", 6),
                    ("WETH", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 18),
                ],
            ),
        );
        chains.insert(
            "polygon".to_string(),
            chain(
                137,
                &["matic"],
                "POL",
                &[("USDC", "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359", 6)],
            ),
        );
        chains.insert(
            "base".to_string(),
            chain(
                8453,
                &[],
                "ETH",
                &[("USDC", "0x833589fcd6edb6e08f4c3c32d4f71b54bda02913", 6)],
            ),
        );

        let all_chains = vec![1, 137, 8453];
        let mut capabilities = HashMap::new();
        for (name, kind) in [
            ("uniswap", ProviderKind::Amm),
            ("thirdweb", ProviderKind::Bridge),
            ("lifi", ProviderKind::Bridge),
        ] {
            capabilities.insert(
                name.to_string(),
                ProviderCapabilityConfig {
                    kind: Some(kind),
                    chains: all_chains.clone(),
                    pairs: Vec::new(),
                },
            );
        }

        Self {
            chains,
            providers: ProvidersConfig {
                capabilities,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn chain(chain_id: u64, aliases: &[&str], native: &str, tokens: &[(&str, &str, u8)]) -> ChainConfig {
    ChainConfig {
        chain_id,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        native_symbol: native.to_string(),
        native_decimals: 18,
        tokens: tokens
            .iter()
            .map(|(symbol, address, decimals)| {
                (
                    symbol.to_string(),
                    TokenConfig {
                        address: address.to_string(),
                        decimals: *decimals,
                    },
                )
            })
            .collect(),
    }
}

// Default value functions
fn default_log_level() -> String {
    "info,swap_engine=debug".to_string()
}

fn default_true() -> bool {
    true
}

fn default_native_symbol() -> String {
    "ETH".to_string()
}

fn default_native_decimals() -> u8 {
    18
}

fn default_same_chain_order() -> Vec<String> {
    vec!["uniswap".to_string(), "thirdweb".to_string()]
}

fn default_cross_chain_order() -> Vec<String> {
    vec!["thirdweb".to_string()]
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_monitoring_window_secs() -> u64 {
    120
}

fn default_breaker_timeout_secs() -> u64 {
    60
}

fn default_success_threshold() -> u32 {
    2
}

fn default_half_open_max_probes() -> u32 {
    1
}

fn default_quote_ttl_secs() -> u64 {
    30
}

fn default_approval_ttl_secs() -> u64 {
    300
}

fn default_reconnect_base_ms() -> u64 {
    100
}

fn default_reconnect_cap_ms() -> u64 {
    3000
}

fn default_reconnect_max_attempts() -> u32 {
    10
}

fn default_poll_interval_secs() -> u64 {
    4
}

fn default_monitor_max_attempts() -> u32 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            same_chain_order: default_same_chain_order(),
            cross_chain_order: default_cross_chain_order(),
            capabilities: HashMap::new(),
        }
    }
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            monitoring_window_secs: default_monitoring_window_secs(),
            timeout_secs: default_breaker_timeout_secs(),
            success_threshold: default_success_threshold(),
            half_open_max_probes: default_half_open_max_probes(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            quote_ttl_secs: default_quote_ttl_secs(),
            approval_ttl_secs: default_approval_ttl_secs(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_cap_ms: default_reconnect_cap_ms(),
            reconnect_max_attempts: default_reconnect_max_attempts(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_attempts: default_monitor_max_attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.providers.same_chain_order, vec!["uniswap", "thirdweb"]);
        assert_eq!(config.providers.cross_chain_order, vec!["thirdweb"]);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.monitoring_window_secs, 120);
        assert_eq!(config.circuit_breaker.timeout_secs, 60);
        assert_eq!(config.cache.quote_ttl(), Duration::from_secs(30));
        assert_eq!(config.cache.approval_ttl(), Duration::from_secs(300));
        assert_eq!(config.monitor.poll_interval_secs, 4);
        assert_eq!(config.monitor.max_attempts, 30);
        assert!(!config.features.custodial_execution);
        assert_eq!(config.fees.default_tax_in_percent, Decimal::ZERO);
    }

    #[test]
    fn test_local_preset() {
        let config = AppConfig::local();
        assert_eq!(config.chains.len(), 3);
        assert_eq!(config.chains["polygon"].chain_id, 137);
        assert_eq!(config.chains["ethereum"].tokens["USDC"].decimals, 6);
        assert_eq!(
            config.providers.capabilities["uniswap"].kind,
            Some(ProviderKind::Amm)
        );
    }
}
