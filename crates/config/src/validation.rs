//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use swap_engine_types::{is_evm_address, ProviderId, ProviderKind, MAX_DECIMALS};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration, reporting every violation
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.service.log_level.trim().is_empty() {
        errors.push(ValidationError::new("service.log_level", "must not be empty"));
    }

    validate_chains(config, &mut errors);
    validate_providers(config, &mut errors);
    validate_breaker(config, &mut errors);
    validate_cache(config, &mut errors);

    if config.monitor.poll_interval_secs == 0 {
        errors.push(ValidationError::new(
            "monitor.poll_interval_secs",
            "must be greater than 0",
        ));
    }
    if config.monitor.max_attempts == 0 {
        errors.push(ValidationError::new(
            "monitor.max_attempts",
            "must be greater than 0",
        ));
    }

    let tax = config.fees.default_tax_in_percent;
    if tax < Decimal::ZERO || tax > Decimal::from(100u32) {
        errors.push(ValidationError::new(
            "fees.default_tax_in_percent",
            "must be between 0 and 100",
        ));
    }

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

fn validate_chains(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let mut seen_ids: HashMap<u64, &str> = HashMap::new();

    for (name, chain) in &config.chains {
        if chain.chain_id == 0 {
            errors.push(ValidationError::new(
                format!("chains.{name}.chain_id"),
                "must be greater than 0",
            ));
        }
        if let Some(other) = seen_ids.insert(chain.chain_id, name) {
            errors.push(ValidationError::new(
                format!("chains.{name}.chain_id"),
                format!("duplicate chain id {} (also used by '{other}')", chain.chain_id),
            ));
        }
        if chain.native_decimals > MAX_DECIMALS {
            errors.push(ValidationError::new(
                format!("chains.{name}.native_decimals"),
                format!("must be <= {MAX_DECIMALS}"),
            ));
        }

        for (symbol, token) in &chain.tokens {
            if !is_evm_address(&token.address) {
                errors.push(ValidationError::new(
                    format!("chains.{name}.tokens.{symbol}.address"),
                    "must be a 0x-prefixed 20-byte address",
                ));
            }
            if token.decimals > MAX_DECIMALS {
                errors.push(ValidationError::new(
                    format!("chains.{name}.tokens.{symbol}.decimals"),
                    format!("must be <= {MAX_DECIMALS}"),
                ));
            }
        }
    }
}

fn validate_providers(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let providers = &config.providers;
    let known_chains: HashSet<u64> = config.chains.values().map(|c| c.chain_id).collect();

    for (field, order) in [
        ("providers.same_chain_order", &providers.same_chain_order),
        ("providers.cross_chain_order", &providers.cross_chain_order),
    ] {
        if order.is_empty() {
            errors.push(ValidationError::new(field, "at least one provider is required"));
        }
        let unique: HashSet<_> = order.iter().collect();
        if unique.len() != order.len() {
            errors.push(ValidationError::new(field, "duplicate provider names found"));
        }
        for name in order {
            if name.parse::<ProviderId>().is_err() {
                errors.push(ValidationError::new(field, format!("unknown provider '{name}'")));
            }
        }
    }

    for (name, capability) in &providers.capabilities {
        let Ok(provider) = name.parse::<ProviderId>() else {
            errors.push(ValidationError::new(
                format!("providers.capabilities.{name}"),
                "unknown provider",
            ));
            continue;
        };

        let kind = capability.kind.unwrap_or_else(|| provider.default_kind());
        if kind == ProviderKind::Amm
            && providers
                .cross_chain_order
                .iter()
                .any(|n| n.eq_ignore_ascii_case(name))
        {
            errors.push(ValidationError::new(
                "providers.cross_chain_order",
                format!("'{name}' is an AMM and cannot serve cross-chain routes"),
            ));
        }

        for chain_id in &capability.chains {
            if !known_chains.contains(chain_id) {
                errors.push(ValidationError::new(
                    format!("providers.capabilities.{name}.chains"),
                    format!("chain {chain_id} not found in chains config"),
                ));
            }
        }
    }
}

fn validate_breaker(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let breaker = &config.circuit_breaker;
    for (field, value) in [
        ("circuit_breaker.failure_threshold", u64::from(breaker.failure_threshold)),
        ("circuit_breaker.monitoring_window_secs", breaker.monitoring_window_secs),
        ("circuit_breaker.timeout_secs", breaker.timeout_secs),
        ("circuit_breaker.success_threshold", u64::from(breaker.success_threshold)),
        ("circuit_breaker.half_open_max_probes", u64::from(breaker.half_open_max_probes)),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }
}

fn validate_cache(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let cache = &config.cache;

    if let Some(url) = &cache.redis_url {
        if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
            errors.push(ValidationError::new(
                "cache.redis_url",
                "must start with redis:// or rediss://",
            ));
        }
    }
    if cache.quote_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.quote_ttl_secs", "must be greater than 0"));
    }
    if cache.approval_ttl_secs == 0 {
        errors.push(ValidationError::new(
            "cache.approval_ttl_secs",
            "must be greater than 0",
        ));
    }
    if cache.reconnect_cap_ms < cache.reconnect_base_ms {
        errors.push(ValidationError::new(
            "cache.reconnect_cap_ms",
            "must be >= cache.reconnect_base_ms",
        ));
    }
}
