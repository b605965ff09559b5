use crate::circuit_breaker::{BreakerStats, CircuitBreaker, CircuitBreakerConfig};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Lazily-created breakers keyed by provider name, all sharing one config
pub struct BreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let mut breakers = self
            .breakers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())))
            .clone()
    }

    /// Stats for every breaker created so far, ordered by name
    pub fn stats(&self) -> Vec<BreakerStats> {
        let breakers = self
            .breakers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut stats: Vec<_> = breakers.values().map(|b| b.stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Returns false when no breaker with that name exists
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&self) {
        let breakers = self
            .breakers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for breaker in breakers.values() {
            breaker.reset();
        }
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CircuitState;

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let registry = BreakerRegistry::default();
        let a = registry.get_or_create("uniswap");
        let b = registry.get_or_create("uniswap");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.get("thirdweb").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_sorted_and_reset() {
        let registry = BreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });
        registry.get_or_create("uniswap");
        let thirdweb = registry.get_or_create("thirdweb");
        let _ = thirdweb.execute(|| async { Err::<(), _>("down") }).await;

        let stats = registry.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "thirdweb");
        assert_eq!(stats[0].state, CircuitState::Open);
        assert_eq!(stats[1].name, "uniswap");

        assert!(registry.reset("thirdweb"));
        assert!(!registry.reset("lifi"));
        assert_eq!(thirdweb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_all() {
        let registry = BreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });
        for name in ["uniswap", "thirdweb"] {
            let breaker = registry.get_or_create(name);
            let _ = breaker.execute(|| async { Err::<(), _>("down") }).await;
        }
        registry.reset_all();
        assert!(registry.stats().iter().all(|s| s.state == CircuitState::Closed));
    }
}
