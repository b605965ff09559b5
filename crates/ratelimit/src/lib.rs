//! Failure isolation for calls into external swap providers
//!
//! - `CircuitBreaker`: sliding-window failure detection with timed recovery
//! - `BreakerRegistry`: one lazily-created breaker per provider name
//! - `ReconnectBackoff`: capped, bounded delay schedule for reconnect loops

pub mod backoff;
pub mod circuit_breaker;
pub mod registry;

pub use backoff::ReconnectBackoff;
pub use circuit_breaker::{
    BreakerStats, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState,
};
pub use registry::BreakerRegistry;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_registry_breakers_isolate_providers() {
        let registry = BreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        let failing = registry.get_or_create("thirdweb");
        for _ in 0..2 {
            let _ = failing.execute(|| async { Err::<(), _>("down") }).await;
        }

        let healthy = registry.get_or_create("uniswap");
        assert_eq!(failing.state(), CircuitState::Open);
        assert_eq!(healthy.state(), CircuitState::Closed);
        assert!(healthy.execute(|| async { Ok::<_, &str>(1) }).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_recovery_cycle() {
        let breaker = CircuitBreaker::new(
            "thirdweb",
            CircuitBreakerConfig {
                failure_threshold: 3,
                success_threshold: 2,
                timeout: Duration::from_secs(60),
                ..Default::default()
            },
        );
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let _ = breaker
                .execute(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("timeout")
                })
                .await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let mut backoff = ReconnectBackoff::new(
            Duration::from_secs(10),
            Duration::from_secs(30),
            10,
        );

        // Poll with backoff until the breaker lets a probe through
        let mut recovered = false;
        while let Some(delay) = backoff.next_delay() {
            tokio::time::advance(delay).await;
            let calls = calls.clone();
            let result = breaker
                .execute(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, &str>(())
                })
                .await;
            if result.is_ok() {
                recovered = true;
                break;
            }
        }

        assert!(recovered);
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.execute(|| async { Ok::<_, &str>(()) }).await.unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
