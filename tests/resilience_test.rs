use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_engine::config::AppConfig;
use swap_engine::ratelimit::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
use swap_engine::router::{FailureReason, MockSwapProvider, RouteError};
use swap_engine::types::{ChainId, ProviderId, SwapRequest};
use swap_engine::{QuoteParams, SwapEngine, SwapError};

const WALLET: &str = "0x1111111111111111111111111111111111111111";

struct Harness {
    engine: SwapEngine,
    uniswap: Arc<MockSwapProvider>,
    thirdweb: Arc<MockSwapProvider>,
}

fn harness() -> Harness {
    let uniswap = Arc::new(MockSwapProvider::new(ProviderId::Uniswap));
    let thirdweb = Arc::new(MockSwapProvider::new(ProviderId::Thirdweb));
    let engine = SwapEngine::builder()
        .with_config(AppConfig::local())
        .with_provider(uniswap.clone())
        .with_provider(thirdweb.clone())
        .build()
        .unwrap();
    Harness {
        engine,
        uniswap,
        thirdweb,
    }
}

async fn same_chain_request(engine: &SwapEngine) -> SwapRequest {
    let params = QuoteParams {
        from_chain_id: ChainId(1),
        to_chain_id: ChainId(1),
        from_token: "native".to_string(),
        to_token: "USDC".to_string(),
        amount: "0.01".to_string(),
        sender: WALLET.to_string(),
        receiver: None,
        slippage_bps: None,
    };
    let (request, _, _) = engine.selector().build_request(&params).await.unwrap();
    request
}

#[tokio::test]
async fn test_sixth_call_fails_fast_without_invoking_operation() {
    let breaker = CircuitBreaker::new("uniswap", CircuitBreakerConfig::default());
    let calls = Arc::new(AtomicU32::new(0));

    for _ in 0..5 {
        let calls = calls.clone();
        let result: Result<(), _> = breaker
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("upstream 503")
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::Operation(_))));
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    let counter = calls.clone();
    let sixth = breaker
        .execute(|| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), &str>(())
        })
        .await;

    assert!(matches!(sixth, Err(CircuitBreakerError::Open { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn test_router_skips_open_provider_then_recovers() {
    let h = harness();
    let service = h.engine.service();
    let request = same_chain_request(&h.engine).await;
    h.uniswap.fail_always();

    for _ in 0..5 {
        let quote = service.get_quote(&request).await.unwrap();
        assert_eq!(quote.provider, ProviderId::Thirdweb);
    }
    assert_eq!(h.uniswap.quote_calls(), 5);

    // Breaker is open: uniswap is skipped without being called.
    let quote = service.get_quote(&request).await.unwrap();
    assert_eq!(quote.provider, ProviderId::Thirdweb);
    assert_eq!(h.uniswap.quote_calls(), 5);

    h.uniswap.recover();
    tokio::time::advance(Duration::from_secs(61)).await;

    // First probe after the cooldown goes through and succeeds.
    let quote = service.get_quote(&request).await.unwrap();
    assert_eq!(quote.provider, ProviderId::Uniswap);
    let breaker = h.engine.breakers().get("uniswap").unwrap();
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    service.get_quote(&request).await.unwrap();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(h.uniswap.quote_calls(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_failure_reopens_with_fresh_cooldown() {
    let h = harness();
    let service = h.engine.service();
    let request = same_chain_request(&h.engine).await;
    h.uniswap.fail_always();

    for _ in 0..5 {
        service.get_quote(&request).await.unwrap();
    }
    tokio::time::advance(Duration::from_secs(60)).await;

    // Probe fails; circuit reopens for a full timeout.
    service.get_quote(&request).await.unwrap();
    assert_eq!(h.uniswap.quote_calls(), 6);

    let stats = h.engine.breakers().get("uniswap").unwrap().stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.retry_in_ms, Some(60_000));

    tokio::time::advance(Duration::from_secs(30)).await;
    service.get_quote(&request).await.unwrap();
    assert_eq!(h.uniswap.quote_calls(), 6);
}

#[tokio::test]
async fn test_open_breakers_are_reported_distinctly() {
    let h = harness();
    let service = h.engine.service();
    let request = same_chain_request(&h.engine).await;
    h.uniswap.fail_always();
    h.thirdweb.fail_always();

    for _ in 0..5 {
        service.get_quote(&request).await.unwrap_err();
    }

    let err = service.get_quote(&request).await.unwrap_err();
    let SwapError::Route(RouteError::Exhausted { attempts }) = err else {
        panic!("expected exhausted route");
    };
    assert_eq!(attempts.len(), 2);
    assert!(attempts
        .iter()
        .all(|a| matches!(a.reason, FailureReason::CircuitOpen { .. })));
    assert_eq!(h.uniswap.quote_calls(), 5);
    assert_eq!(h.thirdweb.quote_calls(), 5);
}

#[tokio::test]
async fn test_operator_reset_closes_breaker() {
    let h = harness();
    let service = h.engine.service();
    let request = same_chain_request(&h.engine).await;
    h.uniswap.fail_next(5);

    for _ in 0..5 {
        service.get_quote(&request).await.unwrap();
    }
    let stats = h.engine.breaker_stats();
    let uniswap = stats.iter().find(|s| s.name == "uniswap").unwrap();
    assert_eq!(uniswap.state, CircuitState::Open);

    assert!(h.engine.breakers().reset("uniswap"));
    let quote = service.get_quote(&request).await.unwrap();
    assert_eq!(quote.provider, ProviderId::Uniswap);
}
