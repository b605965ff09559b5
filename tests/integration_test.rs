use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use swap_engine::cache::InMemoryCacheStore;
use swap_engine::config::{AppConfig, ConfigLoader};
use swap_engine::router::{MockSpotPriceSource, MockSwapProvider};
use swap_engine::service::{ExecutionOptions, MockOriginTxExecutor};
use swap_engine::types::{
    format_units, parse_units, BaseUnits, ChainId, ProviderId, TransactionStatus,
    NATIVE_PSEUDO_ADDRESS,
};
use swap_engine::{QuoteParams, SwapEngine, SwapError};

const WALLET: &str = "0x1111111111111111111111111111111111111111";
const USDC_ETH: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
const USDC_POLYGON: &str = "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359";

// ═══════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════

struct Harness {
    engine: SwapEngine,
    uniswap: Arc<MockSwapProvider>,
    thirdweb: Arc<MockSwapProvider>,
    cache_store: Arc<InMemoryCacheStore>,
    executor: Arc<MockOriginTxExecutor>,
}

fn harness(config: AppConfig) -> Harness {
    let uniswap = Arc::new(MockSwapProvider::new(ProviderId::Uniswap));
    let thirdweb = Arc::new(MockSwapProvider::new(ProviderId::Thirdweb));
    let lifi = Arc::new(MockSwapProvider::new(ProviderId::LiFi));
    let cache_store = Arc::new(InMemoryCacheStore::new());
    let executor = Arc::new(MockOriginTxExecutor::new());

    let engine = SwapEngine::builder()
        .with_config(config)
        .with_provider(uniswap.clone())
        .with_provider(thirdweb.clone())
        .with_provider(lifi)
        .with_cache_store(cache_store.clone())
        .with_executor(executor.clone())
        .build()
        .unwrap();

    Harness {
        engine,
        uniswap,
        thirdweb,
        cache_store,
        executor,
    }
}

fn params(from: (u64, &str), to: (u64, &str), amount: &str) -> QuoteParams {
    QuoteParams {
        from_chain_id: ChainId(from.0),
        to_chain_id: ChainId(to.0),
        from_token: from.1.to_string(),
        to_token: to.1.to_string(),
        amount: amount.to_string(),
        sender: WALLET.to_string(),
        receiver: None,
        slippage_bps: None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUTING SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_native_to_usdc_on_ethereum_routes_to_uniswap() {
    let h = harness(AppConfig::local());

    let quote = h
        .engine
        .selector()
        .get_quote(&params((1, "native"), (1, "USDC"), "0.01"))
        .await
        .unwrap();

    assert_eq!(quote.provider, ProviderId::Uniswap);
    assert_eq!(quote.request.from_token, NATIVE_PSEUDO_ADDRESS);
    assert_eq!(quote.request.amount, BaseUnits::from_u128(10_000_000_000_000_000));
    assert_eq!(h.thirdweb.quote_calls(), 0);
}

#[tokio::test]
async fn test_usdc_ethereum_to_polygon_routes_to_thirdweb() {
    let h = harness(AppConfig::local());

    let quote = h
        .engine
        .selector()
        .get_quote(&params((1, "USDC@eth"), (137, "USDC@polygon"), "10"))
        .await
        .unwrap();

    assert_eq!(quote.provider, ProviderId::Thirdweb);
    assert_eq!(quote.request.from_token, USDC_ETH);
    assert_eq!(quote.request.to_token, USDC_POLYGON);
    assert_eq!(quote.request.amount, BaseUnits::from_u128(10_000_000));
    // 5 bips bridge fee on 10 USDC
    assert_eq!(quote.quote.bridge_fee, BaseUnits::from_u128(5_000));
    assert_eq!(h.uniswap.quote_calls(), 0);
}

#[tokio::test]
async fn test_every_candidate_failing_is_one_aggregated_error() {
    let h = harness(AppConfig::local());
    h.uniswap.fail_always();
    h.thirdweb.fail_always();

    let err = h
        .engine
        .selector()
        .get_quote(&params((1, "native"), (1, "USDC"), "1"))
        .await
        .unwrap_err();

    let SwapError::Route(route) = &err else {
        panic!("expected a route error, got {err:?}");
    };
    assert_eq!(
        route.attempted_providers(),
        vec![ProviderId::Uniswap, ProviderId::Thirdweb]
    );
    let message = err.to_string();
    assert!(message.contains("uniswap"));
    assert!(message.contains("thirdweb"));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_cross_chain_route_nobody_supports() {
    let h = harness(AppConfig::local());
    h.thirdweb.set_supported(false);

    let err = h
        .engine
        .selector()
        .get_quote(&params((1, "USDC"), (8453, "USDC"), "10"))
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert_eq!(h.uniswap.quote_calls(), 0);
}

#[tokio::test]
async fn test_unknown_chain_is_rejected_before_routing() {
    let h = harness(AppConfig::local());

    let err = h
        .engine
        .selector()
        .get_quote(&params((1, "native"), (56, "native"), "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::UnsupportedChain(ChainId(56))));
    assert_eq!(h.uniswap.quote_calls() + h.thirdweb.quote_calls(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_quote_cache_expires_after_ttl() {
    let h = harness(AppConfig::local());
    let p = params((1, "native"), (1, "USDC"), "0.5");

    let first = h.engine.selector().get_quote(&p).await.unwrap();
    let cached = h.engine.selector().get_quote(&p).await.unwrap();
    assert!(cached.cached);
    assert_eq!(cached.quote, first.quote);
    assert_eq!(h.uniswap.quote_calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;

    let fresh = h.engine.selector().get_quote(&p).await.unwrap();
    assert!(!fresh.cached);
    assert_eq!(h.uniswap.quote_calls(), 2);
}

#[tokio::test]
async fn test_cache_outage_degrades_silently() {
    let h = harness(AppConfig::local());
    h.cache_store.set_available(false);
    let p = params((1, "native"), (1, "USDC"), "0.5");

    for _ in 0..3 {
        let quote = h.engine.selector().get_quote(&p).await.unwrap();
        assert!(!quote.cached);
    }
    assert_eq!(h.uniswap.quote_calls(), 3);

    h.cache_store.set_available(true);
    h.engine.selector().get_quote(&p).await.unwrap();
    assert!(h.engine.selector().get_quote(&p).await.unwrap().cached);
}

// ═══════════════════════════════════════════════════════════════════════════
// CUSTODIAL EXECUTION AND MONITORING
// ═══════════════════════════════════════════════════════════════════════════

fn custodial_config() -> AppConfig {
    let mut config = AppConfig::local();
    config.features.custodial_execution = true;
    config
}

#[tokio::test(start_paused = true)]
async fn test_execute_then_monitor_to_completion() {
    let h = harness(custodial_config());
    let selector = h.engine.selector();
    let (request, _, _) = selector
        .build_request(&params((1, "USDC"), (137, "USDC@matic"), "250"))
        .await
        .unwrap();

    let executed = h
        .engine
        .service()
        .execute_swap(&request, &ExecutionOptions::default())
        .await
        .unwrap();
    assert_eq!(executed.transaction_hashes.len(), 2);
    assert_eq!(executed.estimated_duration, 120);
    assert_eq!(h.executor.executed(), 2);

    h.thirdweb.script_statuses(vec![
        Ok(TransactionStatus::NotFound),
        Ok(TransactionStatus::Pending),
        Ok(TransactionStatus::Completed),
    ]);

    let started = tokio::time::Instant::now();
    let status = h
        .engine
        .service()
        .monitor_status(&executed.transaction_hashes[1], ChainId(1))
        .await
        .unwrap();

    assert_eq!(status, TransactionStatus::Completed);
    assert_eq!(started.elapsed(), Duration::from_secs(12));

    let history = h.engine.service().get_swap_history(WALLET).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].provider, ProviderId::Thirdweb);
}

#[tokio::test(start_paused = true)]
async fn test_failed_transaction_raises_on_first_poll() {
    let h = harness(AppConfig::local());
    h.thirdweb.script_statuses(vec![Ok(TransactionStatus::Failed)]);

    let err = h
        .engine
        .service()
        .monitor_status("0xdeadbeef", ChainId(137))
        .await
        .unwrap_err();

    assert!(matches!(err, SwapError::TransactionFailed { .. }));
    assert_eq!(h.thirdweb.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unsettled_transaction_returns_last_status() {
    let h = harness(AppConfig::local());

    let started = tokio::time::Instant::now();
    let status = h
        .engine
        .service()
        .monitor_status("0xbeef", ChainId(1))
        .await
        .unwrap();

    assert_eq!(status, TransactionStatus::Pending);
    assert_eq!(h.thirdweb.status_calls(), 30);
    assert_eq!(started.elapsed(), Duration::from_secs(120));
}

#[tokio::test]
async fn test_custodial_path_disabled_by_default() {
    let h = harness(AppConfig::local());
    let (request, _, _) = h
        .engine
        .selector()
        .build_request(&params((1, "native"), (1, "USDC"), "1"))
        .await
        .unwrap();

    let err = h
        .engine
        .service()
        .execute_swap(&request, &ExecutionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SwapError::CustodialDisabled));
}

// ═══════════════════════════════════════════════════════════════════════════
// AMOUNTS, PRICING AND CONFIG
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_decimal_strings_round_trip_through_base_units() {
    for (input, decimals, canonical) in [
        ("0.01", 18, "0.01"),
        ("10", 6, "10"),
        ("10.500000", 6, "10.5"),
        ("000123.4500", 8, "123.45"),
        (".5", 1, "0.5"),
        ("115792089237316195423570985008687907853269984665640564039457", 18, "115792089237316195423570985008687907853269984665640564039457"),
    ] {
        let units = parse_units(input, decimals).unwrap();
        assert_eq!(format_units(units, decimals).unwrap(), canonical, "{input}");
    }

    for bad in ["1,000", "1e18", "0x10", "1.2.3", " ", "-0.1"] {
        assert!(parse_units(bad, 18).is_err(), "{bad}");
    }
}

#[tokio::test]
async fn test_usd_enrichment_from_spot_prices() {
    let prices = Arc::new(MockSpotPriceSource::new());
    prices.set_price(ChainId(1), USDC_ETH, Decimal::ONE);
    prices.set_price(ChainId(137), USDC_POLYGON, Decimal::from_str("0.9998").unwrap());

    let engine = SwapEngine::builder()
        .with_config(AppConfig::local())
        .with_provider(Arc::new(MockSwapProvider::new(ProviderId::Uniswap)))
        .with_provider(Arc::new(MockSwapProvider::new(ProviderId::Thirdweb)))
        .with_price_source(prices)
        .build()
        .unwrap();

    let quote = engine
        .selector()
        .get_quote(&params((1, "USDC"), (137, "USDC@polygon"), "100"))
        .await
        .unwrap();

    assert_eq!(quote.from_amount_usd, Some(Decimal::from(100)));
    assert_eq!(quote.to_amount_usd, Some(Decimal::from_str("99.98").unwrap()));
    // 5 bips bridge fee (0.05 USDC) plus 21000 base units of gas (0.021 USDC)
    assert_eq!(quote.total_fee_usd, Some(Decimal::from_str("0.071").unwrap()));
}

#[tokio::test]
async fn test_engine_from_toml_config() {
    let config = ConfigLoader::from_toml(
        r#"
        [service]
        environment = "local"

        [chains.ethereum]
        chain_id = 1
        aliases = ["eth"]

        [chains.ethereum.tokens.USDC]
        address = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        decimals = 6

        [chains.polygon]
        chain_id = 137
        native_symbol = "POL"

        [chains.polygon.tokens.USDC]
        address = "0x3c499c542cef5e3811e1192ce70d8cc03d5c3359"
        decimals = 6

        [providers]
        cross_chain_order = ["lifi", "thirdweb"]

        [providers.capabilities.uniswap]
        chains = [1, 137]

        [providers.capabilities.thirdweb]
        chains = [1, 137]

        [providers.capabilities.lifi]
        chains = [1, 137]

        [circuit_breaker]
        failure_threshold = 3
        "#,
    )
    .unwrap();

    let lifi = Arc::new(MockSwapProvider::new(ProviderId::LiFi));
    let engine = SwapEngine::builder()
        .with_config(config)
        .with_provider(Arc::new(MockSwapProvider::new(ProviderId::Uniswap)))
        .with_provider(Arc::new(MockSwapProvider::new(ProviderId::Thirdweb)))
        .with_provider(lifi.clone())
        .build()
        .unwrap();

    assert_eq!(engine.breakers().config().failure_threshold, 3);

    let quote = engine
        .selector()
        .get_quote(&params((1, "USDC@eth"), (137, "USDC@polygon"), "10"))
        .await
        .unwrap();
    assert_eq!(quote.provider, ProviderId::LiFi);
    assert_eq!(lifi.quote_calls(), 1);
}
