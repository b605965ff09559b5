//! Swap engine simulator
//!
//! Builds the engine from a config file (or the local preset) with
//! in-process providers, runs one quote and prepare, and prints the results
//! followed by the metrics exposition.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use swap_engine::config::{AppConfig, ConfigLoader, ENV_PREFIX};
use swap_engine::metrics::{init_tracing, MetricsCollector};
use swap_engine::router::MockSwapProvider;
use swap_engine::types::{ChainId, ProviderId};
use swap_engine::{QuoteParams, SwapEngine};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML, YAML or JSON); the local preset when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "1")]
    from_chain: u64,

    #[arg(long, default_value = "1")]
    to_chain: u64,

    #[arg(long, default_value = "native")]
    from_token: String,

    #[arg(long, default_value = "USDC")]
    to_token: String,

    /// Human-readable amount of the input token
    #[arg(long, default_value = "0.01")]
    amount: String,

    #[arg(long, default_value = "0x1111111111111111111111111111111111111111")]
    sender: String,

    /// Make this provider fail every call
    #[arg(long)]
    fail: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::from_file_with_env(path, ENV_PREFIX)?,
        None => AppConfig::local(),
    };
    init_tracing(&config.service.log_level)?;
    info!(environment = ?config.service.environment, "starting swap engine simulator");

    let mut builder = SwapEngine::builder().with_config(config);
    for id in ProviderId::ALL {
        let provider = Arc::new(MockSwapProvider::new(id));
        if args.fail.iter().any(|f| f.eq_ignore_ascii_case(id.as_str())) {
            warn!(provider = %id, "provider forced to fail");
            provider.fail_always();
        }
        builder = builder.with_provider(provider);
    }
    let engine = builder.build_async().await?;

    let params = QuoteParams {
        from_chain_id: ChainId(args.from_chain),
        to_chain_id: ChainId(args.to_chain),
        from_token: args.from_token,
        to_token: args.to_token,
        amount: args.amount,
        sender: args.sender,
        receiver: None,
        slippage_bps: None,
    };

    let quote = engine.selector().get_quote(&params).await?;
    println!("{}", serde_json::to_string_pretty(&quote)?);

    let prepared = engine
        .selector()
        .prepare_swap_pinned(&params, quote.provider)
        .await?;
    println!("{}", serde_json::to_string_pretty(&prepared)?);

    println!("{}", serde_json::to_string_pretty(&engine.breaker_stats())?);
    println!("{}", MetricsCollector::new().gather_text()?);
    Ok(())
}
