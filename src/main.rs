//! Solfolio - Position & Order Ledger for Solana wallet trading
//!
//! Tracks wallet positions with weighted-average cost accounting and
//! evaluates standing limit orders against live prices.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::{fmt, EnvFilter};

use solfolio::adapters::cli::{CheckConfigCmd, CliApp, Command, DemoCmd, RunCmd};
use solfolio::adapters::{CoinGeckoPriceFeed, InMemoryCustody, InMemoryStore, JupiterPriceFeed};
use solfolio::application::{LedgerFacade, PriceResolver, RateModel};
use solfolio::config::load_config;
use solfolio::ports::mocks::ScriptedPriceFeed;
use solfolio::ports::price_feed::PriceFeed;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Demo(cmd) => demo_command(cmd, app.verbose, app.debug).await,
        Command::CheckConfig(cmd) => check_config_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool, config_level: Option<&str>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else if let Ok(env) = EnvFilter::try_from_default_env() {
        env
    } else {
        EnvFilter::new(config_level.unwrap_or("warn"))
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    // Expand config path (handles ~ for home directory)
    let config_path = shellexpand::tilde(&cmd.config.to_string_lossy()).to_string();
    let config = load_config(&config_path).context("Failed to load configuration")?;
    init_logging(verbose, debug, Some(&config.logging.level))?;

    tracing::info!("Starting solfolio evaluation loop...");

    let timeout = Duration::from_secs(config.providers.request_timeout_secs);
    let jupiter = JupiterPriceFeed::new(timeout)
        .context("Failed to create Jupiter price feed")?
        .with_api_url(config.providers.get_jupiter_api_url());
    let coingecko = CoinGeckoPriceFeed::new(timeout)
        .context("Failed to create CoinGecko price feed")?
        .with_api_url(config.providers.coingecko_api_url.clone());
    let providers: Vec<Arc<dyn PriceFeed>> = vec![Arc::new(jupiter), Arc::new(coingecko)];

    let store = Arc::new(InMemoryStore::new());
    let custody = Arc::new(InMemoryCustody::new());
    let resolver = Arc::new(PriceResolver::new(providers, store.clone()));
    let facade = LedgerFacade::new(
        store,
        custody,
        resolver,
        config.rate_model()?,
        Duration::from_secs(config.engine.display_staleness_secs),
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.providers.poll_interval_secs));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                evaluate_pass(&facade).await?;
            }
        }
    }

    tracing::info!("solfolio stopped");
    Ok(())
}

/// One pass over every token carrying active orders. A token whose price
/// cannot be resolved is skipped until the next tick; any other failure
/// stops the loop.
async fn evaluate_pass(facade: &LedgerFacade) -> Result<()> {
    for token_id in facade.tokens_with_active_orders().await? {
        match facade.refresh_and_evaluate_token(token_id).await {
            Ok(outcome) => {
                if !outcome.triggered.is_empty() {
                    tracing::info!(
                        token_id,
                        price = %outcome.price_usd,
                        triggered = ?outcome.triggered,
                        "limit orders executed"
                    );
                }
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(token_id, error = %e, "skipping tick");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Scripted session against in-memory adapters: buy, place a limit order,
/// walk the price up through the target, sell half, print the ledger.
async fn demo_command(cmd: DemoCmd, verbose: bool, debug: bool) -> Result<()> {
    init_logging(verbose, debug, Some("info"))?;

    let balance = Decimal::from_f64(cmd.balance)
        .context("Starting balance is not representable")?;

    let script: Vec<Result<Option<Decimal>, String>> = vec![
        Ok(Some(dec!(0.15))), // buy
        Ok(Some(dec!(0.15))), // first dashboard
        Ok(Some(dec!(0.18))), // tick below target
        Ok(Some(dec!(0.22))), // tick through target
        Ok(Some(dec!(0.22))), // second dashboard
        Ok(Some(dec!(0.22))), // final dashboard
        Ok(Some(dec!(0.22))),
        Ok(Some(dec!(0.22))),
    ];
    let feed: Arc<dyn PriceFeed> = Arc::new(ScriptedPriceFeed::new("demo-feed", script));

    let store = Arc::new(InMemoryStore::new());
    let custody = Arc::new(InMemoryCustody::new());
    let wallet_id = custody.create_wallet(balance).await;
    let resolver = Arc::new(PriceResolver::new(vec![feed], store.clone()));
    let facade = LedgerFacade::new(
        store,
        custody,
        resolver,
        RateModel::default(),
        Duration::ZERO,
    );

    let mint = "DemoMint1111111111111111111111111111111111";

    println!("Wallet {wallet_id} funded with {balance} SOL");
    let buy = facade.buy(wallet_id, mint, dec!(1), None, None).await?;
    println!(
        "Bought {} tokens for {} SOL at {} SOL/token",
        buy.token_quantity, buy.amount_sol, buy.price_per_token_sol
    );
    print_dashboard(&facade, wallet_id).await?;

    let order = facade
        .create_limit_order(wallet_id, mint, dec!(0.20), dec!(0.5), true)
        .await?;
    println!(
        "Placed limit order {}: spend {} SOL when price reaches {} USD",
        order.id, order.amount_sol, order.target_price_usd
    );

    let tick = facade.refresh_and_evaluate(mint).await?;
    println!(
        "Tick at {} USD: {} order(s) triggered",
        tick.price_usd,
        tick.triggered.len()
    );
    let tick = facade.refresh_and_evaluate(mint).await?;
    println!(
        "Tick at {} USD: {} order(s) triggered",
        tick.price_usd,
        tick.triggered.len()
    );
    print_dashboard(&facade, wallet_id).await?;

    let holdings = facade.holdings_view(wallet_id).await?;
    if let Some(row) = holdings.first() {
        let half = row.holding.quantity / dec!(2);
        let sell = facade.sell(wallet_id, row.holding.id, half).await?;
        println!(
            "Sold {} tokens for {} SOL (valued at cost)",
            sell.token_quantity, sell.amount_sol
        );
    }

    println!("\nTransaction history (newest first):");
    for view in facade.transactions(wallet_id).await? {
        println!(
            "  #{} {} {} tokens for {} SOL [{}]",
            view.tx.id, view.tx.kind, view.tx.token_quantity, view.tx.amount_sol, view.tx.status
        );
    }

    print_dashboard(&facade, wallet_id).await?;
    Ok(())
}

async fn print_dashboard(facade: &LedgerFacade, wallet_id: i64) -> Result<()> {
    let dash = facade.dashboard(wallet_id).await?;
    println!(
        "Balance: {} SOL | Holdings value: {} USD",
        dash.sol_balance, dash.total_holdings_usd
    );
    for row in &dash.holdings {
        println!(
            "  {} qty {} avg cost {} SOL, value {} USD, PnL {}%",
            row.token.contract_address,
            row.holding.quantity,
            row.holding.avg_cost_sol,
            row.current_value_usd,
            row.pnl_pct.round_dp(2)
        );
    }
    Ok(())
}

async fn check_config_command(cmd: CheckConfigCmd) -> Result<()> {
    let config_path = shellexpand::tilde(&cmd.config.to_string_lossy()).to_string();
    let config = load_config(&config_path).context("Configuration invalid")?;
    let rates = config.rate_model()?;

    println!("Configuration OK: {config_path}");
    println!("  SOL/USD rate: {}", rates.sol_price_usd);
    println!("  Default tokens per SOL: {}", rates.default_tokens_per_sol);
    println!("  Jupiter API: {}", config.providers.get_jupiter_api_url());
    println!("  CoinGecko API: {}", config.providers.coingecko_api_url);
    println!("  Poll interval: {}s", config.providers.poll_interval_secs);
    println!(
        "  Display staleness: {}s",
        config.engine.display_staleness_secs
    );
    Ok(())
}
