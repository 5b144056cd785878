//! End-to-end tests for the position ledger
//!
//! Drives the facade the way a transport layer would: in-memory store and
//! custody, mock price feeds, real resolver/ledger/order-book wiring.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use solfolio::adapters::{InMemoryCustody, InMemoryStore};
use solfolio::application::{LedgerFacade, PriceResolver, RateModel};
use solfolio::domain::{LedgerError, TxKind, TxStatus};
use solfolio::ports::custody::WalletCustody;
use solfolio::ports::mocks::{ScriptedPriceFeed, StaticPriceFeed};
use solfolio::ports::price_feed::PriceFeed;

struct Harness {
    custody: Arc<InMemoryCustody>,
    facade: Arc<LedgerFacade>,
    wallet_id: i64,
}

async fn harness(balance: Decimal, feed: Arc<dyn PriceFeed>) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let custody = Arc::new(InMemoryCustody::new());
    let wallet_id = custody.create_wallet(balance).await;
    let resolver = Arc::new(PriceResolver::new(vec![feed], store.clone()));
    let facade = Arc::new(LedgerFacade::new(
        store,
        custody.clone(),
        resolver,
        RateModel::default(),
        Duration::ZERO,
    ));
    Harness {
        custody,
        facade,
        wallet_id,
    }
}

const MINT: &str = "J1mDotMintAddressForTests11111111111111111";

#[tokio::test]
async fn weighted_average_across_price_moves() {
    // SOL at 150 USD. Token at 0.15 USD: 1 SOL buys 1000 tokens at
    // 0.001 SOL each. Token doubles to 0.30: 1 SOL buys 500 at 0.002.
    let feed = Arc::new(ScriptedPriceFeed::new(
        "feed",
        vec![Ok(Some(dec!(0.15))), Ok(Some(dec!(0.30)))],
    ));
    let h = harness(dec!(10), feed).await;

    h.facade
        .buy(h.wallet_id, MINT, dec!(1), None, None)
        .await
        .unwrap();
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(9));

    h.facade
        .buy(h.wallet_id, MINT, dec!(1), None, None)
        .await
        .unwrap();
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(8));

    let holdings = h.facade.holdings_view(h.wallet_id).await.unwrap();
    assert_eq!(holdings.len(), 1);
    let holding = &holdings[0].holding;
    assert_eq!(holding.quantity, dec!(1500));
    // avg = (1000*0.001 + 500*0.002) / 1500 = 2/1500
    let expected = dec!(2) / dec!(1500);
    assert!((holding.avg_cost_sol - expected).abs() < dec!(0.0000000001));
    // Both legs priced in USD: basis accumulates 150 + 150
    assert_eq!(holding.cost_basis_usd, Some(dec!(300)));
}

#[tokio::test]
async fn sell_all_at_cost_restores_starting_balance() {
    let feed = Arc::new(StaticPriceFeed::new("feed", Some(dec!(0.15))));
    let h = harness(dec!(10), feed).await;

    h.facade
        .buy(h.wallet_id, MINT, dec!(3), None, None)
        .await
        .unwrap();
    let holdings = h.facade.holdings_view(h.wallet_id).await.unwrap();
    let holding_id = holdings[0].holding.id;
    let quantity = holdings[0].holding.quantity;

    h.facade
        .sell(h.wallet_id, holding_id, quantity / dec!(3))
        .await
        .unwrap();
    h.facade
        .sell(h.wallet_id, holding_id, quantity * dec!(2) / dec!(3))
        .await
        .unwrap();

    // Holding emptied out, deleted, and the SOL came back in full
    assert!(h.facade.holdings_view(h.wallet_id).await.unwrap().is_empty());
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(10));

    // Selling against the deleted holding now fails cleanly
    let err = h
        .facade
        .sell(h.wallet_id, holding_id, dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::HoldingNotFound(_)));
}

#[tokio::test]
async fn limit_order_lifecycle_is_deterministic() {
    // Price walks 1.50 -> 1.99 -> 2.00 -> 3.00; target is exactly 2.00
    let feed = Arc::new(ScriptedPriceFeed::new(
        "feed",
        vec![
            Ok(Some(dec!(1.50))),
            Ok(Some(dec!(1.99))),
            Ok(Some(dec!(2.00))),
            Ok(Some(dec!(3.00))),
        ],
    ));
    let h = harness(dec!(10), feed).await;

    let order = h
        .facade
        .create_limit_order(h.wallet_id, MINT, dec!(2.00), dec!(0.5), true)
        .await
        .unwrap();

    let tick = h.facade.refresh_and_evaluate(MINT).await.unwrap();
    assert!(tick.triggered.is_empty());
    let tick = h.facade.refresh_and_evaluate(MINT).await.unwrap();
    assert!(tick.triggered.is_empty());

    // Exactly at target: triggers
    let tick = h.facade.refresh_and_evaluate(MINT).await.unwrap();
    assert_eq!(tick.triggered, vec![order.id]);
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(9.5));

    // Past target on the next tick: nothing left to trigger
    let tick = h.facade.refresh_and_evaluate(MINT).await.unwrap();
    assert!(tick.triggered.is_empty());
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(9.5));

    let listings = h.facade.limit_orders(h.wallet_id).await.unwrap();
    assert!(!listings[0].order.is_active);
    assert!(listings[0].order.executed_at.is_some());
}

#[tokio::test]
async fn underfunded_order_survives_and_retries() {
    let feed = Arc::new(StaticPriceFeed::new("feed", Some(dec!(2.50))));
    let h = harness(dec!(0.1), feed).await;

    let order = h
        .facade
        .create_limit_order(h.wallet_id, MINT, dec!(2.00), dec!(0.5), true)
        .await
        .unwrap();

    // Reached but the wallet cannot fund the buy
    let tick = h.facade.refresh_and_evaluate(MINT).await.unwrap();
    assert_eq!(tick.reached, vec![order.id]);
    assert!(tick.triggered.is_empty());
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(0.1));

    // Fund the wallet; the same order executes on the next tick
    h.custody.credit(h.wallet_id, dec!(1)).await.unwrap();
    let tick = h.facade.refresh_and_evaluate(MINT).await.unwrap();
    assert_eq!(tick.triggered, vec![order.id]);
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(0.6));
}

#[tokio::test]
async fn concurrent_buys_never_overspend() {
    let feed = Arc::new(StaticPriceFeed::new("feed", Some(dec!(0.15))));
    let h = harness(dec!(1), feed).await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let facade = h.facade.clone();
        let wallet_id = h.wallet_id;
        handles.push(tokio::spawn(async move {
            facade.buy(wallet_id, MINT, dec!(0.4), None, None).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    // 1 SOL funds at most two 0.4 SOL buys
    assert_eq!(successes, 2);
    assert_eq!(h.custody.balance(h.wallet_id).await.unwrap(), dec!(0.2));
}

#[tokio::test]
async fn wallets_are_isolated() {
    let feed = Arc::new(StaticPriceFeed::new("feed", Some(dec!(0.15))));
    let h = harness(dec!(10), feed).await;
    let other = h.custody.create_wallet(dec!(10)).await;

    h.facade
        .buy(h.wallet_id, MINT, dec!(1), None, None)
        .await
        .unwrap();
    h.facade.buy(other, MINT, dec!(2), None, None).await.unwrap();

    let mine = h.facade.holdings_view(h.wallet_id).await.unwrap();
    let theirs = h.facade.holdings_view(other).await.unwrap();
    assert_eq!(mine[0].holding.quantity, dec!(1000));
    assert_eq!(theirs[0].holding.quantity, dec!(2000));

    assert_eq!(h.facade.transactions(h.wallet_id).await.unwrap().len(), 1);
    assert_eq!(h.facade.transactions(other).await.unwrap().len(), 1);
}

#[tokio::test]
async fn transaction_history_records_both_sides() {
    let feed = Arc::new(StaticPriceFeed::new("feed", Some(dec!(0.15))));
    let h = harness(dec!(10), feed).await;

    h.facade
        .buy(h.wallet_id, MINT, dec!(1), None, None)
        .await
        .unwrap();
    let holdings = h.facade.holdings_view(h.wallet_id).await.unwrap();
    h.facade
        .sell(h.wallet_id, holdings[0].holding.id, dec!(250))
        .await
        .unwrap();

    let history = h.facade.transactions(h.wallet_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].tx.kind, TxKind::Sell);
    assert_eq!(history[0].tx.status, TxStatus::Pending);
    assert_eq!(history[1].tx.kind, TxKind::Buy);
    assert_eq!(history[1].tx.status, TxStatus::Completed);
    assert_eq!(history[0].token.contract_address, MINT);
}

#[tokio::test]
async fn pnl_tracks_price_moves() {
    let feed = Arc::new(ScriptedPriceFeed::new(
        "feed",
        vec![
            Ok(Some(dec!(0.15))), // buy refresh
            Ok(Some(dec!(0.15))), // first view
            Ok(Some(dec!(0.30))), // doubled
            Ok(Some(dec!(0.075))), // halved from entry
        ],
    ));
    let h = harness(dec!(10), feed).await;

    h.facade
        .buy(h.wallet_id, MINT, dec!(1), None, None)
        .await
        .unwrap();

    let view = h.facade.holdings_view(h.wallet_id).await.unwrap();
    assert_eq!(view[0].pnl_pct, Decimal::ZERO);

    let view = h.facade.holdings_view(h.wallet_id).await.unwrap();
    assert_eq!(view[0].pnl_pct, dec!(100));

    let view = h.facade.holdings_view(h.wallet_id).await.unwrap();
    assert_eq!(view[0].pnl_pct, dec!(-50));
}
