//! Mock port implementations for tests
//!
//! Hand-rolled mocks that record calls and allow controlled responses.
//! Used by unit tests across the application layer and by the integration
//! suite; kept out of `#[cfg(test)]` so the `demo` command can reuse them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{
    Holding, LedgerError, LedgerResult, LimitOrder, Settings, Token, Transaction,
};
use crate::ports::price_feed::{PriceFeed, PriceFeedError};
use crate::ports::store::LedgerStore;

/// Price feed that always returns the same price.
pub struct StaticPriceFeed {
    name: String,
    price: Option<Decimal>,
    calls: AtomicUsize,
}

impl StaticPriceFeed {
    pub fn new(name: &str, price: Option<Decimal>) -> Self {
        Self {
            name: name.to_string(),
            price,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for StaticPriceFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_fetch(&self, _contract_address: &str) -> Result<Option<Decimal>, PriceFeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.price)
    }
}

/// Price feed that pops one scripted response per call, then fails.
pub struct ScriptedPriceFeed {
    name: String,
    responses: Mutex<Vec<Result<Option<Decimal>, String>>>,
}

impl ScriptedPriceFeed {
    pub fn new(name: &str, responses: Vec<Result<Option<Decimal>, String>>) -> Self {
        let mut reversed = responses;
        reversed.reverse();
        Self {
            name: name.to_string(),
            responses: Mutex::new(reversed),
        }
    }
}

#[async_trait]
impl PriceFeed for ScriptedPriceFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_fetch(&self, _contract_address: &str) -> Result<Option<Decimal>, PriceFeedError> {
        match self.responses.lock().unwrap().pop() {
            Some(Ok(price)) => Ok(price),
            Some(Err(msg)) => Err(PriceFeedError::Parse(msg)),
            None => Err(PriceFeedError::Parse("script exhausted".into())),
        }
    }
}

/// Store wrapper that can be told to fail specific operations, for
/// exercising the rollback/compensation paths.
pub struct FlakyStore {
    inner: Arc<dyn LedgerStore>,
    pub fail_insert_transaction: AtomicBool,
    pub fail_update_holding: AtomicBool,
    pub fail_insert_holding: AtomicBool,
    pub fail_update_order: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn LedgerStore>) -> Self {
        Self {
            inner,
            fail_insert_transaction: AtomicBool::new(false),
            fail_update_holding: AtomicBool::new(false),
            fail_insert_holding: AtomicBool::new(false),
            fail_update_order: AtomicBool::new(false),
        }
    }

    fn trip(&self, flag: &AtomicBool, op: &str) -> LedgerResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(LedgerError::Persistence(format!("injected failure: {op}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn token_by_id(&self, id: i64) -> LedgerResult<Option<Token>> {
        self.inner.token_by_id(id).await
    }

    async fn token_by_contract(&self, contract_address: &str) -> LedgerResult<Option<Token>> {
        self.inner.token_by_contract(contract_address).await
    }

    async fn insert_token(&self, token: Token) -> LedgerResult<Token> {
        self.inner.insert_token(token).await
    }

    async fn update_token(&self, token: &Token) -> LedgerResult<()> {
        self.inner.update_token(token).await
    }

    async fn holding_by_id(&self, id: i64) -> LedgerResult<Option<Holding>> {
        self.inner.holding_by_id(id).await
    }

    async fn holding_for(&self, wallet_id: i64, token_id: i64) -> LedgerResult<Option<Holding>> {
        self.inner.holding_for(wallet_id, token_id).await
    }

    async fn holdings_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<Holding>> {
        self.inner.holdings_for_wallet(wallet_id).await
    }

    async fn insert_holding(&self, holding: Holding) -> LedgerResult<Holding> {
        self.trip(&self.fail_insert_holding, "insert_holding")?;
        self.inner.insert_holding(holding).await
    }

    async fn update_holding(&self, holding: &Holding) -> LedgerResult<()> {
        self.trip(&self.fail_update_holding, "update_holding")?;
        self.inner.update_holding(holding).await
    }

    async fn delete_holding(&self, id: i64) -> LedgerResult<()> {
        self.inner.delete_holding(id).await
    }

    async fn insert_transaction(&self, tx: Transaction) -> LedgerResult<Transaction> {
        self.trip(&self.fail_insert_transaction, "insert_transaction")?;
        self.inner.insert_transaction(tx).await
    }

    async fn transactions_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<Transaction>> {
        self.inner.transactions_for_wallet(wallet_id).await
    }

    async fn insert_order(&self, order: LimitOrder) -> LedgerResult<LimitOrder> {
        self.inner.insert_order(order).await
    }

    async fn order_by_id(&self, id: i64) -> LedgerResult<Option<LimitOrder>> {
        self.inner.order_by_id(id).await
    }

    async fn update_order(&self, order: &LimitOrder) -> LedgerResult<()> {
        self.trip(&self.fail_update_order, "update_order")?;
        self.inner.update_order(order).await
    }

    async fn active_orders_for_token(&self, token_id: i64) -> LedgerResult<Vec<LimitOrder>> {
        self.inner.active_orders_for_token(token_id).await
    }

    async fn orders_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<LimitOrder>> {
        self.inner.orders_for_wallet(wallet_id).await
    }

    async fn tokens_with_active_orders(&self) -> LedgerResult<Vec<i64>> {
        self.inner.tokens_with_active_orders().await
    }

    async fn settings_for_wallet(&self, wallet_id: i64) -> LedgerResult<Option<Settings>> {
        self.inner.settings_for_wallet(wallet_id).await
    }

    async fn upsert_settings(&self, settings: &Settings) -> LedgerResult<()> {
        self.inner.upsert_settings(settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_static_feed_counts_calls() {
        let feed = StaticPriceFeed::new("static", Some(dec!(1.5)));
        assert_eq!(feed.try_fetch("mint").await.unwrap(), Some(dec!(1.5)));
        assert_eq!(feed.try_fetch("mint").await.unwrap(), Some(dec!(1.5)));
        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_feed_plays_in_order() {
        let feed = ScriptedPriceFeed::new(
            "scripted",
            vec![Ok(Some(dec!(1))), Err("boom".into()), Ok(None)],
        );
        assert_eq!(feed.try_fetch("mint").await.unwrap(), Some(dec!(1)));
        assert!(feed.try_fetch("mint").await.is_err());
        assert_eq!(feed.try_fetch("mint").await.unwrap(), None);
        // Exhausted script fails
        assert!(feed.try_fetch("mint").await.is_err());
    }
}
