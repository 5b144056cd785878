//! In-Memory Store and Custody Adapters
//!
//! Reference implementations of the persistence and custody ports, used by
//! the test suites and the demo/run commands. Sequential ids per entity
//! mirror the serial primary keys of a relational backing store.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::domain::{
    Holding, LedgerError, LedgerResult, LimitOrder, Settings, Token, Transaction,
};
use crate::ports::custody::WalletCustody;
use crate::ports::store::LedgerStore;

#[derive(Debug, Default)]
struct StoreInner {
    tokens: HashMap<i64, Token>,
    holdings: HashMap<i64, Holding>,
    transactions: Vec<Transaction>,
    orders: HashMap<i64, LimitOrder>,
    settings: HashMap<i64, Settings>,
    next_token_id: i64,
    next_holding_id: i64,
    next_tx_id: i64,
    next_order_id: i64,
}

/// Keyed record store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn token_by_id(&self, id: i64) -> LedgerResult<Option<Token>> {
        Ok(self.inner.lock().await.tokens.get(&id).cloned())
    }

    async fn token_by_contract(&self, contract_address: &str) -> LedgerResult<Option<Token>> {
        Ok(self
            .inner
            .lock()
            .await
            .tokens
            .values()
            .find(|t| t.contract_address == contract_address)
            .cloned())
    }

    async fn insert_token(&self, mut token: Token) -> LedgerResult<Token> {
        let mut inner = self.inner.lock().await;
        // Contract addresses are unique; a concurrent first reference to
        // the same mint resolves to the record that won the race.
        if let Some(existing) = inner
            .tokens
            .values()
            .find(|t| t.contract_address == token.contract_address)
        {
            return Ok(existing.clone());
        }
        inner.next_token_id += 1;
        token.id = inner.next_token_id;
        inner.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn update_token(&self, token: &Token) -> LedgerResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.tokens.get_mut(&token.id) {
            Some(existing) => {
                *existing = token.clone();
                Ok(())
            }
            None => Err(LedgerError::Persistence(format!(
                "update of missing token {}",
                token.id
            ))),
        }
    }

    async fn holding_by_id(&self, id: i64) -> LedgerResult<Option<Holding>> {
        Ok(self.inner.lock().await.holdings.get(&id).cloned())
    }

    async fn holding_for(&self, wallet_id: i64, token_id: i64) -> LedgerResult<Option<Holding>> {
        Ok(self
            .inner
            .lock()
            .await
            .holdings
            .values()
            .find(|h| h.wallet_id == wallet_id && h.token_id == token_id)
            .cloned())
    }

    async fn holdings_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<Holding>> {
        let mut rows: Vec<Holding> = self
            .inner
            .lock()
            .await
            .holdings
            .values()
            .filter(|h| h.wallet_id == wallet_id)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.id);
        Ok(rows)
    }

    async fn insert_holding(&self, mut holding: Holding) -> LedgerResult<Holding> {
        let mut inner = self.inner.lock().await;
        inner.next_holding_id += 1;
        holding.id = inner.next_holding_id;
        inner.holdings.insert(holding.id, holding.clone());
        Ok(holding)
    }

    async fn update_holding(&self, holding: &Holding) -> LedgerResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.holdings.get_mut(&holding.id) {
            Some(existing) => {
                *existing = holding.clone();
                Ok(())
            }
            None => Err(LedgerError::Persistence(format!(
                "update of missing holding {}",
                holding.id
            ))),
        }
    }

    async fn delete_holding(&self, id: i64) -> LedgerResult<()> {
        self.inner.lock().await.holdings.remove(&id);
        Ok(())
    }

    async fn insert_transaction(&self, mut tx: Transaction) -> LedgerResult<Transaction> {
        let mut inner = self.inner.lock().await;
        inner.next_tx_id += 1;
        tx.id = inner.next_tx_id;
        inner.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn transactions_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .inner
            .lock()
            .await
            .transactions
            .iter()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn insert_order(&self, mut order: LimitOrder) -> LedgerResult<LimitOrder> {
        let mut inner = self.inner.lock().await;
        inner.next_order_id += 1;
        order.id = inner.next_order_id;
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order_by_id(&self, id: i64) -> LedgerResult<Option<LimitOrder>> {
        Ok(self.inner.lock().await.orders.get(&id).cloned())
    }

    async fn update_order(&self, order: &LimitOrder) -> LedgerResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(LedgerError::Persistence(format!(
                "update of missing order {}",
                order.id
            ))),
        }
    }

    async fn active_orders_for_token(&self, token_id: i64) -> LedgerResult<Vec<LimitOrder>> {
        let mut rows: Vec<LimitOrder> = self
            .inner
            .lock()
            .await
            .orders
            .values()
            .filter(|o| o.token_id == token_id && o.is_active)
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.id);
        Ok(rows)
    }

    async fn orders_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<LimitOrder>> {
        let mut rows: Vec<LimitOrder> = self
            .inner
            .lock()
            .await
            .orders
            .values()
            .filter(|o| o.wallet_id == wallet_id)
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.id);
        Ok(rows)
    }

    async fn tokens_with_active_orders(&self) -> LedgerResult<Vec<i64>> {
        let inner = self.inner.lock().await;
        let mut ids: Vec<i64> = inner
            .orders
            .values()
            .filter(|o| o.is_active)
            .map(|o| o.token_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn settings_for_wallet(&self, wallet_id: i64) -> LedgerResult<Option<Settings>> {
        Ok(self.inner.lock().await.settings.get(&wallet_id).cloned())
    }

    async fn upsert_settings(&self, settings: &Settings) -> LedgerResult<()> {
        self.inner
            .lock()
            .await
            .settings
            .insert(settings.wallet_id, settings.clone());
        Ok(())
    }
}

/// Custody collaborator backed by an in-memory balance table.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    balances: Mutex<HashMap<i64, Decimal>>,
    next_wallet_id: Mutex<i64>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wallet with an initial SOL balance; returns its id.
    pub async fn create_wallet(&self, initial_balance: Decimal) -> i64 {
        let mut next = self.next_wallet_id.lock().await;
        *next += 1;
        let id = *next;
        self.balances.lock().await.insert(id, initial_balance);
        id
    }
}

#[async_trait]
impl WalletCustody for InMemoryCustody {
    async fn balance(&self, wallet_id: i64) -> LedgerResult<Decimal> {
        self.balances
            .lock()
            .await
            .get(&wallet_id)
            .copied()
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }

    async fn debit(&self, wallet_id: i64, amount: Decimal) -> LedgerResult<()> {
        let mut balances = self.balances.lock().await;
        let balance = balances
            .get_mut(&wallet_id)
            .ok_or(LedgerError::WalletNotFound(wallet_id))?;
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    async fn credit(&self, wallet_id: i64, amount: Decimal) -> LedgerResult<()> {
        let mut balances = self.balances.lock().await;
        let balance = balances
            .get_mut(&wallet_id)
            .ok_or(LedgerError::WalletNotFound(wallet_id))?;
        *balance += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_token_roundtrip() {
        let store = InMemoryStore::new();
        let token = store.insert_token(Token::minimal(0, "mintA")).await.unwrap();
        assert_eq!(token.id, 1);

        let by_contract = store.token_by_contract("mintA").await.unwrap().unwrap();
        assert_eq!(by_contract.id, token.id);
        assert!(store.token_by_contract("mintB").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_token_dedups_by_contract() {
        let store = InMemoryStore::new();
        let first = store.insert_token(Token::minimal(0, "mintA")).await.unwrap();
        let second = store.insert_token(Token::minimal(0, "mintA")).await.unwrap();
        // Second insert of the same contract resolves to the existing record
        assert_eq!(second.id, first.id);

        let other = store.insert_token(Token::minimal(0, "mintB")).await.unwrap();
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn test_holding_lookup_by_pair() {
        let store = InMemoryStore::new();
        let h = Holding::open(0, 5, 9, dec!(100), dec!(0.001), None);
        let h = store.insert_holding(h).await.unwrap();

        assert!(store.holding_for(5, 9).await.unwrap().is_some());
        assert!(store.holding_for(5, 8).await.unwrap().is_none());

        store.delete_holding(h.id).await.unwrap();
        assert!(store.holding_for(5, 9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transactions_newest_first() {
        let store = InMemoryStore::new();
        for _ in 0..3 {
            let tx = Transaction {
                id: 0,
                wallet_id: 1,
                token_id: 1,
                kind: crate::domain::TxKind::Buy,
                amount_sol: dec!(1),
                token_quantity: dec!(1000),
                price_per_token_sol: dec!(0.001),
                take_profit_pct: None,
                stop_loss_pct: None,
                status: crate::domain::TxStatus::Completed,
                created_at: chrono::Utc::now(),
            };
            store.insert_transaction(tx).await.unwrap();
        }
        let rows = store.transactions_for_wallet(1).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].id > rows[1].id);
    }

    #[tokio::test]
    async fn test_tokens_with_active_orders_dedups() {
        let store = InMemoryStore::new();
        for _ in 0..2 {
            let order = LimitOrder::new(0, 1, 7, dec!(1), dec!(1), true).unwrap();
            store.insert_order(order).await.unwrap();
        }
        let mut cancelled = LimitOrder::new(0, 1, 8, dec!(1), dec!(1), true).unwrap();
        cancelled.cancel();
        store.insert_order(cancelled).await.unwrap();

        assert_eq!(store.tokens_with_active_orders().await.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_custody_debit_credit() {
        let custody = InMemoryCustody::new();
        let id = custody.create_wallet(dec!(10)).await;

        custody.debit(id, dec!(4)).await.unwrap();
        assert_eq!(custody.balance(id).await.unwrap(), dec!(6));

        custody.credit(id, dec!(1)).await.unwrap();
        assert_eq!(custody.balance(id).await.unwrap(), dec!(7));
    }

    #[tokio::test]
    async fn test_custody_overdraft_rejected() {
        let custody = InMemoryCustody::new();
        let id = custody.create_wallet(dec!(1)).await;

        let err = custody.debit(id, dec!(2)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        // Balance untouched after a rejected debit
        assert_eq!(custody.balance(id).await.unwrap(), dec!(1));
    }

    #[tokio::test]
    async fn test_custody_unknown_wallet() {
        let custody = InMemoryCustody::new();
        assert!(matches!(
            custody.balance(99).await,
            Err(LedgerError::WalletNotFound(99))
        ));
    }
}
