//! Persistence Port
//!
//! Keyed record store per entity. No core logic depends on a specific
//! storage engine; implementations map their own failures into
//! `LedgerError::Persistence`.
//!
//! Inserts assign the record id: the id on the passed record is ignored
//! and the stored record is returned with its assigned id.

use async_trait::async_trait;

use crate::domain::{Holding, LedgerResult, LimitOrder, Settings, Token, Transaction};

#[async_trait]
pub trait LedgerStore: Send + Sync {
    // Tokens
    async fn token_by_id(&self, id: i64) -> LedgerResult<Option<Token>>;
    async fn token_by_contract(&self, contract_address: &str) -> LedgerResult<Option<Token>>;
    /// `contract_address` is unique: inserting an address that already
    /// exists returns the existing record unchanged.
    async fn insert_token(&self, token: Token) -> LedgerResult<Token>;
    /// Full-record update keyed by `token.id` (price write-back).
    async fn update_token(&self, token: &Token) -> LedgerResult<()>;

    // Holdings
    async fn holding_by_id(&self, id: i64) -> LedgerResult<Option<Holding>>;
    async fn holding_for(&self, wallet_id: i64, token_id: i64) -> LedgerResult<Option<Holding>>;
    async fn holdings_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<Holding>>;
    async fn insert_holding(&self, holding: Holding) -> LedgerResult<Holding>;
    async fn update_holding(&self, holding: &Holding) -> LedgerResult<()>;
    async fn delete_holding(&self, id: i64) -> LedgerResult<()>;

    // Transactions (append-only)
    async fn insert_transaction(&self, tx: Transaction) -> LedgerResult<Transaction>;
    /// Newest first.
    async fn transactions_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<Transaction>>;

    // Limit orders
    async fn insert_order(&self, order: LimitOrder) -> LedgerResult<LimitOrder>;
    async fn order_by_id(&self, id: i64) -> LedgerResult<Option<LimitOrder>>;
    async fn update_order(&self, order: &LimitOrder) -> LedgerResult<()>;
    async fn active_orders_for_token(&self, token_id: i64) -> LedgerResult<Vec<LimitOrder>>;
    async fn orders_for_wallet(&self, wallet_id: i64) -> LedgerResult<Vec<LimitOrder>>;
    /// Token ids that currently have at least one active order.
    async fn tokens_with_active_orders(&self) -> LedgerResult<Vec<i64>>;

    // Settings
    async fn settings_for_wallet(&self, wallet_id: i64) -> LedgerResult<Option<Settings>>;
    async fn upsert_settings(&self, settings: &Settings) -> LedgerResult<()>;
}
