//! Ledger Facade
//!
//! The single entry point a transport layer talks to. Every call takes an
//! explicit wallet id; the facade never tracks an "active wallet". Display
//! paths (holdings, dashboard, buys) refresh prices best-effort through
//! the resolver's cache; the evaluation path always fetches fresh.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::debug;

use crate::application::ledger::{ensure_token, HoldingView, PositionLedger, RateModel};
use crate::application::orders::OrderBook;
use crate::application::resolver::PriceResolver;
use crate::domain::{
    LedgerError, LedgerResult, LimitOrder, Settings, SettingsPatch, Token, Transaction,
};
use crate::ports::custody::WalletCustody;
use crate::ports::store::LedgerStore;

/// A transaction joined with its token for history listings.
#[derive(Debug, Clone)]
pub struct TransactionView {
    pub tx: Transaction,
    pub token: Token,
}

/// A limit order joined with its token and derived reached status.
#[derive(Debug, Clone)]
pub struct OrderListing {
    pub order: LimitOrder,
    pub token: Token,
    pub reached: bool,
}

/// Result of one refresh-and-evaluate pass on a token.
#[derive(Debug)]
pub struct TickOutcome {
    pub price_usd: Decimal,
    /// Active orders whose target the price met
    pub reached: Vec<i64>,
    /// Orders auto-executed by this pass
    pub triggered: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub sol_balance: Decimal,
    pub total_holdings_usd: Decimal,
    pub holdings: Vec<HoldingView>,
}

pub struct LedgerFacade {
    store: Arc<dyn LedgerStore>,
    custody: Arc<dyn WalletCustody>,
    resolver: Arc<PriceResolver>,
    ledger: Arc<PositionLedger>,
    book: OrderBook,
    /// Cache tolerance for display paths; evaluation always bypasses
    display_staleness: Duration,
}

impl LedgerFacade {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        custody: Arc<dyn WalletCustody>,
        resolver: Arc<PriceResolver>,
        rates: RateModel,
        display_staleness: Duration,
    ) -> Self {
        let ledger = Arc::new(PositionLedger::new(
            store.clone(),
            custody.clone(),
            rates,
        ));
        let book = OrderBook::new(store.clone(), ledger.clone());
        Self {
            store,
            custody,
            resolver,
            ledger,
            book,
            display_staleness,
        }
    }

    /// Buy a token with SOL. The price is refreshed first (best-effort)
    /// so the recorded USD cost basis reflects the market at buy time.
    pub async fn buy(
        &self,
        wallet_id: i64,
        contract_address: &str,
        amount_sol: Decimal,
        take_profit_pct: Option<Decimal>,
        stop_loss_pct: Option<Decimal>,
    ) -> LedgerResult<Transaction> {
        let token = ensure_token(self.store.as_ref(), contract_address).await?;
        self.refresh_price(&token).await;
        self.ledger
            .apply_buy(
                wallet_id,
                contract_address,
                amount_sol,
                take_profit_pct,
                stop_loss_pct,
            )
            .await
    }

    pub async fn sell(
        &self,
        wallet_id: i64,
        holding_id: i64,
        quantity: Decimal,
    ) -> LedgerResult<Transaction> {
        self.ledger.apply_sell(wallet_id, holding_id, quantity).await
    }

    pub async fn create_limit_order(
        &self,
        wallet_id: i64,
        contract_address: &str,
        target_price_usd: Decimal,
        amount_sol: Decimal,
        auto_execute: bool,
    ) -> LedgerResult<LimitOrder> {
        self.book
            .create(
                wallet_id,
                contract_address,
                target_price_usd,
                amount_sol,
                auto_execute,
            )
            .await
    }

    /// Returns whether the order was still active. Cancelling an
    /// already-inactive order succeeds with `false`.
    pub async fn cancel_limit_order(&self, wallet_id: i64, order_id: i64) -> LedgerResult<bool> {
        self.book.cancel(wallet_id, order_id).await
    }

    /// Holdings with current value and PnL, prices refreshed through the
    /// display cache first.
    pub async fn holdings_view(&self, wallet_id: i64) -> LedgerResult<Vec<HoldingView>> {
        for holding in self.store.holdings_for_wallet(wallet_id).await? {
            if let Some(token) = self.store.token_by_id(holding.token_id).await? {
                self.refresh_price(&token).await;
            }
        }
        self.ledger.holdings_view(wallet_id).await
    }

    /// Transaction history, newest first, token attached.
    pub async fn transactions(&self, wallet_id: i64) -> LedgerResult<Vec<TransactionView>> {
        let txs = self.store.transactions_for_wallet(wallet_id).await?;
        let mut views = Vec::with_capacity(txs.len());
        for tx in txs {
            let token = self
                .store
                .token_by_id(tx.token_id)
                .await?
                .ok_or_else(|| {
                    LedgerError::Persistence(format!(
                        "transaction {} references missing token {}",
                        tx.id, tx.token_id
                    ))
                })?;
            views.push(TransactionView { tx, token });
        }
        Ok(views)
    }

    /// All of a wallet's limit orders with token and derived reached flag.
    pub async fn limit_orders(&self, wallet_id: i64) -> LedgerResult<Vec<OrderListing>> {
        let views = self.book.order_views(wallet_id).await?;
        let mut listings = Vec::with_capacity(views.len());
        for view in views {
            let token = self
                .store
                .token_by_id(view.order.token_id)
                .await?
                .ok_or_else(|| {
                    LedgerError::Persistence(format!(
                        "order {} references missing token {}",
                        view.order.id, view.order.token_id
                    ))
                })?;
            listings.push(OrderListing {
                order: view.order,
                token,
                reached: view.reached,
            });
        }
        Ok(listings)
    }

    /// Wallet settings, defaults when the wallet never wrote any.
    pub async fn settings(&self, wallet_id: i64) -> LedgerResult<Settings> {
        Ok(self
            .store
            .settings_for_wallet(wallet_id)
            .await?
            .unwrap_or_else(|| Settings::defaults(wallet_id)))
    }

    /// Patch wallet settings, materializing the record on first write.
    pub async fn update_settings(
        &self,
        wallet_id: i64,
        patch: SettingsPatch,
    ) -> LedgerResult<Settings> {
        let mut settings = self.settings(wallet_id).await?;
        settings.apply(&patch)?;
        self.store.upsert_settings(&settings).await?;
        Ok(settings)
    }

    /// Fetch a fresh price for the token (cache bypassed) and evaluate its
    /// active orders against it.
    pub async fn refresh_and_evaluate(&self, contract_address: &str) -> LedgerResult<TickOutcome> {
        let token = ensure_token(self.store.as_ref(), contract_address).await?;
        self.refresh_and_evaluate_token(token.id).await
    }

    /// Same as [`refresh_and_evaluate`], keyed by token id (run-loop path).
    ///
    /// [`refresh_and_evaluate`]: Self::refresh_and_evaluate
    pub async fn refresh_and_evaluate_token(&self, token_id: i64) -> LedgerResult<TickOutcome> {
        let token = self
            .store
            .token_by_id(token_id)
            .await?
            .ok_or_else(|| LedgerError::Persistence(format!("unknown token {token_id}")))?;

        // No staleness tolerance on the execution path
        let quote = self.resolver.resolve(&token, None).await?;
        let outcome = self.book.evaluate(token.id, quote.price_usd).await?;
        Ok(TickOutcome {
            price_usd: quote.price_usd,
            reached: outcome.reached,
            triggered: outcome.executed,
        })
    }

    /// Token ids that currently carry at least one active order.
    pub async fn tokens_with_active_orders(&self) -> LedgerResult<Vec<i64>> {
        self.store.tokens_with_active_orders().await
    }

    /// Wallet balance plus the holdings view and its USD total.
    pub async fn dashboard(&self, wallet_id: i64) -> LedgerResult<Dashboard> {
        let sol_balance = self.custody.balance(wallet_id).await?;
        let holdings = self.holdings_view(wallet_id).await?;
        let total_holdings_usd = holdings
            .iter()
            .map(|row| row.current_value_usd)
            .sum();
        Ok(Dashboard {
            sol_balance,
            total_holdings_usd,
            holdings,
        })
    }

    /// Best-effort display refresh: a miss is logged and ignored so a
    /// provider outage never blocks a read path.
    async fn refresh_price(&self, token: &Token) {
        if let Err(e) = self
            .resolver
            .resolve(token, Some(self.display_staleness))
            .await
        {
            debug!(token = %token.contract_address, error = %e, "price refresh skipped");
        }
    }
}
