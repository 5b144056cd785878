//! Order Book
//!
//! Creates, cancels, and evaluates standing limit orders. Evaluation for
//! one token runs under that token's lock and re-reads each order before
//! acting, so two concurrent price ticks cannot execute the same order
//! twice. A failed execution leaves the order active for the next tick;
//! only a successful one deactivates it.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::application::ledger::{ensure_token, PositionLedger};
use crate::application::locks::KeyedLocks;
use crate::domain::{LedgerError, LedgerResult, LimitOrder, OrderView};
use crate::ports::store::LedgerStore;

/// Outcome of one evaluation pass over a token's active orders.
#[derive(Debug, Default)]
pub struct Evaluation {
    /// Ids of active orders whose target the price met
    pub reached: Vec<i64>,
    /// Ids of orders auto-executed this pass
    pub executed: Vec<i64>,
}

pub struct OrderBook {
    store: Arc<dyn LedgerStore>,
    ledger: Arc<PositionLedger>,
    token_locks: KeyedLocks,
}

impl OrderBook {
    pub fn new(store: Arc<dyn LedgerStore>, ledger: Arc<PositionLedger>) -> Self {
        Self {
            store,
            ledger,
            token_locks: KeyedLocks::new(),
        }
    }

    /// Place a limit order against a token, creating the token record on
    /// first reference. The order starts active and untriggered even when
    /// the current price already meets the target; only an evaluation pass
    /// executes orders.
    pub async fn create(
        &self,
        wallet_id: i64,
        contract_address: &str,
        target_price_usd: Decimal,
        amount_sol: Decimal,
        auto_execute: bool,
    ) -> LedgerResult<LimitOrder> {
        let token = ensure_token(self.store.as_ref(), contract_address).await?;
        let order = LimitOrder::new(
            0,
            wallet_id,
            token.id,
            target_price_usd,
            amount_sol,
            auto_execute,
        )?;
        let order = self.store.insert_order(order).await?;
        info!(
            wallet_id,
            order_id = order.id,
            token = %token.contract_address,
            %target_price_usd,
            "limit order placed"
        );
        Ok(order)
    }

    /// Cancel an order owned by `wallet_id`. Returns whether the order was
    /// active; cancelling an already-inactive order succeeds as a no-op.
    pub async fn cancel(&self, wallet_id: i64, order_id: i64) -> LedgerResult<bool> {
        let _guard = self.token_guard_for(order_id).await?;

        let mut order = self
            .store
            .order_by_id(order_id)
            .await?
            .filter(|o| o.wallet_id == wallet_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        if !order.cancel() {
            return Ok(false);
        }
        self.store.update_order(&order).await?;
        info!(wallet_id, order_id, "limit order cancelled");
        Ok(true)
    }

    /// Evaluate every active order on a token against a freshly resolved
    /// price. Orders whose target is met are reported as reached;
    /// auto-execute orders are additionally executed and deactivated.
    pub async fn evaluate(&self, token_id: i64, price_usd: Decimal) -> LedgerResult<Evaluation> {
        let _guard = self.token_locks.acquire(token_id).await;

        let token = self
            .store
            .token_by_id(token_id)
            .await?
            .ok_or_else(|| LedgerError::Persistence(format!("unknown token {token_id}")))?;

        let mut outcome = Evaluation::default();
        for candidate in self.store.active_orders_for_token(token_id).await? {
            // Re-read under the lock; the snapshot may predate a cancel.
            let Some(mut order) = self
                .store
                .order_by_id(candidate.id)
                .await?
                .filter(|o| o.is_active)
            else {
                continue;
            };
            if !order.is_reached(price_usd) {
                continue;
            }
            outcome.reached.push(order.id);
            if !order.auto_execute {
                continue;
            }

            // Deactivate before spending: a deactivation write failure
            // aborts here with the wallet untouched, so a committed buy
            // can never coexist with a still-active order.
            let active = order.clone();
            order.mark_executed(Utc::now());
            self.store.update_order(&order).await?;

            match self
                .ledger
                .apply_buy(
                    order.wallet_id,
                    &token.contract_address,
                    order.amount_sol,
                    None,
                    None,
                )
                .await
            {
                Ok(_) => {
                    outcome.executed.push(order.id);
                    info!(
                        order_id = order.id,
                        wallet_id = order.wallet_id,
                        %price_usd,
                        target = %order.target_price_usd,
                        "limit order executed"
                    );
                }
                Err(e) => {
                    // Reactivate so the next tick retries.
                    warn!(
                        order_id = order.id,
                        wallet_id = order.wallet_id,
                        error = %e,
                        "limit order execution failed, order remains active"
                    );
                    if let Err(restore_err) = self.store.update_order(&active).await {
                        error!(
                            order_id = order.id,
                            error = %restore_err,
                            "order reactivation failed; manual reconciliation required"
                        );
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// A wallet's orders, each joined with whether the token's last known
    /// price meets its target. Unknown price means not reached.
    pub async fn order_views(&self, wallet_id: i64) -> LedgerResult<Vec<OrderView>> {
        let orders = self.store.orders_for_wallet(wallet_id).await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let price = self
                .store
                .token_by_id(order.token_id)
                .await?
                .and_then(|t| t.price_usd);
            let reached = order.is_active && price.is_some_and(|p| order.is_reached(p));
            views.push(OrderView { order, reached });
        }
        Ok(views)
    }

    /// Serialize cancellation with evaluation on the same token.
    async fn token_guard_for(
        &self,
        order_id: i64,
    ) -> LedgerResult<tokio::sync::OwnedMutexGuard<()>> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;
        Ok(self.token_locks.acquire(order.token_id).await)
    }
}
