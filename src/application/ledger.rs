//! Position Ledger
//!
//! Applies buy/sell events to a wallet's holdings with weighted-average
//! cost accounting and computes the display view (current USD value and
//! unrealized PnL). Operations on one wallet are serialized by a keyed
//! lock held across balance check, debit/credit, and holding mutation;
//! that lock scope is also the rollback boundary: a failure after the
//! custody step compensates with the opposite custody operation so no
//! partial state survives.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info};

use crate::application::locks::KeyedLocks;
use crate::domain::{
    Holding, LedgerError, LedgerResult, SellEffect, Token, Transaction, TxKind, TxStatus,
};
use crate::ports::custody::WalletCustody;
use crate::ports::store::LedgerStore;

/// Exchange-rate model for converting a SOL spend into a token quantity.
///
/// With a known USD token price the quantity comes from the configured
/// SOL/USD rate; without one, a flat default tokens-per-SOL rate applies.
/// Either way `price_per_token_sol * quantity == amount_sol` exactly.
#[derive(Debug, Clone)]
pub struct RateModel {
    pub sol_price_usd: Decimal,
    pub default_tokens_per_sol: Decimal,
}

impl Default for RateModel {
    fn default() -> Self {
        Self {
            sol_price_usd: dec!(150),
            default_tokens_per_sol: dec!(1000),
        }
    }
}

impl RateModel {
    /// Quantity, exact per-token SOL price, and USD value (when priceable)
    /// for spending `amount_sol` on a token.
    fn convert(
        &self,
        amount_sol: Decimal,
        token_price_usd: Option<Decimal>,
    ) -> (Decimal, Decimal, Option<Decimal>) {
        match token_price_usd {
            Some(price_usd) if price_usd > Decimal::ZERO => {
                let usd_value = amount_sol * self.sol_price_usd;
                let quantity = usd_value / price_usd;
                (quantity, amount_sol / quantity, Some(usd_value))
            }
            _ => {
                let quantity = amount_sol * self.default_tokens_per_sol;
                (quantity, amount_sol / quantity, None)
            }
        }
    }
}

/// One row of the holdings display view.
#[derive(Debug, Clone)]
pub struct HoldingView {
    pub holding: Holding,
    pub token: Token,
    /// `quantity * price_usd`, zero while the price is unknown
    pub current_value_usd: Decimal,
    pub pnl_pct: Decimal,
}

/// Unrealized PnL percent. Meaningless without both a cost basis and a
/// live valuation, in which case it reports zero rather than dividing
/// by zero or inventing a number.
fn pnl_pct(cost_basis_usd: Option<Decimal>, current_value_usd: Decimal) -> Decimal {
    match cost_basis_usd {
        Some(basis) if basis > Decimal::ZERO && current_value_usd > Decimal::ZERO => {
            (current_value_usd - basis) / basis * dec!(100)
        }
        _ => Decimal::ZERO,
    }
}

pub struct PositionLedger {
    store: Arc<dyn LedgerStore>,
    custody: Arc<dyn WalletCustody>,
    rates: RateModel,
    wallet_locks: KeyedLocks,
}

/// Look up a token by contract address, creating a minimal record
/// (default decimals, no metadata) on first reference.
pub(crate) async fn ensure_token(
    store: &dyn LedgerStore,
    contract_address: &str,
) -> LedgerResult<Token> {
    if let Some(token) = store.token_by_contract(contract_address).await? {
        return Ok(token);
    }
    store.insert_token(Token::minimal(0, contract_address)).await
}

impl PositionLedger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        custody: Arc<dyn WalletCustody>,
        rates: RateModel,
    ) -> Self {
        Self {
            store,
            custody,
            rates,
            wallet_locks: KeyedLocks::new(),
        }
    }

    /// Apply a buy: debit the wallet, fold the purchase into the holding's
    /// weighted-average cost, and emit a completed transaction record.
    pub async fn apply_buy(
        &self,
        wallet_id: i64,
        contract_address: &str,
        amount_sol: Decimal,
        take_profit_pct: Option<Decimal>,
        stop_loss_pct: Option<Decimal>,
    ) -> LedgerResult<Transaction> {
        if amount_sol <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "buy amount must be positive, got {amount_sol}"
            )));
        }

        let _guard = self.wallet_locks.acquire(wallet_id).await;

        let balance = self.custody.balance(wallet_id).await?;
        if balance < amount_sol {
            return Err(LedgerError::InsufficientBalance {
                available: balance,
                required: amount_sol,
            });
        }

        let token = ensure_token(self.store.as_ref(), contract_address).await?;
        let (quantity, price_per_token_sol, usd_value) =
            self.rates.convert(amount_sol, token.price_usd);

        // Debit first; everything after compensates with a credit on failure.
        self.custody.debit(wallet_id, amount_sol).await?;

        let committed = self
            .commit_buy(wallet_id, &token, quantity, price_per_token_sol, usd_value)
            .await;
        let rollback = match committed {
            Ok(rollback) => rollback,
            Err(e) => {
                self.refund(wallet_id, amount_sol).await;
                return Err(e);
            }
        };

        let tx = Transaction {
            id: 0,
            wallet_id,
            token_id: token.id,
            kind: TxKind::Buy,
            amount_sol,
            token_quantity: quantity,
            price_per_token_sol,
            take_profit_pct,
            stop_loss_pct,
            status: TxStatus::Completed,
            created_at: Utc::now(),
        };
        let tx = match self.store.insert_transaction(tx).await {
            Ok(tx) => tx,
            Err(e) => {
                self.revert_holding(rollback).await;
                self.refund(wallet_id, amount_sol).await;
                return Err(e);
            }
        };

        info!(
            wallet_id,
            token = %token.contract_address,
            %amount_sol,
            %quantity,
            "BUY applied"
        );
        Ok(tx)
    }

    /// Apply a sell: credit the wallet with proceeds valued at the
    /// holding's average cost, shrink or delete the holding, and emit a
    /// pending transaction record (settlement is an external concern).
    pub async fn apply_sell(
        &self,
        wallet_id: i64,
        holding_id: i64,
        quantity: Decimal,
    ) -> LedgerResult<Transaction> {
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "sell quantity must be positive, got {quantity}"
            )));
        }

        let _guard = self.wallet_locks.acquire(wallet_id).await;

        let mut holding = self
            .store
            .holding_by_id(holding_id)
            .await?
            .filter(|h| h.wallet_id == wallet_id)
            .ok_or(LedgerError::HoldingNotFound(holding_id))?;

        let original = holding.clone();
        let proceeds_sol = holding.proceeds_at_cost(quantity);
        let avg_cost_sol = holding.avg_cost_sol;
        let effect = holding.apply_sell(quantity)?;

        // Credit first so the compensation below is a plain debit of funds
        // we know the wallet holds (the wallet lock excludes other spends).
        self.custody.credit(wallet_id, proceeds_sol).await?;

        let persisted = match effect {
            SellEffect::Emptied => self.store.delete_holding(holding.id).await,
            SellEffect::Reduced => self.store.update_holding(&holding).await,
        };
        if let Err(e) = persisted {
            self.reclaim(wallet_id, proceeds_sol).await;
            return Err(e);
        }

        let tx = Transaction {
            id: 0,
            wallet_id,
            token_id: holding.token_id,
            kind: TxKind::Sell,
            amount_sol: proceeds_sol,
            token_quantity: quantity,
            price_per_token_sol: avg_cost_sol,
            take_profit_pct: None,
            stop_loss_pct: None,
            status: TxStatus::Pending,
            created_at: Utc::now(),
        };
        let tx = match self.store.insert_transaction(tx).await {
            Ok(tx) => tx,
            Err(e) => {
                self.revert_holding(HoldingRollback::Restore(original)).await;
                self.reclaim(wallet_id, proceeds_sol).await;
                return Err(e);
            }
        };

        info!(
            wallet_id,
            holding_id,
            %quantity,
            %proceeds_sol,
            "SELL applied"
        );
        Ok(tx)
    }

    /// Holdings with current USD value and unrealized PnL for one wallet.
    pub async fn holdings_view(&self, wallet_id: i64) -> LedgerResult<Vec<HoldingView>> {
        let holdings = self.store.holdings_for_wallet(wallet_id).await?;
        let mut rows = Vec::with_capacity(holdings.len());
        for holding in holdings {
            let token = self
                .store
                .token_by_id(holding.token_id)
                .await?
                .ok_or_else(|| {
                    LedgerError::Persistence(format!(
                        "holding {} references missing token {}",
                        holding.id, holding.token_id
                    ))
                })?;
            let current_value_usd = token
                .price_usd
                .map(|price| holding.quantity * price)
                .unwrap_or(Decimal::ZERO);
            let pnl = pnl_pct(holding.cost_basis_usd, current_value_usd);
            rows.push(HoldingView {
                holding,
                token,
                current_value_usd,
                pnl_pct: pnl,
            });
        }
        Ok(rows)
    }

    /// Write the new/updated holding, returning how to undo it.
    async fn commit_buy(
        &self,
        wallet_id: i64,
        token: &Token,
        quantity: Decimal,
        price_per_token_sol: Decimal,
        usd_value: Option<Decimal>,
    ) -> LedgerResult<HoldingRollback> {
        match self.store.holding_for(wallet_id, token.id).await? {
            Some(mut holding) => {
                let original = holding.clone();
                holding.apply_buy(quantity, price_per_token_sol, usd_value);
                self.store.update_holding(&holding).await?;
                Ok(HoldingRollback::Restore(original))
            }
            None => {
                let holding = Holding::open(
                    0,
                    wallet_id,
                    token.id,
                    quantity,
                    price_per_token_sol,
                    usd_value,
                );
                let holding = self.store.insert_holding(holding).await?;
                Ok(HoldingRollback::Delete(holding.id))
            }
        }
    }

    async fn revert_holding(&self, rollback: HoldingRollback) {
        let result = match rollback {
            HoldingRollback::Delete(id) => self.store.delete_holding(id).await,
            HoldingRollback::Restore(ref original) => {
                // A holding emptied by the failed sell was deleted and has
                // to be re-inserted; a reduced one is updated in place.
                if self
                    .store
                    .holding_by_id(original.id)
                    .await
                    .ok()
                    .flatten()
                    .is_some()
                {
                    self.store.update_holding(original).await
                } else {
                    self.store.insert_holding(original.clone()).await.map(|_| ())
                }
            }
        };
        if let Err(e) = result {
            error!(error = %e, "holding rollback failed; manual reconciliation required");
        }
    }

    async fn refund(&self, wallet_id: i64, amount_sol: Decimal) {
        if let Err(e) = self.custody.credit(wallet_id, amount_sol).await {
            error!(wallet_id, %amount_sol, error = %e, "refund after failed buy did not apply");
        }
    }

    async fn reclaim(&self, wallet_id: i64, amount_sol: Decimal) {
        if let Err(e) = self.custody.debit(wallet_id, amount_sol).await {
            error!(wallet_id, %amount_sol, error = %e, "reclaim after failed sell did not apply");
        }
    }
}

enum HoldingRollback {
    /// The buy created the holding; undo by deleting it
    Delete(i64),
    /// The operation modified an existing holding; undo by restoring it
    Restore(Holding),
}
