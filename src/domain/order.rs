//! Limit Orders
//!
//! A standing instruction to act once a token's USD price reaches a target.
//! Orders here are buy-side only: execution spends the order's SOL amount.
//! An inactive order is terminal; no field changes afterward.
//!
//! "Reached" is a derived view over the current price, never a stored
//! field, so the flag cannot go stale across a price reversal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: i64,
    pub wallet_id: i64,
    pub token_id: i64,
    pub target_price_usd: Decimal,
    /// SOL to spend when the order executes
    pub amount_sol: Decimal,
    /// Execute automatically on reach, or only surface as reached
    pub auto_execute: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl LimitOrder {
    pub fn new(
        id: i64,
        wallet_id: i64,
        token_id: i64,
        target_price_usd: Decimal,
        amount_sol: Decimal,
        auto_execute: bool,
    ) -> LedgerResult<Self> {
        if target_price_usd <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "target price must be positive, got {target_price_usd}"
            )));
        }
        if amount_sol <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "order amount must be positive, got {amount_sol}"
            )));
        }

        Ok(Self {
            id,
            wallet_id,
            token_id,
            target_price_usd,
            amount_sol,
            auto_execute,
            is_active: true,
            created_at: Utc::now(),
            executed_at: None,
        })
    }

    /// Whether the current price satisfies the trigger condition.
    pub fn is_reached(&self, current_price_usd: Decimal) -> bool {
        current_price_usd >= self.target_price_usd
    }

    /// Deactivate after a successful auto-execution.
    pub fn mark_executed(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.executed_at = Some(at);
    }

    /// Deactivate by explicit cancellation. Returns whether a state change
    /// occurred; cancelling an already-inactive order is a no-op.
    pub fn cancel(&mut self) -> bool {
        let changed = self.is_active;
        self.is_active = false;
        changed
    }
}

/// A limit order joined with derived, non-persisted evaluation state.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order: LimitOrder,
    /// True when the last known price meets the target; always false when
    /// no price is known
    pub reached: bool,
}
