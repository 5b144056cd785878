//! Token Holdings
//!
//! A holding is a wallet's current position in one token, unique per
//! (wallet, token) pair. All cost-basis arithmetic lives here so the
//! weighted-average invariant can be tested in isolation:
//!
//! `avg' = (q * avg + q_new * p_new) / (q + q_new)`

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub id: i64,
    pub wallet_id: i64,
    pub token_id: i64,
    /// Token quantity held; never negative, record deleted at exactly zero
    pub quantity: Decimal,
    /// Weighted-average purchase price per token in SOL
    pub avg_cost_sol: Decimal,
    /// Total USD paid across buys, when a USD price was known at buy time
    pub cost_basis_usd: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of reducing a holding by a sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellEffect {
    /// Quantity reached exactly zero; delete the record
    Emptied,
    /// Quantity remains; update the record in place
    Reduced,
}

impl Holding {
    /// Open a new holding from the first buy.
    pub fn open(
        id: i64,
        wallet_id: i64,
        token_id: i64,
        quantity: Decimal,
        price_per_token_sol: Decimal,
        usd_value: Option<Decimal>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            wallet_id,
            token_id,
            quantity,
            avg_cost_sol: price_per_token_sol,
            cost_basis_usd: usd_value,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold a subsequent buy into the position, recomputing the
    /// quantity-weighted average cost. `usd_value` is the USD paid for this
    /// buy if a price was known; it accumulates into the cost basis.
    pub fn apply_buy(
        &mut self,
        quantity: Decimal,
        price_per_token_sol: Decimal,
        usd_value: Option<Decimal>,
    ) {
        let current_value = self.quantity * self.avg_cost_sol;
        let new_value = quantity * price_per_token_sol;
        let total_quantity = self.quantity + quantity;

        self.avg_cost_sol = (current_value + new_value) / total_quantity;
        self.quantity = total_quantity;
        if let Some(value) = usd_value {
            self.cost_basis_usd = Some(self.cost_basis_usd.unwrap_or_default() + value);
        }
        self.updated_at = Utc::now();
    }

    /// Reduce the position by a sell. The average cost is never changed by
    /// a sell; the USD cost basis shrinks proportionally to the fraction
    /// sold. Overdraw is rejected and leaves the holding untouched.
    pub fn apply_sell(&mut self, quantity: Decimal) -> LedgerResult<SellEffect> {
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "sell quantity must be positive, got {quantity}"
            )));
        }
        if quantity > self.quantity {
            return Err(LedgerError::InsufficientQuantity {
                available: self.quantity,
                required: quantity,
            });
        }

        let fraction_kept = (self.quantity - quantity) / self.quantity;
        self.quantity -= quantity;
        if let Some(basis) = self.cost_basis_usd {
            self.cost_basis_usd = Some(basis * fraction_kept);
        }
        self.updated_at = Utc::now();

        if self.quantity.is_zero() {
            Ok(SellEffect::Emptied)
        } else {
            Ok(SellEffect::Reduced)
        }
    }

    /// SOL proceeds for selling `quantity` tokens, valued at the holding's
    /// average cost rather than live market price (internal-ledger model).
    pub fn proceeds_at_cost(&self, quantity: Decimal) -> Decimal {
        quantity * self.avg_cost_sol
    }
}
