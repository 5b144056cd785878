//! Transaction Records
//!
//! Append-only records of executed buy/sell events. Nothing mutates a
//! transaction after creation except the status transition.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxKind::Buy => write!(f, "BUY"),
            TxKind::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Awaiting settlement by an external layer (sells)
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Completed => write!(f, "completed"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub wallet_id: i64,
    pub token_id: i64,
    pub kind: TxKind,
    /// SOL spent (buy) or SOL proceeds (sell)
    pub amount_sol: Decimal,
    pub token_quantity: Decimal,
    pub price_per_token_sol: Decimal,
    /// Advisory take-profit percentage; not enforced by the ledger
    pub take_profit_pct: Option<Decimal>,
    /// Advisory stop-loss percentage; not enforced by the ledger
    pub stop_loss_pct: Option<Decimal>,
    pub status: TxStatus,
    pub created_at: DateTime<Utc>,
}
