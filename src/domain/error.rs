//! Ledger Error Taxonomy
//!
//! Every operation in the ledger core surfaces one of these variants.
//! Each variant maps to a stable kind string (for API consumers) plus a
//! human-readable message via `Display`.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Wallet SOL balance is lower than the requested spend
    #[error("Insufficient SOL balance: have {available}, need {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },

    /// Sell quantity exceeds the held quantity
    #[error("Insufficient token quantity: have {available}, need {required}")]
    InsufficientQuantity {
        available: Decimal,
        required: Decimal,
    },

    /// Holding does not exist or belongs to another wallet
    #[error("Token holding not found: {0}")]
    HoldingNotFound(i64),

    /// Cancel/lookup of a limit order id that was never created
    #[error("Limit order not found: {0}")]
    OrderNotFound(i64),

    /// Wallet id unknown to the custody collaborator
    #[error("Wallet not found: {0}")]
    WalletNotFound(i64),

    /// Zero or negative amount/quantity/price supplied by the caller
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// All configured price providers failed; recoverable, callers may retry
    #[error("No price available for token: {0}")]
    PriceUnavailable(String),

    /// Opaque passthrough from the storage collaborator
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// Stable machine-readable error kind, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::InsufficientQuantity { .. } => "insufficient_quantity",
            LedgerError::HoldingNotFound(_) => "holding_not_found",
            LedgerError::OrderNotFound(_) => "order_not_found",
            LedgerError::WalletNotFound(_) => "wallet_not_found",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::PriceUnavailable(_) => "price_unavailable",
            LedgerError::Persistence(_) => "persistence_failure",
        }
    }

    /// Whether the caller may retry the same operation later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LedgerError::PriceUnavailable(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_strings_are_stable() {
        let err = LedgerError::InsufficientBalance {
            available: dec!(1),
            required: dec!(2),
        };
        assert_eq!(err.kind(), "insufficient_balance");
        assert_eq!(LedgerError::OrderNotFound(7).kind(), "order_not_found");
        assert_eq!(
            LedgerError::PriceUnavailable("mint".into()).kind(),
            "price_unavailable"
        );
    }

    #[test]
    fn test_only_price_unavailable_is_recoverable() {
        assert!(LedgerError::PriceUnavailable("mint".into()).is_recoverable());
        assert!(!LedgerError::HoldingNotFound(1).is_recoverable());
        assert!(!LedgerError::Persistence("db down".into()).is_recoverable());
    }

    #[test]
    fn test_display_includes_amounts() {
        let err = LedgerError::InsufficientQuantity {
            available: dec!(10),
            required: dec!(25),
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("25"));
    }
}
