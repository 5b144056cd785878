//! Token Records
//!
//! A token is created lazily the first time any buy, sell, or limit-order
//! request references its contract address. Identity (`contract_address`)
//! is immutable once created; only the price fields are refreshed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default decimals for SPL tokens when metadata is unavailable
pub const DEFAULT_TOKEN_DECIMALS: u32 = 9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    /// Unique mint/contract address on Solana
    pub contract_address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: u32,
    /// Last resolved USD price; `None` until a provider has answered
    pub price_usd: Option<Decimal>,
    /// When `price_usd` was fetched; used for the out-of-order discard rule
    pub price_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Minimal token record for a contract address with no metadata.
    pub fn minimal(id: i64, contract_address: &str) -> Self {
        Self {
            id,
            contract_address: contract_address.to_string(),
            name: None,
            symbol: None,
            decimals: DEFAULT_TOKEN_DECIMALS,
            price_usd: None,
            price_updated_at: None,
            created_at: Utc::now(),
        }
    }

    /// Apply a freshly fetched price. Returns false (and leaves the record
    /// untouched) when the sample is older than the stored one; price is
    /// refreshed monotonically forward, never rolled back by a late response.
    pub fn apply_price(&mut self, price_usd: Decimal, fetched_at: DateTime<Utc>) -> bool {
        if let Some(current) = self.price_updated_at {
            if fetched_at < current {
                return false;
            }
        }
        self.price_usd = Some(price_usd);
        self.price_updated_at = Some(fetched_at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minimal_token_defaults() {
        let token = Token::minimal(1, "So11111111111111111111111111111111111111112");
        assert_eq!(token.decimals, DEFAULT_TOKEN_DECIMALS);
        assert!(token.price_usd.is_none());
        assert!(token.price_updated_at.is_none());
    }

    #[test]
    fn test_apply_price_forward() {
        let mut token = Token::minimal(1, "mint");
        let t0 = Utc::now();
        assert!(token.apply_price(dec!(1.50), t0));
        assert_eq!(token.price_usd, Some(dec!(1.50)));

        let t1 = t0 + Duration::seconds(5);
        assert!(token.apply_price(dec!(1.60), t1));
        assert_eq!(token.price_usd, Some(dec!(1.60)));
    }

    #[test]
    fn test_apply_price_discards_stale_sample() {
        let mut token = Token::minimal(1, "mint");
        let t0 = Utc::now();
        token.apply_price(dec!(2.00), t0);

        // A response fetched before the stored sample must be discarded
        let stale = t0 - Duration::seconds(30);
        assert!(!token.apply_price(dec!(1.00), stale));
        assert_eq!(token.price_usd, Some(dec!(2.00)));
        assert_eq!(token.price_updated_at, Some(t0));
    }
}
