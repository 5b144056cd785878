//! Price Feed Port
//!
//! One implementation per external price provider. The resolver walks an
//! ordered chain of these, treating every failure mode uniformly as
//! "no price from this provider" and moving on to the next one.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceFeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Provider name, recorded as the price source
    fn name(&self) -> &str;

    /// Fetch the current USD price for a contract address.
    /// `Ok(None)` means the provider answered but has no price for this
    /// token; `Err` means the call itself failed. Callers treat both as
    /// "try the next provider".
    async fn try_fetch(&self, contract_address: &str) -> Result<Option<Decimal>, PriceFeedError>;
}
