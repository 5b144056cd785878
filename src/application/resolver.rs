//! Price Resolver
//!
//! Walks an ordered chain of price providers until one answers, caches the
//! last quote per token, and writes successful prices back onto the token
//! record. Provider failures of any kind (timeout, malformed body, rate
//! limit) are treated uniformly as "no price from this provider".
//!
//! Callers that can tolerate staleness (display paths) pass a max age and
//! may be served from cache; order evaluation passes `None` and always
//! gets a fresh fetch before any execution decision.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{LedgerError, LedgerResult, Token};
use crate::ports::price_feed::PriceFeed;
use crate::ports::store::LedgerStore;

/// A resolved USD price with its provenance.
#[derive(Debug, Clone)]
pub struct Quote {
    pub price_usd: Decimal,
    /// Name of the provider that answered
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

pub struct PriceResolver {
    providers: Vec<Arc<dyn PriceFeed>>,
    store: Arc<dyn LedgerStore>,
    cache: Mutex<HashMap<i64, Quote>>,
}

impl PriceResolver {
    pub fn new(providers: Vec<Arc<dyn PriceFeed>>, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            providers,
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a USD price for the token.
    ///
    /// With `max_staleness = Some(age)` a cached quote no older than `age`
    /// is returned without any provider call. With `None` the cache is
    /// bypassed. Returns `PriceUnavailable` when every provider fails;
    /// callers must treat that as "price unknown", never as zero.
    pub async fn resolve(
        &self,
        token: &Token,
        max_staleness: Option<Duration>,
    ) -> LedgerResult<Quote> {
        if let Some(tolerance) = max_staleness {
            if let Some(cached) = self.cached(token.id, tolerance).await {
                return Ok(cached);
            }
        }

        for provider in &self.providers {
            let fetched_at = Utc::now();
            match provider.try_fetch(&token.contract_address).await {
                Ok(Some(price_usd)) => {
                    let quote = Quote {
                        price_usd,
                        source: provider.name().to_string(),
                        fetched_at,
                    };
                    self.write_back(token.id, &quote).await?;
                    self.remember(token.id, &quote).await;
                    return Ok(quote);
                }
                Ok(None) => {
                    debug!(
                        provider = provider.name(),
                        token = %token.contract_address,
                        "provider has no price for token"
                    );
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        token = %token.contract_address,
                        error = %e,
                        "price provider failed, trying next"
                    );
                }
            }
        }

        Err(LedgerError::PriceUnavailable(token.contract_address.clone()))
    }

    async fn cached(&self, token_id: i64, tolerance: Duration) -> Option<Quote> {
        let cache = self.cache.lock().await;
        let quote = cache.get(&token_id)?;
        let age = Utc::now().signed_duration_since(quote.fetched_at);
        let tolerance =
            chrono::Duration::from_std(tolerance).unwrap_or(chrono::Duration::MAX);
        if age <= tolerance {
            Some(quote.clone())
        } else {
            None
        }
    }

    /// Cache the quote unless an entry with a newer `fetched_at` is already
    /// present; of two concurrent fetches the slower, older response must
    /// not overwrite the fresher one.
    async fn remember(&self, token_id: i64, quote: &Quote) {
        let mut cache = self.cache.lock().await;
        match cache.get(&token_id) {
            Some(existing) if existing.fetched_at > quote.fetched_at => {}
            _ => {
                cache.insert(token_id, quote.clone());
            }
        }
    }

    /// Persist the price onto the token record. A quote older than the
    /// token's stored sample is discarded so an out-of-order response can
    /// never roll the price back.
    async fn write_back(&self, token_id: i64, quote: &Quote) -> LedgerResult<()> {
        let Some(mut token) = self.store.token_by_id(token_id).await? else {
            return Ok(());
        };
        if token.apply_price(quote.price_usd, quote.fetched_at) {
            self.store.update_token(&token).await?;
        } else {
            debug!(
                token = %token.contract_address,
                "discarding out-of-order price sample"
            );
        }
        Ok(())
    }
}
