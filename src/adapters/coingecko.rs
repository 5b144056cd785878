//! CoinGecko Price Adapter
//!
//! Fallback price provider behind Jupiter. Uses the simple token-price
//! endpoint for Solana contract addresses; only well-known tokens are
//! listed there, so `None` answers are common and expected.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ports::price_feed::{PriceFeed, PriceFeedError};

const COINGECKO_API: &str = "https://api.coingecko.com/api/v3/simple/token_price/solana";

#[derive(Debug, Clone)]
pub struct CoinGeckoPriceFeed {
    http: Client,
    api_url: String,
}

impl CoinGeckoPriceFeed {
    pub fn new(timeout: Duration) -> Result<Self, PriceFeedError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: COINGECKO_API.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoPriceFeed {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn try_fetch(&self, contract_address: &str) -> Result<Option<Decimal>, PriceFeedError> {
        let url = format!(
            "{}?contract_addresses={}&vs_currencies=usd",
            self.api_url, contract_address
        );

        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceFeedError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(PriceFeedError::Parse(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body: HashMap<String, VsPrices> = response.json().await?;
        Ok(body.get(contract_address).map(|p| p.usd))
    }
}

#[derive(Debug, Deserialize)]
struct VsPrices {
    usd: Decimal,
}
