//! Jupiter Price Adapter
//!
//! Primary price provider. Queries the Jupiter price API for a token's
//! USD price, keyed by mint address.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::ports::price_feed::{PriceFeed, PriceFeedError};

const JUPITER_PRICE_API: &str = "https://price.jup.ag/v4/price";

#[derive(Debug, Clone)]
pub struct JupiterPriceFeed {
    http: Client,
    api_url: String,
}

impl JupiterPriceFeed {
    pub fn new(timeout: Duration) -> Result<Self, PriceFeedError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url: JUPITER_PRICE_API.to_string(),
        })
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }
}

#[async_trait]
impl PriceFeed for JupiterPriceFeed {
    fn name(&self) -> &str {
        "jupiter"
    }

    async fn try_fetch(&self, contract_address: &str) -> Result<Option<Decimal>, PriceFeedError> {
        let url = format!("{}?ids={}", self.api_url, contract_address);

        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceFeedError::RateLimited);
        }

        let body: PriceResponse = response.json().await?;
        Ok(body.data.get(contract_address).map(|p| p.price))
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: HashMap<String, PriceData>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    price: Decimal,
}
