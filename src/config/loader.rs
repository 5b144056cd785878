//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::application::ledger::RateModel;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rates: RatesSection,
    pub providers: ProvidersSection,
    #[serde(default)]
    pub engine: EngineSection,
    pub logging: LoggingSection,
}

/// Exchange-rate configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct RatesSection {
    /// SOL/USD rate used to convert a SOL spend into a USD cost basis
    pub sol_price_usd: f64,
    /// Flat tokens-per-SOL rate applied when a token has no USD price
    pub default_tokens_per_sol: f64,
}

/// Price-provider configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersSection {
    /// Jupiter price API base URL (primary provider)
    pub jupiter_api_url: String,
    /// CoinGecko token-price API base URL (fallback provider)
    pub coingecko_api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Delay between evaluation passes in the run loop
    pub poll_interval_secs: u64,
}

impl ProvidersSection {
    /// Get Jupiter API URL with environment variable override
    /// Checks JUPITER_PRICE_API_URL env var first, falls back to config value
    pub fn get_jupiter_api_url(&self) -> String {
        std::env::var("JUPITER_PRICE_API_URL").unwrap_or_else(|_| self.jupiter_api_url.clone())
    }
}

/// Engine tuning section (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// How stale a cached price may be on display paths, in seconds.
    /// Evaluation paths always fetch fresh regardless of this value.
    #[serde(default = "default_display_staleness_secs")]
    pub display_staleness_secs: u64,
}

fn default_display_staleness_secs() -> u64 {
    30
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            display_staleness_secs: default_display_staleness_secs(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rates.sol_price_usd.is_finite() || self.rates.sol_price_usd <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "sol_price_usd must be > 0, got {}",
                self.rates.sol_price_usd
            )));
        }

        if !self.rates.default_tokens_per_sol.is_finite()
            || self.rates.default_tokens_per_sol <= 0.0
        {
            return Err(ConfigError::ValidationError(format!(
                "default_tokens_per_sol must be > 0, got {}",
                self.rates.default_tokens_per_sol
            )));
        }

        if self.providers.jupiter_api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "jupiter_api_url cannot be empty".to_string(),
            ));
        }

        if self.providers.coingecko_api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "coingecko_api_url cannot be empty".to_string(),
            ));
        }

        if self.providers.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.providers.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The exchange-rate model the ledger runs with. Fails on rate values
    /// that do not survive the float-to-decimal conversion.
    pub fn rate_model(&self) -> Result<RateModel, ConfigError> {
        let sol_price_usd = Decimal::from_f64(self.rates.sol_price_usd).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "sol_price_usd is not representable: {}",
                self.rates.sol_price_usd
            ))
        })?;
        let default_tokens_per_sol = Decimal::from_f64(self.rates.default_tokens_per_sol)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "default_tokens_per_sol is not representable: {}",
                    self.rates.default_tokens_per_sol
                ))
            })?;
        Ok(RateModel {
            sol_price_usd,
            default_tokens_per_sol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[rates]
sol_price_usd = 150.0
default_tokens_per_sol = 1000.0

[providers]
jupiter_api_url = "https://price.jup.ag/v4/price"
coingecko_api_url = "https://api.coingecko.com/api/v3/simple/token_price/solana"
request_timeout_secs = 10
poll_interval_secs = 30

[engine]
display_staleness_secs = 30

[logging]
level = "info"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.rates.sol_price_usd, 150.0);
        assert_eq!(config.providers.request_timeout_secs, 10);
        assert_eq!(config.engine.display_staleness_secs, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_invalid_sol_price() {
        let invalid_config = r#"
[rates]
sol_price_usd = 0.0
default_tokens_per_sol = 1000.0

[providers]
jupiter_api_url = "https://price.jup.ag/v4/price"
coingecko_api_url = "https://api.coingecko.com/api/v3/simple/token_price/solana"
request_timeout_secs = 10
poll_interval_secs = 30

[logging]
level = "info"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid_config.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_empty_provider_url() {
        let invalid_config = r#"
[rates]
sol_price_usd = 150.0
default_tokens_per_sol = 1000.0

[providers]
jupiter_api_url = ""
coingecko_api_url = "https://api.coingecko.com/api/v3/simple/token_price/solana"
request_timeout_secs = 10
poll_interval_secs = 30

[logging]
level = "info"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid_config.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_engine_section_optional() {
        let config_without_engine = r#"
[rates]
sol_price_usd = 150.0
default_tokens_per_sol = 1000.0

[providers]
jupiter_api_url = "https://price.jup.ag/v4/price"
coingecko_api_url = "https://api.coingecko.com/api/v3/simple/token_price/solana"
request_timeout_secs = 10
poll_interval_secs = 30

[logging]
level = "info"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(config_without_engine.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.engine.display_staleness_secs, 30);
    }

    #[test]
    fn test_rate_model_conversion() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        let rates = config.rate_model().unwrap();
        assert_eq!(rates.sol_price_usd, dec!(150));
        assert_eq!(rates.default_tokens_per_sol, dec!(1000));
    }
}
