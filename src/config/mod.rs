//! Configuration module for bandwatch.
//!
//! Structured configuration loading from environment variables, organized
//! by concern: market data gateway, database, monitor defaults and band
//! parameters. The config object is built once at the binary edge and
//! passed into whatever needs it; there is no process-wide singleton.

use crate::application::market_data::indicators::BandConfig;
use crate::domain::market::interval::Interval;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Binance API configuration
#[derive(Debug, Clone, Default)]
pub struct BinanceConfig {
    pub base_url: String,
    /// Optional; the klines endpoint is public
    pub api_key: String,
}

impl BinanceConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("BINANCE_BASE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            api_key: env::var("BINANCE_API_KEY").unwrap_or_default(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub binance: BinanceConfig,
    pub database_url: String,

    // Monitor and collector defaults, overridable per CLI invocation
    pub symbol: String,
    pub interval: Interval,
    pub data_limit: usize,
    pub update_interval_secs: u64,

    pub bands: BandConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let interval_raw = env::var("DEFAULT_INTERVAL").unwrap_or_else(|_| "1m".to_string());
        let interval = Interval::from_str(&interval_raw)
            .with_context(|| format!("Invalid DEFAULT_INTERVAL: {}", interval_raw))?;

        Ok(Self {
            binance: BinanceConfig::from_env(),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/bandwatch.db".to_string()),
            symbol: env::var("DEFAULT_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            interval,
            data_limit: parse_env("DATA_LIMIT", 100)?,
            update_interval_secs: parse_env("UPDATE_INTERVAL", 60)?,
            bands: BandConfig {
                window: parse_env("BAND_WINDOW", 20)?,
                multiplier: parse_env("BAND_MULTIPLIER", 2.0)?,
            },
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid {}: {}", key, value)),
        Err(_) => Ok(default),
    }
}
