//! Binance market data gateway.
//!
//! Fetches historical candles (klines) from the public REST API. The
//! response is passed through as raw records; schema and timestamp
//! validation belong to the series loader, not this gateway.

use crate::config::BinanceConfig;
use crate::domain::market::candle::{RawCandle, RawTimestamp};
use crate::domain::market::interval::Interval;
use crate::domain::ports::CandleSource;
use crate::infrastructure::core::http_client_factory::{endpoint_with_query, market_data_client};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

/// Binance allows at most 1000 klines per request
const MAX_KLINES_LIMIT: usize = 1000;

pub struct BinanceCandleSource {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl BinanceCandleSource {
    pub fn new(config: &BinanceConfig) -> Self {
        Self {
            client: market_data_client(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>> {
        let limit = limit.min(MAX_KLINES_LIMIT);
        let url = endpoint_with_query(
            &format!("{}/api/v3/klines", self.base_url),
            &[
                ("symbol", symbol.to_uppercase()),
                ("interval", interval.as_str().to_string()),
                ("limit", limit.to_string()),
            ],
        )?;

        info!(
            "BinanceCandleSource: fetching {} {} klines (limit={})",
            symbol, interval, limit
        );

        let mut request = self.client.get(url);
        if !self.api_key.is_empty() {
            request = request.header("X-MBX-APIKEY", &self.api_key);
        }

        let response = request
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Binance klines fetch failed ({}): {}", status, error_text);
        }

        // Kline format: [open_time, open, high, low, close, volume, ...]
        let klines: Vec<Vec<serde_json::Value>> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        let records = klines.iter().map(|entry| raw_from_kline(entry)).collect();
        Ok(records)
    }
}

/// Maps one kline array onto a raw record, leaving absent or unparseable
/// fields as `None` for the loader to reject with a proper schema error.
fn raw_from_kline(entry: &[serde_json::Value]) -> RawCandle {
    let decimal_at = |index: usize| {
        entry
            .get(index)
            .and_then(|v| v.as_str())
            .and_then(|s| Decimal::from_str(s).ok())
    };

    RawCandle {
        open_time: entry
            .first()
            .and_then(|v| v.as_i64())
            .map(RawTimestamp::Millis),
        open: decimal_at(1),
        high: decimal_at(2),
        low: decimal_at(3),
        close: decimal_at(4),
        volume: decimal_at(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_raw_from_kline_maps_fields() {
        let entry = json!([
            1704067200000_i64,
            "42000.50",
            "42100.00",
            "41900.25",
            "42050.75",
            "148.11427815",
            1704067259999_i64,
            "6224190.55",
            308,
            "75.87402397",
            "3189058.46",
            "0"
        ]);

        let raw = raw_from_kline(entry.as_array().unwrap());

        assert_eq!(raw.open_time, Some(RawTimestamp::Millis(1_704_067_200_000)));
        assert_eq!(raw.open, Some(dec!(42000.50)));
        assert_eq!(raw.high, Some(dec!(42100.00)));
        assert_eq!(raw.low, Some(dec!(41900.25)));
        assert_eq!(raw.close, Some(dec!(42050.75)));
        assert_eq!(raw.volume, Some(dec!(148.11427815)));
    }

    #[test]
    fn test_short_kline_leaves_fields_missing() {
        let entry = json!([1704067200000_i64, "42000.50"]);

        let raw = raw_from_kline(entry.as_array().unwrap());

        assert!(raw.open.is_some());
        assert!(raw.high.is_none());
        assert!(raw.close.is_none());
    }

    #[test]
    fn test_non_numeric_price_left_missing() {
        let entry = json!([1704067200000_i64, "not-a-price", "42100", "41900", "42050"]);

        let raw = raw_from_kline(entry.as_array().unwrap());

        assert!(raw.open.is_none());
        assert_eq!(raw.close, Some(dec!(42050)));
    }
}
