//! Port interfaces between the core pipeline and the outside world.
//!
//! The pipeline itself is pure; everything that talks to a network or a
//! database sits behind one of these traits so the loader, indicator
//! engine and signal detector stay source-agnostic.

use crate::domain::market::candle::RawCandle;
use crate::domain::market::interval::Interval;
use crate::domain::market::series::AnnotatedCandle;
use anyhow::Result;
use async_trait::async_trait;

/// A provider of raw candle records.
///
/// Implemented both by the live market data gateway and by the stored
/// candle repository, so callers choose a source without the downstream
/// pipeline noticing. Records come back untouched; validation belongs to
/// the series loader.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Short identifier for logs ("binance", "stored")
    fn name(&self) -> &'static str;

    /// Fetches up to `limit` most recent candles in chronological order
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>>;
}

/// Repository for annotated candles.
///
/// Writes are upserts keyed by (symbol, interval, open_time); candles are
/// append/replace-by-timestamp and never need multi-record transactions.
#[async_trait]
pub trait CandleRepository: Send + Sync {
    /// Inserts or replaces a batch of annotated candles, returning the
    /// number of rows written
    async fn upsert_batch(
        &self,
        symbol: &str,
        interval: Interval,
        candles: &[AnnotatedCandle],
    ) -> Result<u64>;

    /// Fetches the `limit` most recent stored candles for the pair,
    /// oldest first
    async fn fetch_recent(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>>;
}
