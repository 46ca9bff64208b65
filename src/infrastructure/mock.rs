//! In-memory test doubles for the candle source and repository ports.

use crate::domain::market::candle::{RawCandle, RawTimestamp};
use crate::domain::market::interval::Interval;
use crate::domain::market::series::AnnotatedCandle;
use crate::domain::ports::{CandleRepository, CandleSource};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// `count` well-formed raw candles, one minute apart, all at `close`
pub fn flat_batch(count: usize, close: Decimal) -> Vec<RawCandle> {
    (0..count)
        .map(|i| RawCandle {
            open_time: Some(RawTimestamp::Millis(60_000 * i as i64)),
            open: Some(close),
            high: Some(close + Decimal::ONE),
            low: Some(close - Decimal::ONE),
            close: Some(close),
            volume: Some(Decimal::from(100)),
        })
        .collect()
}

/// Candle source returning a canned batch
#[derive(Clone)]
pub struct MockCandleSource {
    records: Vec<RawCandle>,
}

impl MockCandleSource {
    pub fn new(records: Vec<RawCandle>) -> Self {
        Self { records }
    }

    /// `count` well-formed candles, one minute apart, all at `close`
    pub fn flat(count: usize, close: Decimal) -> Self {
        Self::new(flat_batch(count, close))
    }

    /// A flat batch with one required field blanked out of every record
    pub fn missing_field(count: usize, field: &str) -> Self {
        let mut source = Self::flat(count, Decimal::from(100));
        for record in &mut source.records {
            match field {
                "open_time" => record.open_time = None,
                "open" => record.open = None,
                "high" => record.high = None,
                "low" => record.low = None,
                "close" => record.close = None,
                other => panic!("unknown field {}", other),
            }
        }
        source
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_candles(
        &self,
        _symbol: &str,
        _interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

/// Thread-safe in-memory candle repository keyed like the SQLite one
#[derive(Default)]
pub struct InMemoryCandleRepository {
    rows: Arc<RwLock<BTreeMap<(String, String, i64), AnnotatedCandle>>>,
}

impl InMemoryCandleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CandleRepository for InMemoryCandleRepository {
    async fn upsert_batch(
        &self,
        symbol: &str,
        interval: Interval,
        candles: &[AnnotatedCandle],
    ) -> Result<u64> {
        let mut rows = self.rows.write().await;
        for annotated in candles {
            rows.insert(
                (
                    symbol.to_string(),
                    interval.as_str().to_string(),
                    annotated.candle.open_time,
                ),
                annotated.clone(),
            );
        }
        Ok(candles.len() as u64)
    }

    async fn fetch_recent(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>> {
        let rows = self.rows.read().await;
        let mut matching: Vec<&AnnotatedCandle> = rows
            .iter()
            .filter(|((s, i, _), _)| s == symbol && i == interval.as_str())
            .map(|(_, annotated)| annotated)
            .collect();

        // BTreeMap iteration is already time-ordered; keep the newest
        let skip = matching.len().saturating_sub(limit);
        let records = matching
            .split_off(skip)
            .into_iter()
            .map(|annotated| RawCandle {
                open_time: Some(RawTimestamp::Millis(annotated.candle.open_time)),
                open: Some(annotated.candle.open),
                high: Some(annotated.candle.high),
                low: Some(annotated.candle.low),
                close: Some(annotated.candle.close),
                volume: Some(annotated.candle.volume),
            })
            .collect();
        Ok(records)
    }
}
