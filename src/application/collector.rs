//! Background candle collector.
//!
//! Periodically pulls fresh candles from the live source, runs them
//! through the loader and indicator engine, and upserts the annotated
//! result into the repository. One cycle per tick; a failed cycle is
//! logged and retried on the next tick. The loop exits cleanly when the
//! shutdown flag flips, so the binary can tie it to Ctrl-C.

use crate::application::market_data::indicators::{BandConfig, IndicatorEngine};
use crate::application::market_data::loader::load_series;
use crate::domain::market::interval::Interval;
use crate::domain::ports::{CandleRepository, CandleSource};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Outcome of one collection cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CollectReport {
    pub fetched: usize,
    pub persisted: u64,
    pub last_close: Option<Decimal>,
}

pub struct Collector {
    source: Arc<dyn CandleSource>,
    repository: Arc<dyn CandleRepository>,
    engine: IndicatorEngine,
    symbol: String,
    interval: Interval,
    limit: usize,
    period: Duration,
}

impl Collector {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn CandleSource>,
        repository: Arc<dyn CandleRepository>,
        bands: BandConfig,
        symbol: String,
        interval: Interval,
        limit: usize,
        period: Duration,
    ) -> Self {
        Self {
            source,
            repository,
            engine: IndicatorEngine::new(bands),
            symbol,
            interval,
            limit,
            period,
        }
    }

    /// Fetch, annotate and persist one batch
    pub async fn collect_once(&self) -> Result<CollectReport> {
        let raw = self
            .source
            .fetch_candles(&self.symbol, self.interval, self.limit)
            .await
            .with_context(|| format!("Failed to fetch candles for {}", self.symbol))?;
        let fetched = raw.len();

        let series = load_series(raw)
            .with_context(|| format!("Invalid candle batch for {}", self.symbol))?;
        let annotated = self.engine.annotate(series);

        let persisted = self
            .repository
            .upsert_batch(&self.symbol, self.interval, annotated.candles())
            .await
            .context("Failed to persist annotated candles")?;

        let last_close = annotated.last().map(|a| a.candle.close);
        if let Some(last) = annotated.last() {
            info!(
                "Collector: {} @ ${} ({})",
                self.symbol,
                last.candle.close,
                last.candle.open_time_utc()
            );
        }

        Ok(CollectReport {
            fetched,
            persisted,
            last_close,
        })
    }

    /// Runs collection cycles until `shutdown` flips to true.
    ///
    /// The first cycle fires immediately; later ones follow the configured
    /// period. Cycle failures never abort the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Collector started: {} {} every {}s",
            self.symbol,
            self.interval,
            self.period.as_secs()
        );
        let mut ticker = tokio::time::interval(self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.collect_once().await {
                        Ok(report) => info!(
                            "Collector cycle done: fetched {}, persisted {}",
                            report.fetched, report.persisted
                        ),
                        Err(e) => error!("Collector cycle failed: {:#}", e),
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown too
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Collector shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }
}
