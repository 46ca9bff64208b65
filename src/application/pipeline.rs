//! End-to-end candle pipeline: source -> loader -> indicator engine ->
//! signal detector.
//!
//! One invocation owns its output; chart assembly and persistence only
//! ever see it read-only. The pipeline is source-agnostic: live gateway or
//! stored candles, anything implementing [`CandleSource`].

use crate::application::market_data::indicators::{BandConfig, IndicatorEngine};
use crate::application::market_data::loader::load_series;
use crate::application::market_data::signals::{Signal, detect_signals};
use crate::domain::market::interval::Interval;
use crate::domain::market::series::AnnotatedSeries;
use crate::domain::ports::CandleSource;
use anyhow::{Context, Result};
use tracing::info;

/// Annotated series plus derived signals for one symbol and interval
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub interval: Interval,
    pub series: AnnotatedSeries,
    pub signals: Vec<Signal>,
}

impl MarketSnapshot {
    pub fn buy_count(&self) -> usize {
        self.signals.iter().filter(|s| s.is_buy()).count()
    }

    pub fn sell_count(&self) -> usize {
        self.signals.iter().filter(|s| s.is_sell()).count()
    }
}

/// Runs the core pipeline against a candle source
pub struct MarketPipeline {
    engine: IndicatorEngine,
}

impl MarketPipeline {
    pub fn new(bands: BandConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(bands),
        }
    }

    /// Fetches, validates and annotates one batch of candles.
    ///
    /// Series errors (schema, timestamps, duplicates) bubble up unchanged;
    /// they mean the upstream handed us malformed data.
    pub async fn run(
        &self,
        source: &dyn CandleSource,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<MarketSnapshot> {
        let raw = source
            .fetch_candles(symbol, interval, limit)
            .await
            .with_context(|| format!("Failed to fetch candles from {} source", source.name()))?;

        let series = load_series(raw)
            .with_context(|| format!("Invalid candle batch from {} source", source.name()))?;

        let series = self.engine.annotate(series);
        let signals = detect_signals(&series);
        let snapshot = MarketSnapshot {
            symbol: symbol.to_string(),
            interval,
            series,
            signals,
        };

        info!(
            "Pipeline: {} {} candles from {} ({} buy / {} sell signals)",
            snapshot.symbol,
            snapshot.series.len(),
            source.name(),
            snapshot.buy_count(),
            snapshot.sell_count(),
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockCandleSource;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_pipeline_produces_signals_for_each_candle() {
        let source = MockCandleSource::flat(25, dec!(10));
        let pipeline = MarketPipeline::new(BandConfig::default());

        let snapshot = pipeline
            .run(&source, "BTCUSDT", Interval::OneMin, 25)
            .await
            .unwrap();

        assert_eq!(snapshot.series.len(), 25);
        assert_eq!(snapshot.signals.len(), 25);
        // Flat closes: every filled window collapses its band onto the
        // close, which classifies as a buy.
        assert_eq!(snapshot.buy_count(), 6);
        assert_eq!(snapshot.sell_count(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_surfaces_loader_errors() {
        let source = MockCandleSource::missing_field(5, "low");
        let pipeline = MarketPipeline::new(BandConfig::default());

        let err = pipeline
            .run(&source, "BTCUSDT", Interval::OneMin, 5)
            .await
            .unwrap_err();

        let chain = format!("{:#}", err);
        assert!(chain.contains("missing required field"));
        assert!(chain.contains("low"));
    }
}
