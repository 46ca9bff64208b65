//! Bollinger band engine.
//!
//! Annotates a candle series with a simple moving average and the
//! upper/lower volatility bands over a fixed trailing window of closes.
//! Positions before the window fills carry no indicator record; that
//! warm-up prefix is part of the contract, not an error.
//!
//! The pass is O(1) amortized per candle: a running sum and sum of squares
//! slide over the closes instead of re-averaging each window. The standard
//! deviation is the population form (denominator = window), the
//! conventional Bollinger definition.

use crate::domain::errors::SeriesError;
use crate::domain::market::series::{AnnotatedCandle, AnnotatedSeries, CandleSeries, IndicatorRecord};
use rust_decimal::prelude::ToPrimitive;

/// Bollinger parameters for one engine invocation.
///
/// Passed per invocation; there is no process-wide default beyond
/// `Default::default()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandConfig {
    /// Trailing window length in candles
    pub window: usize,
    /// Band width in population standard deviations
    pub multiplier: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            window: 20,
            multiplier: 2.0,
        }
    }
}

/// Computes indicator records for candle series
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEngine {
    config: BandConfig,
}

impl IndicatorEngine {
    pub fn new(config: BandConfig) -> Self {
        assert!(config.window >= 1, "band window must be at least 1");
        Self { config }
    }

    pub fn config(&self) -> BandConfig {
        self.config
    }

    /// Annotates the series, leaving the warm-up prefix undefined.
    ///
    /// Output has the same length and candle order as the input. Running
    /// the engine twice over the same series yields identical output.
    pub fn annotate(&self, series: CandleSeries) -> AnnotatedSeries {
        let window = self.config.window;
        let closes: Vec<f64> = series
            .iter()
            .map(|c| c.close.to_f64().unwrap_or(0.0))
            .collect();

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut annotated = Vec::with_capacity(closes.len());

        for (i, candle) in series.into_candles().into_iter().enumerate() {
            sum += closes[i];
            sum_sq += closes[i] * closes[i];

            if i >= window {
                let leaving = closes[i - window];
                sum -= leaving;
                sum_sq -= leaving * leaving;
            }

            let indicators = if i + 1 >= window {
                let w = window as f64;
                let ma = sum / w;
                // Rounding can push the difference a hair below zero.
                let variance = (sum_sq / w - ma * ma).max(0.0);
                let stddev = variance.sqrt();

                Some(IndicatorRecord {
                    ma,
                    upper: ma + self.config.multiplier * stddev,
                    lower: ma - self.config.multiplier * stddev,
                })
            } else {
                None
            };

            annotated.push(AnnotatedCandle { candle, indicators });
        }

        AnnotatedSeries::new(annotated)
    }

    /// Annotates and demands at least one fully populated window.
    ///
    /// Callers that cannot work with a warm-up-only series (every position
    /// undefined) use this instead of [`annotate`](Self::annotate).
    pub fn annotate_strict(&self, series: CandleSeries) -> Result<AnnotatedSeries, SeriesError> {
        if series.len() < self.config.window {
            return Err(SeriesError::InsufficientData {
                len: series.len(),
                window: self.config.window,
            });
        }
        Ok(self.annotate(series))
    }
}
