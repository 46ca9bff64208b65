//! Buy/sell signal detection over an annotated series.
//!
//! A position flags `Buy` when the close is at or below the lower band and
//! `Sell` when it is at or above the upper band. The lower-bound check
//! runs first, so a zero-volatility band (upper == lower == ma) with the
//! close sitting exactly on it classifies as `Buy`.

use crate::domain::market::series::AnnotatedSeries;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one series position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Signal::Sell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::None => write!(f, "NONE"),
        }
    }
}

/// Derives one signal per position. Pure; retains no state across calls.
///
/// Warm-up positions (no indicator record) are always `None`.
pub fn detect_signals(series: &AnnotatedSeries) -> Vec<Signal> {
    series
        .iter()
        .map(|annotated| match annotated.indicators {
            Some(record) => {
                let close = annotated.candle.close.to_f64().unwrap_or(0.0);
                if close <= record.lower {
                    Signal::Buy
                } else if close >= record.upper {
                    Signal::Sell
                } else {
                    Signal::None
                }
            }
            None => Signal::None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::market_data::indicators::{BandConfig, IndicatorEngine};
    use crate::domain::market::candle::Candle;
    use crate::domain::market::series::{AnnotatedCandle, CandleSeries, IndicatorRecord};
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal_macros::dec;

    fn candle_at(open_time: i64, close: f64) -> Candle {
        let close = Decimal::from_f64(close).unwrap();
        Candle {
            open_time,
            open: close,
            high: close + dec!(1),
            low: close - dec!(1),
            close,
            volume: dec!(10),
        }
    }

    fn annotated(close: f64, record: Option<IndicatorRecord>) -> AnnotatedCandle {
        AnnotatedCandle {
            candle: candle_at(0, close),
            indicators: record,
        }
    }

    fn record(ma: f64, upper: f64, lower: f64) -> IndicatorRecord {
        IndicatorRecord { ma, upper, lower }
    }

    #[test]
    fn test_warmup_positions_are_none() {
        let series = AnnotatedSeries::new(vec![annotated(100.0, None), annotated(101.0, None)]);
        assert_eq!(detect_signals(&series), vec![Signal::None, Signal::None]);
    }

    #[test]
    fn test_close_below_lower_is_buy() {
        let series = AnnotatedSeries::new(vec![annotated(95.0, Some(record(100.0, 104.0, 96.0)))]);
        assert_eq!(detect_signals(&series), vec![Signal::Buy]);
    }

    #[test]
    fn test_close_exactly_on_upper_is_sell() {
        let series = AnnotatedSeries::new(vec![annotated(104.0, Some(record(100.0, 104.0, 96.0)))]);
        assert_eq!(detect_signals(&series), vec![Signal::Sell]);
    }

    #[test]
    fn test_close_inside_band_is_none() {
        let series = AnnotatedSeries::new(vec![annotated(101.0, Some(record(100.0, 104.0, 96.0)))]);
        assert_eq!(detect_signals(&series), vec![Signal::None]);
    }

    #[test]
    fn test_degenerate_band_classifies_as_buy() {
        // Zero volatility: upper == lower == ma == close. The lower bound
        // is checked first, so this is a buy, not a sell.
        let series = AnnotatedSeries::new(vec![annotated(10.0, Some(record(10.0, 10.0, 10.0)))]);
        assert_eq!(detect_signals(&series), vec![Signal::Buy]);
    }

    #[test]
    fn test_flat_series_end_to_end_flags_buy() {
        // 20 identical closes through the real engine, not a hand-built
        // record: the filled window has stddev 0 and flags Buy.
        let candles = (0..20).map(|i| candle_at(60_000 * i, 10.0)).collect();
        let engine = IndicatorEngine::new(BandConfig::default());

        let annotated = engine.annotate(CandleSeries::from_sorted(candles));
        let signals = detect_signals(&annotated);

        assert_eq!(signals.len(), 20);
        assert!(signals[..19].iter().all(|s| *s == Signal::None));
        assert_eq!(signals[19], Signal::Buy);
    }

    #[test]
    fn test_inside_band_after_warmup_end_to_end() {
        // Mixed 50/90 window keeps the band wide; a close of 50 sits
        // inside it and stays unflagged.
        let mut closes = vec![50.0; 10];
        closes.extend(vec![90.0; 10]);
        closes.push(100.0);
        closes.push(50.0);
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| candle_at(60_000 * i as i64, c))
            .collect();
        let engine = IndicatorEngine::new(BandConfig::default());

        let annotated = engine.annotate(CandleSeries::from_sorted(candles));
        let signals = detect_signals(&annotated);

        assert_eq!(*signals.last().unwrap(), Signal::None);
    }
}
