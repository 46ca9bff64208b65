//! Chart assembly boundary.
//!
//! Turns a pipeline snapshot into the flat, serializable shapes a
//! candlestick renderer consumes: candle points, the three indicator
//! polylines and the buy/sell markers, plus the summary block the
//! dashboard shows next to the chart. Rendering itself happens elsewhere;
//! this module never mutates the snapshot it reads.

use crate::application::market_data::signals::Signal;
use crate::application::pipeline::MarketSnapshot;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One candlestick on the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlePoint {
    pub open_time_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// One vertex of an indicator polyline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub open_time_ms: i64,
    pub value: f64,
}

/// A buy or sell marker anchored at the candle close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMarker {
    pub open_time_ms: i64,
    pub close: Decimal,
    pub signal: Signal,
}

/// Headline numbers shown beside the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub last_close: Option<Decimal>,
    pub last_ma: Option<f64>,
    pub last_upper: Option<f64>,
    pub last_lower: Option<f64>,
    pub total_points: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
}

/// Everything a renderer needs for one chart, read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub symbol: String,
    pub interval: String,
    pub candles: Vec<CandlePoint>,
    pub ma_line: Vec<LinePoint>,
    pub upper_band: Vec<LinePoint>,
    pub lower_band: Vec<LinePoint>,
    pub buy_markers: Vec<SignalMarker>,
    pub sell_markers: Vec<SignalMarker>,
    pub summary: ChartSummary,
}

impl ChartView {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let mut candles = Vec::with_capacity(snapshot.series.len());
        let mut ma_line = Vec::new();
        let mut upper_band = Vec::new();
        let mut lower_band = Vec::new();
        let mut buy_markers = Vec::new();
        let mut sell_markers = Vec::new();

        for (annotated, signal) in snapshot.series.iter().zip(&snapshot.signals) {
            let candle = &annotated.candle;
            candles.push(CandlePoint {
                open_time_ms: candle.open_time,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
            });

            // Warm-up positions have no indicator vertex; the polylines
            // simply start where the window first fills.
            if let Some(record) = annotated.indicators {
                ma_line.push(LinePoint {
                    open_time_ms: candle.open_time,
                    value: record.ma,
                });
                upper_band.push(LinePoint {
                    open_time_ms: candle.open_time,
                    value: record.upper,
                });
                lower_band.push(LinePoint {
                    open_time_ms: candle.open_time,
                    value: record.lower,
                });
            }

            let marker = SignalMarker {
                open_time_ms: candle.open_time,
                close: candle.close,
                signal: *signal,
            };
            match signal {
                Signal::Buy => buy_markers.push(marker),
                Signal::Sell => sell_markers.push(marker),
                Signal::None => {}
            }
        }

        let last = snapshot.series.last();
        let summary = ChartSummary {
            last_close: last.map(|a| a.candle.close),
            last_ma: last.and_then(|a| a.indicators).map(|r| r.ma),
            last_upper: last.and_then(|a| a.indicators).map(|r| r.upper),
            last_lower: last.and_then(|a| a.indicators).map(|r| r.lower),
            total_points: snapshot.series.len(),
            buy_signals: buy_markers.len(),
            sell_signals: sell_markers.len(),
        };

        Self {
            symbol: snapshot.symbol.clone(),
            interval: snapshot.interval.to_string(),
            candles,
            ma_line,
            upper_band,
            lower_band,
            buy_markers,
            sell_markers,
            summary,
        }
    }

    /// Plain-text rendering of the summary block for the CLI monitor
    pub fn summary_lines(&self) -> Vec<String> {
        let fmt_price = |value: Option<Decimal>| match value {
            Some(v) => format!("${:.2}", v.to_f64().unwrap_or(0.0)),
            None => "-".to_string(),
        };
        let fmt_level = |value: Option<f64>| match value {
            Some(v) => format!("${:.2}", v),
            None => "- (warming up)".to_string(),
        };

        vec![
            format!("{} ({})", self.symbol, self.interval),
            format!("Last Close Price: {}", fmt_price(self.summary.last_close)),
            format!("Upper Band:       {}", fmt_level(self.summary.last_upper)),
            format!("Lower Band:       {}", fmt_level(self.summary.last_lower)),
            format!("MA20:             {}", fmt_level(self.summary.last_ma)),
            format!("Total Data Points: {}", self.summary.total_points),
            format!("Buy Signals:       {}", self.summary.buy_signals),
            format!("Sell Signals:      {}", self.summary.sell_signals),
        ]
    }
}
