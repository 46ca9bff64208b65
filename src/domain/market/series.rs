use crate::domain::market::candle::Candle;
use serde::{Deserialize, Serialize};

/// Validated, chronologically ordered candle sequence.
///
/// Construction goes through the series loader, so holders can rely on
/// strictly increasing `open_time` and exchange-valid prices. The series is
/// read-only for consumers; the indicator engine produces a new
/// [`AnnotatedSeries`] instead of mutating candles in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Wraps candles that are already sorted and deduplicated.
    ///
    /// Only the loader (and tests building fixtures by hand) should call
    /// this; it does not re-validate the ordering invariant.
    pub fn from_sorted(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }
}

/// Bollinger values derived for one position of a series.
///
/// Values are `f64` because they come out of the statistics pass; prices
/// stay `Decimal`. Present only once the trailing window is filled, and
/// `lower <= ma <= upper` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub ma: f64,
    pub upper: f64,
    pub lower: f64,
}

/// A candle paired with its derived indicator record, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedCandle {
    pub candle: Candle,
    /// `None` during the warm-up prefix (fewer candles than the window)
    pub indicators: Option<IndicatorRecord>,
}

/// Candle series with indicator annotations attached.
///
/// Same length and order as the series it was derived from. Owned by the
/// pipeline invocation that produced it; chart assembly and persistence
/// get read access only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSeries {
    candles: Vec<AnnotatedCandle>,
}

impl AnnotatedSeries {
    pub fn new(candles: Vec<AnnotatedCandle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnnotatedCandle> {
        self.candles.iter()
    }

    pub fn candles(&self) -> &[AnnotatedCandle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&AnnotatedCandle> {
        self.candles.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(open_time: i64) -> Candle {
        Candle {
            open_time,
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100),
            volume: dec!(10),
        }
    }

    #[test]
    fn test_series_accessors() {
        let series = CandleSeries::from_sorted(vec![candle(1000), candle(2000)]);
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert_eq!(series.last().unwrap().open_time, 2000);
    }

    #[test]
    fn test_annotated_series_preserves_order() {
        let annotated = AnnotatedSeries::new(vec![
            AnnotatedCandle {
                candle: candle(1000),
                indicators: None,
            },
            AnnotatedCandle {
                candle: candle(2000),
                indicators: Some(IndicatorRecord {
                    ma: 100.0,
                    upper: 102.0,
                    lower: 98.0,
                }),
            },
        ]);

        let times: Vec<i64> = annotated.iter().map(|a| a.candle.open_time).collect();
        assert_eq!(times, vec![1000, 2000]);
        assert!(annotated.candles()[0].indicators.is_none());
    }
}
