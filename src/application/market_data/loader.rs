//! Candle series loader.
//!
//! Normalizes raw records from any source into a validated
//! [`CandleSeries`]: required fields present, open times parsed to a
//! canonical millisecond timestamp, ascending order, no duplicates. The
//! whole batch is rejected on the first invalid record; a partially
//! loaded series would feed silently wrong indicator values downstream.

use crate::domain::errors::SeriesError;
use crate::domain::market::candle::{Candle, RawCandle, RawTimestamp};
use crate::domain::market::series::CandleSeries;
use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;

const REQUIRED_FIELDS: [&str; 5] = ["open_time", "open", "high", "low", "close"];

/// Builds a validated series from raw records. Pure; consumes the batch.
pub fn load_series(records: Vec<RawCandle>) -> Result<CandleSeries, SeriesError> {
    let mut candles = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let missing = missing_fields(&record);
        if !missing.is_empty() {
            return Err(SeriesError::Schema {
                index,
                fields: missing,
            });
        }

        // Presence was just checked, so the unwraps below cannot fire.
        let open_time = parse_open_time(index, record.open_time.as_ref().unwrap())?;
        let candle = Candle {
            open_time,
            open: record.open.unwrap(),
            high: record.high.unwrap(),
            low: record.low.unwrap(),
            close: record.close.unwrap(),
            volume: record.volume.unwrap_or(Decimal::ZERO),
        };

        if !candle.bounds_ok() {
            return Err(SeriesError::Bounds {
                open_time_ms: candle.open_time,
                open: candle.open,
                high: candle.high,
                low: candle.low,
                close: candle.close,
            });
        }

        candles.push(candle);
    }

    candles.sort_by_key(|c| c.open_time);

    for pair in candles.windows(2) {
        if pair[0].open_time == pair[1].open_time {
            return Err(SeriesError::DuplicateTimestamp {
                open_time_ms: pair[0].open_time,
            });
        }
    }

    Ok(CandleSeries::from_sorted(candles))
}

fn missing_fields(record: &RawCandle) -> Vec<&'static str> {
    let present = [
        record.open_time.is_some(),
        record.open.is_some(),
        record.high.is_some(),
        record.low.is_some(),
        record.close.is_some(),
    ];

    REQUIRED_FIELDS
        .iter()
        .zip(present)
        .filter(|(_, p)| !p)
        .map(|(field, _)| *field)
        .collect()
}

/// Parses a source timestamp into canonical epoch milliseconds.
///
/// Numeric values are epoch milliseconds (the exchange convention);
/// strings are `"YYYY-MM-DD HH:MM:SS"` in UTC, with RFC 3339 accepted as a
/// fallback for records written by other tooling.
fn parse_open_time(index: usize, raw: &RawTimestamp) -> Result<i64, SeriesError> {
    match raw {
        RawTimestamp::Millis(ms) if *ms >= 0 => Ok(*ms),
        RawTimestamp::Millis(ms) => Err(SeriesError::Timestamp {
            index,
            value: ms.to_string(),
        }),
        RawTimestamp::Text(text) => {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
                return Ok(naive.and_utc().timestamp_millis());
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Ok(dt.timestamp_millis());
            }
            Err(SeriesError::Timestamp {
                index,
                value: text.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(open_time: RawTimestamp, close: Decimal) -> RawCandle {
        RawCandle {
            open_time: Some(open_time),
            open: Some(close),
            high: Some(close + dec!(1)),
            low: Some(close - dec!(1)),
            close: Some(close),
            volume: Some(dec!(10)),
        }
    }

    #[test]
    fn test_load_sorts_by_open_time() {
        let records = vec![
            raw(RawTimestamp::Millis(3000), dec!(102)),
            raw(RawTimestamp::Millis(1000), dec!(100)),
            raw(RawTimestamp::Millis(2000), dec!(101)),
        ];

        let series = load_series(records).unwrap();
        let times: Vec<i64> = series.iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_missing_low_is_schema_error() {
        let mut record = raw(RawTimestamp::Millis(1000), dec!(100));
        record.low = None;

        let err = load_series(vec![record]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::Schema {
                index: 0,
                fields: vec!["low"],
            }
        );
    }

    #[test]
    fn test_multiple_missing_fields_are_all_named() {
        let record = RawCandle {
            open_time: Some(RawTimestamp::Millis(1000)),
            close: Some(dec!(100)),
            ..RawCandle::default()
        };

        let err = load_series(vec![record]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::Schema {
                index: 0,
                fields: vec!["open", "high", "low"],
            }
        );
    }

    #[test]
    fn test_duplicate_open_time_rejected() {
        let records = vec![
            raw(RawTimestamp::Millis(1000), dec!(100)),
            raw(RawTimestamp::Millis(2000), dec!(101)),
            raw(RawTimestamp::Millis(1000), dec!(102)),
        ];

        let err = load_series(records).unwrap_err();
        assert_eq!(err, SeriesError::DuplicateTimestamp { open_time_ms: 1000 });
    }

    #[test]
    fn test_text_timestamp_parsed_as_utc() {
        let record = raw(RawTimestamp::from("2024-01-01 00:00:00"), dec!(100));
        let series = load_series(vec![record]).unwrap();
        assert_eq!(series.candles()[0].open_time, 1_704_067_200_000);
    }

    #[test]
    fn test_rfc3339_timestamp_accepted() {
        let record = raw(RawTimestamp::from("2024-01-01T00:00:00Z"), dec!(100));
        let series = load_series(vec![record]).unwrap();
        assert_eq!(series.candles()[0].open_time, 1_704_067_200_000);
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let record = raw(RawTimestamp::from("yesterday at noon"), dec!(100));
        let err = load_series(vec![record]).unwrap_err();
        assert!(matches!(err, SeriesError::Timestamp { index: 0, .. }));
    }

    #[test]
    fn test_bounds_violation_rejected() {
        let mut record = raw(RawTimestamp::Millis(1000), dec!(100));
        record.high = Some(dec!(99)); // high below close

        let err = load_series(vec![record]).unwrap_err();
        assert!(matches!(err, SeriesError::Bounds { .. }));
    }

    #[test]
    fn test_missing_volume_defaults_to_zero() {
        let mut record = raw(RawTimestamp::Millis(1000), dec!(100));
        record.volume = None;

        let series = load_series(vec![record]).unwrap();
        assert_eq!(series.candles()[0].volume, Decimal::ZERO);
    }

    #[test]
    fn test_empty_batch_is_empty_series() {
        let series = load_series(Vec::new()).unwrap();
        assert!(series.is_empty());
    }
}
