use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One validated OHLC candle for a fixed interval.
///
/// `open_time` is the start of the interval as a unix timestamp in
/// milliseconds and is unique within a series. Candles are immutable once
/// loaded; indicator values live in a parallel record, never in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Price bounds every exchange candle satisfies: positive prices with
    /// open and close inside the low..=high range.
    pub fn bounds_ok(&self) -> bool {
        self.low > Decimal::ZERO
            && self.low <= self.high
            && self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }

    /// Formats `open_time` as UTC `YYYY-MM-DD HH:MM:SS` for logs and
    /// stored records.
    pub fn open_time_utc(&self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.open_time) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.open_time.to_string(),
        }
    }
}

/// Raw candle record as exchanged with a `CandleSource`.
///
/// Origin-agnostic mapping of field name to value: every field is optional
/// because sources pass records through untouched and the loader decides
/// what is missing. `open_time` arrives either as an epoch value in
/// milliseconds or as a formatted string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCandle {
    pub open_time: Option<RawTimestamp>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<Decimal>,
}

/// Source representation of a candle open time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Epoch milliseconds, the market API convention
    Millis(i64),
    /// Formatted string, `"YYYY-MM-DD HH:MM:SS"` (UTC) or RFC 3339
    Text(String),
}

impl From<i64> for RawTimestamp {
    fn from(ms: i64) -> Self {
        RawTimestamp::Millis(ms)
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}
