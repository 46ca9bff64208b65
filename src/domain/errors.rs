use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while turning raw candle records into a validated series
/// or while computing indicators over one.
///
/// These always indicate malformed upstream data (or a too-short series
/// when the caller demanded a fully populated one) and are surfaced to the
/// caller unchanged. Network and database failures are not part of this
/// taxonomy; they stay `anyhow::Error` at the infrastructure boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("record {index} is missing required field(s): {}", fields.join(", "))]
    Schema {
        index: usize,
        fields: Vec<&'static str>,
    },

    #[error("record {index} has unparseable open_time '{value}'")]
    Timestamp { index: usize, value: String },

    #[error("duplicate open_time {open_time_ms} in candle batch")]
    DuplicateTimestamp { open_time_ms: i64 },

    #[error(
        "candle at {open_time_ms} violates price bounds: low {low}, open {open}, close {close}, high {high}"
    )]
    Bounds {
        open_time_ms: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    },

    #[error("series has {len} candles, {window} are required for a fully populated window")]
    InsufficientData { len: usize, window: usize },
}

/// Errors related to simulated order handling and portfolio bookkeeping
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TradingError {
    #[error("Insufficient funds: need ${need}, available ${available}")]
    InsufficientFunds { need: Decimal, available: Decimal },

    #[error("Position not found: {symbol}")]
    PositionNotFound { symbol: String },

    #[error("Insufficient quantity for {symbol}: have {available}, requested {requested}")]
    InsufficientQuantity {
        symbol: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },
}
