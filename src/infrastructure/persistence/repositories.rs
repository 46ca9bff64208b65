use crate::application::trading::simulator::{SimulatorStateRepository, TradingSimulator};
use crate::domain::market::candle::{RawCandle, RawTimestamp};
use crate::domain::market::interval::Interval;
use crate::domain::market::series::AnnotatedCandle;
use crate::domain::ports::{CandleRepository, CandleSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

pub struct SqliteCandleRepository {
    pool: SqlitePool,
}

impl SqliteCandleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandleRepository for SqliteCandleRepository {
    async fn upsert_batch(
        &self,
        symbol: &str,
        interval: Interval,
        candles: &[AnnotatedCandle],
    ) -> Result<u64> {
        let mut written = 0;

        for annotated in candles {
            let candle = &annotated.candle;
            sqlx::query(
                r#"
                INSERT INTO candles
                    (symbol, interval, open_time, open, high, low, close, volume,
                     ma20, upper_band, lower_band)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(symbol, interval, open_time) DO UPDATE SET
                    open = excluded.open,
                    high = excluded.high,
                    low = excluded.low,
                    close = excluded.close,
                    volume = excluded.volume,
                    ma20 = excluded.ma20,
                    upper_band = excluded.upper_band,
                    lower_band = excluded.lower_band
                "#,
            )
            .bind(symbol)
            .bind(interval.as_str())
            .bind(candle.open_time)
            .bind(candle.open.to_string())
            .bind(candle.high.to_string())
            .bind(candle.low.to_string())
            .bind(candle.close.to_string())
            .bind(candle.volume.to_string())
            .bind(annotated.indicators.map(|r| r.ma))
            .bind(annotated.indicators.map(|r| r.upper))
            .bind(annotated.indicators.map(|r| r.lower))
            .execute(&self.pool)
            .await
            .context("Failed to upsert candle")?;

            written += 1;
        }

        info!("Persisted {} candles for {} {}", written, symbol, interval);
        Ok(written)
    }

    async fn fetch_recent(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>> {
        // Take the newest rows, then flip back to chronological order
        let rows = sqlx::query(
            r#"
            SELECT open_time, open, high, low, close, volume
            FROM candles
            WHERE symbol = ? AND interval = ?
            ORDER BY open_time DESC
            LIMIT ?
            "#,
        )
        .bind(symbol)
        .bind(interval.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch stored candles")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows.into_iter().rev() {
            let decimal_col = |name: &str| -> Result<Option<Decimal>> {
                let text: String = row.try_get(name)?;
                Ok(Decimal::from_str(&text).ok())
            };

            records.push(RawCandle {
                open_time: Some(RawTimestamp::Millis(row.try_get("open_time")?)),
                open: decimal_col("open")?,
                high: decimal_col("high")?,
                low: decimal_col("low")?,
                close: decimal_col("close")?,
                volume: decimal_col("volume")?,
            });
        }

        Ok(records)
    }
}

/// Stored candles double as a pipeline source, so the monitor can run
/// entirely against the database the collector maintains.
#[async_trait]
impl CandleSource for SqliteCandleRepository {
    fn name(&self) -> &'static str {
        "stored"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<RawCandle>> {
        self.fetch_recent(symbol, interval, limit).await
    }
}

pub struct SqliteSimulatorStateRepository {
    pool: SqlitePool,
}

impl SqliteSimulatorStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SimulatorStateRepository for SqliteSimulatorStateRepository {
    async fn save(&self, user_id: &str, simulator: &TradingSimulator, now_ms: i64) -> Result<()> {
        let state_json =
            serde_json::to_string(simulator).context("Failed to serialize simulator state")?;

        sqlx::query(
            r#"
            INSERT INTO simulator_state (user_id, state_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(state_json)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .context("Failed to save simulator state")?;

        info!("Persisted simulator state for user {}", user_id);
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Option<TradingSimulator>> {
        let row = sqlx::query("SELECT state_json FROM simulator_state WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load simulator state")?;

        match row {
            Some(row) => {
                let state_json: String = row.try_get("state_json")?;
                let simulator = serde_json::from_str(&state_json)
                    .context("Failed to deserialize simulator state")?;
                Ok(Some(simulator))
            }
            None => Ok(None),
        }
    }
}
