//! Bandwatch seed - sample data for offline demos.
//!
//! Generates a random-walk candle series, annotates it with the indicator
//! engine and persists it, so the monitor works without network access.
//!
//! # Usage
//! ```sh
//! cargo run --bin seed -- --count 100 --start-price 42000
//! ```

use anyhow::Result;
use bandwatch::application::market_data::indicators::IndicatorEngine;
use bandwatch::application::market_data::loader::load_series;
use bandwatch::config::Config;
use bandwatch::domain::market::candle::{RawCandle, RawTimestamp};
use bandwatch::domain::market::interval::Interval;
use bandwatch::domain::ports::CandleRepository;
use bandwatch::infrastructure::persistence::{Database, SqliteCandleRepository};
use chrono::Utc;
use clap::Parser;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Populates the database with sample candles")]
struct Args {
    /// Trading pair to seed
    #[arg(long)]
    symbol: Option<String>,

    /// Candle interval (1m, 5m, 15m, 1h, 1d)
    #[arg(long)]
    interval: Option<Interval>,

    /// Number of candles to generate
    #[arg(long, default_value_t = 100)]
    count: usize,

    /// Price the random walk starts from
    #[arg(long, default_value_t = 42_000.0)]
    start_price: f64,
}

/// Random-walk OHLC batch ending at the current minute
fn generate_candles(count: usize, start_price: f64, interval: Interval) -> Vec<RawCandle> {
    let mut rng = rand::rng();
    let step_ms = interval.to_seconds() * 1000;
    let end_ms = Utc::now().timestamp_millis() / step_ms * step_ms;
    let start_ms = end_ms - step_ms * count as i64;

    let mut price = start_price;
    let mut records = Vec::with_capacity(count);

    for i in 0..count {
        let open = price;
        // Drift within +-0.5% per candle
        price *= 1.0 + rng.random_range(-0.005..0.005);
        let close = price;
        let high = open.max(close) * (1.0 + rng.random_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.random_range(0.0..0.002));
        let volume = rng.random_range(10.0..500.0);

        let dec = |v: f64| Decimal::from_f64((v * 100.0).round() / 100.0);
        records.push(RawCandle {
            open_time: Some(RawTimestamp::Millis(start_ms + step_ms * i as i64)),
            open: dec(open),
            high: dec(high),
            low: dec(low),
            close: dec(close),
            volume: dec(volume),
        });
    }

    records
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let symbol = args.symbol.unwrap_or_else(|| config.symbol.clone());
    let interval = args.interval.unwrap_or(config.interval);

    info!(
        "Seeding {} sample candles for {} {}",
        args.count, symbol, interval
    );

    let raw = generate_candles(args.count, args.start_price, interval);
    let series = load_series(raw)?;
    let annotated = IndicatorEngine::new(config.bands).annotate(series);

    let db = Database::new(&config.database_url).await?;
    let repository = SqliteCandleRepository::new(db.pool.clone());
    let written = repository
        .upsert_batch(&symbol, interval, annotated.candles())
        .await?;

    info!("Seeded {} candles. Run the monitor with --source stored.", written);
    Ok(())
}
