//! Bandwatch collector - background candle collection.
//!
//! Polls the Binance klines endpoint on an interval, computes Bollinger
//! indicators and upserts the annotated candles into SQLite, so the
//! monitor can run against stored data. Runs until Ctrl-C, or once with
//! `--once`.
//!
//! # Usage
//! ```sh
//! cargo run --bin collector
//! cargo run --bin collector -- --symbol ETHUSDT --interval 5m --update-interval 60
//! cargo run --bin collector -- --once
//! ```

use anyhow::Result;
use bandwatch::application::collector::Collector;
use bandwatch::config::Config;
use bandwatch::domain::market::interval::Interval;
use bandwatch::infrastructure::binance::BinanceCandleSource;
use bandwatch::infrastructure::persistence::{Database, SqliteCandleRepository};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "collector", about = "Collects Binance candles into the database")]
struct Args {
    /// Trading pair, e.g. BTCUSDT
    #[arg(long)]
    symbol: Option<String>,

    /// Candle interval (1m, 5m, 15m, 1h, 1d)
    #[arg(long)]
    interval: Option<Interval>,

    /// Number of candles per fetch
    #[arg(long)]
    limit: Option<usize>,

    /// Seconds between collection cycles
    #[arg(long)]
    update_interval: Option<u64>,

    /// Run a single collection cycle and exit
    #[arg(long)]
    once: bool,
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
    let limit = args.limit.unwrap_or(config.data_limit);
    let period = Duration::from_secs(args.update_interval.unwrap_or(config.update_interval_secs));

    info!("Collector starting: {} {} (limit={})", symbol, interval, limit);

    let db = Database::new(&config.database_url).await?;
    let source = Arc::new(BinanceCandleSource::new(&config.binance));
    let repository = Arc::new(SqliteCandleRepository::new(db.pool.clone()));

    let collector = Collector::new(
        source,
        repository,
        config.bands,
        symbol,
        interval,
        limit,
        period,
    );

    if args.once {
        let report = collector.collect_once().await?;
        info!(
            "Single cycle complete: fetched {}, persisted {}",
            report.fetched, report.persisted
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { collector.run(shutdown_rx).await });

    info!("Collector running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    shutdown_tx.send(true)?;
    handle.await??;

    Ok(())
}
