//! Bandwatch monitor - one-shot chart snapshot.
//!
//! Runs the candle pipeline against either the live Binance API or the
//! candles the collector persisted, then prints the chart summary the
//! dashboard shows: last close, band levels, moving average and signal
//! counts.
//!
//! # Usage
//! ```sh
//! cargo run -- --source stored
//! cargo run -- --source live --symbol ETHUSDT --interval 5m --limit 200
//! ```

use anyhow::Result;
use bandwatch::application::pipeline::MarketPipeline;
use bandwatch::config::Config;
use bandwatch::domain::market::interval::Interval;
use bandwatch::domain::ports::CandleSource;
use bandwatch::infrastructure::binance::BinanceCandleSource;
use bandwatch::infrastructure::persistence::{Database, SqliteCandleRepository};
use bandwatch::interfaces::view_models::ChartView;
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Fetch fresh candles from the Binance API
    Live,
    /// Read the candles the collector persisted
    Stored,
}

#[derive(Debug, Parser)]
#[command(name = "bandwatch", about = "Candle chart snapshot with Bollinger bands")]
struct Args {
    /// Candle source to run the pipeline against
    #[arg(long, value_enum, default_value_t = SourceKind::Stored)]
    source: SourceKind,

    /// Trading pair, e.g. BTCUSDT
    #[arg(long)]
    symbol: Option<String>,

    /// Candle interval (1m, 5m, 15m, 1h, 1d)
    #[arg(long)]
    interval: Option<Interval>,

    /// Number of candles to load
    #[arg(long)]
    limit: Option<usize>,
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

    let source: Arc<dyn CandleSource> = match args.source {
        SourceKind::Live => Arc::new(BinanceCandleSource::new(&config.binance)),
        SourceKind::Stored => {
            let db = Database::new(&config.database_url).await?;
            Arc::new(SqliteCandleRepository::new(db.pool.clone()))
        }
    };

    info!(
        "Monitor: {} {} from {} source (limit={})",
        symbol,
        interval,
        source.name(),
        limit
    );

    let pipeline = MarketPipeline::new(config.bands);
    let snapshot = pipeline.run(source.as_ref(), &symbol, interval, limit).await?;

    if snapshot.series.is_empty() {
        println!("No candle data available. Run the collector first or use --source live.");
        return Ok(());
    }

    let view = ChartView::from_snapshot(&snapshot);
    for line in view.summary_lines() {
        println!("{}", line);
    }

    Ok(())
}
