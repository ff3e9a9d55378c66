//! # BTC price insights
//!
//! Fetches one trailing day of minute-resolution BTC/USDT candles from
//! Binance, persists the close prices to a flat CSV file, and renders an
//! interactive terminal dashboard on top of them: rolling moving average,
//! rolling volatility, z-score anomaly flags, and moving-average crossover
//! buy/sell signals.
//!
//! Two binaries share this library:
//!
//! - `fetch`: one-shot ETL, kline API call to `data/btc_price_data.csv`
//! - `btc-insights`: the dashboard, reading whatever the last fetch wrote
//!
//! ```rust,ignore
//! use btc_insights::{analysis, storage::CachedLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut loader = CachedLoader::default();
//!     let series = loader.load().await?;
//!     let range = (series[0].timestamp, series[series.len() - 1].timestamp);
//!     let rows = analysis::analyze(series, range);
//!     println!("{} rows analyzed", rows.len());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod indicators;
pub mod klines;
pub mod model;
pub mod preview;
pub mod storage;
pub mod tui;
pub mod view;

pub use analysis::analyze;
pub use model::{AnalyticsRow, PriceSample, PriceSeries, PriceSummary, Signal};
pub use storage::{CachedLoader, PriceStore};

use std::path::PathBuf;

/// Error types for the crate
#[derive(thiserror::Error, Debug)]
pub enum InsightsError {
    /// Transport failure or non-2xx status from the candle API.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// The candle API answered, but not with the expected kline arrays.
    #[error("malformed kline payload: {0}")]
    MalformedPayload(String),

    /// The dashboard was started before any fetch produced the data file.
    #[error("price data file missing at {0:?}; run the `fetch` binary first")]
    DataFileMissing(PathBuf),

    /// Any other I/O or CSV encode/decode failure.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, InsightsError>;
