//! Binance spot klines fetcher: one request for the last day of 1-minute
//! BTC/USDT candles, reduced to `(open time, close price)` samples.

use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;

use crate::model::{PriceSample, PriceSeries};
use crate::storage::PriceStore;
use crate::{InsightsError, Result};

/// Binance spot klines endpoint.
pub const KLINES_URL: &str = "https://api.binance.com/api/v3/klines";
/// Traded pair the pipeline tracks.
pub const SYMBOL: &str = "BTCUSDT";
/// Candle interval requested from the endpoint.
pub const INTERVAL: &str = "1m";
/// Candles per request: 24 hours of 1-minute data.
pub const LIMIT: u32 = 1440;

/// Requests the latest candles and reduces each to a close sample.
///
/// Echoes the HTTP status code to stdout. A non-success status or a body
/// that does not match the kline row shape is a typed error; nothing is
/// persisted on any failure.
pub async fn fetch_close_series(client: &Client) -> Result<PriceSeries> {
    let query = vec![
        ("symbol", SYMBOL.to_string()),
        ("interval", INTERVAL.to_string()),
        ("limit", LIMIT.to_string()),
    ];

    let response = client
        .get(KLINES_URL)
        .query(&query)
        .send()
        .await
        .map_err(|e| InsightsError::UpstreamFetch(e.to_string()))?;

    let status = response.status();
    println!("Response status code: {}", status.as_u16());
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(InsightsError::UpstreamFetch(format!(
            "status {status}: {body}"
        )));
    }

    let rows = response
        .json::<Vec<Vec<Value>>>()
        .await
        .map_err(|e| InsightsError::MalformedPayload(e.to_string()))?;
    parse_rows(&rows)
}

/// Fetch, persist, return: the full refresh pipeline.
pub async fn run(store: &PriceStore) -> Result<PriceSeries> {
    let client = Client::new();
    let series = fetch_close_series(&client).await?;
    store.save(&series).await?;
    println!("Data saved to '{}'.", store.file_path().display());
    Ok(series)
}

/// Reduces raw kline rows to samples, in the order the endpoint returned
/// them. Index 0 is the open time in epoch milliseconds, index 4 the close
/// price as a decimal string.
fn parse_rows(rows: &[Vec<Value>]) -> Result<PriceSeries> {
    rows.iter().map(|row| parse_row(row)).collect()
}

fn parse_row(row: &[Value]) -> Result<PriceSample> {
    let millis = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed("open time missing or not an integer", row))?;
    let timestamp = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| malformed("open time out of range", row))?;

    let close = row
        .get(4)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("close price missing or not a string", row))?;
    let price = close
        .parse::<f64>()
        .map_err(|e| malformed(&format!("close price not numeric: {e}"), row))?;

    Ok(PriceSample { timestamp, price })
}

fn malformed(reason: &str, row: &[Value]) -> InsightsError {
    InsightsError::MalformedPayload(format!("{reason} in row {row:?}"))
}
