//! One-shot fetcher: pulls the last day of 1-minute BTC/USDT candles from
//! Binance and writes the CSV the dashboard reads.

use btc_insights::klines;
use btc_insights::preview::{PREVIEW_ROWS, head_table};
use btc_insights::storage::PriceStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Fetching BTC price data from Binance API...");
    let store = PriceStore::default();
    let series = klines::run(&store).await?;

    println!("First 5 records:");
    println!("{}", head_table(&series, PREVIEW_ROWS));
    Ok(())
}
