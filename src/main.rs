//! Dashboard binary. Reads the CSV written by the `fetch` binary; it
//! never touches the network itself.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    btc_insights::tui::run_tui().await
}
