//! The analytics pipeline: range filter, rolling statistics, anomaly
//! flags, and moving-average crossover signals.

use chrono::{DateTime, Utc};

use crate::indicators::{forward_fill, rolling_mean, rolling_std, zscores};
use crate::model::{AnalyticsRow, PriceSample, PriceSummary, Signal};

/// Trailing window (in samples) for the moving average and volatility.
pub const SMA_WINDOW: usize = 30;

/// Absolute z-score above which a sample counts as an anomaly.
pub const ANOMALY_THRESHOLD: f64 = 2.5;

/// Strict comparison: a z-score of exactly the threshold is not flagged,
/// and a NaN z-score never is.
pub fn is_anomaly(zscore: f64) -> bool {
    zscore.abs() > ANOMALY_THRESHOLD
}

/// BUY below the moving average, SELL above it, HOLD on equality or while
/// the average is still undefined.
fn classify(price: f64, sma: Option<f64>) -> Signal {
    match sma {
        Some(m) if price < m => Signal::Buy,
        Some(m) if price > m => Signal::Sell,
        _ => Signal::Hold,
    }
}

/// Derives one [`AnalyticsRow`] per sample with `range.0 <= timestamp <=
/// range.1`, in series order.
///
/// Pure function of `(series, range)`. Indicator windows restart inside the
/// filtered range, so the first `SMA_WINDOW - 1` filtered rows carry no SMA
/// or volatility value. The z-score column is computed over the entire
/// filtered range (not rolling), after forward-filling NaN prices.
pub fn analyze(
    series: &[PriceSample],
    range: (DateTime<Utc>, DateTime<Utc>),
) -> Vec<AnalyticsRow> {
    let filtered: Vec<&PriceSample> = series
        .iter()
        .filter(|s| s.timestamp >= range.0 && s.timestamp <= range.1)
        .collect();

    let prices: Vec<f64> = filtered.iter().map(|s| s.price).collect();
    let sma = rolling_mean(&prices, SMA_WINDOW);
    let volatility = rolling_std(&prices, SMA_WINDOW);
    let z = zscores(&forward_fill(&prices));

    filtered
        .iter()
        .enumerate()
        .map(|(i, s)| AnalyticsRow {
            timestamp: s.timestamp,
            price: s.price,
            sma30: sma[i],
            volatility30: volatility[i],
            zscore: z[i],
            anomaly: is_anomaly(z[i]),
            signal: classify(s.price, sma[i]),
        })
        .collect()
}

/// Min/max/mean of price over already-analyzed rows; `None` when the
/// filtered range came up empty.
pub fn summarize(rows: &[AnalyticsRow]) -> Option<PriceSummary> {
    if rows.is_empty() {
        return None;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for row in rows {
        min = min.min(row.price);
        max = max.max(row.price);
        sum += row.price;
    }
    Some(PriceSummary {
        min,
        max,
        mean: sum / rows.len() as f64,
    })
}
