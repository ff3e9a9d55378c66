use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One minute-close observation of the BTC/USDT price.
///
/// Serialized field order is the flat-file column order: `timestamp,price`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Time-ordered price observations, kept exactly as the exchange returned
/// them (no sorting, no deduplication).
pub type PriceSeries = Vec<PriceSample>;

/// Moving-average crossover cue for a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// True for the rows the signal table cares about.
    pub fn is_actionable(&self) -> bool {
        *self != Signal::Hold
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// A price sample extended with the derived statistics for one filtered row.
///
/// `sma30` and `volatility30` are `None` until a full 30-sample trailing
/// window is available within the filtered range.
#[derive(Debug, Clone)]
pub struct AnalyticsRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub sma30: Option<f64>,
    pub volatility30: Option<f64>,
    pub zscore: f64,
    pub anomaly: bool,
    pub signal: Signal,
}

/// Min/max/mean of the price over a filtered range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_labels() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
    }

    #[test]
    fn only_buy_and_sell_are_actionable() {
        assert!(Signal::Buy.is_actionable());
        assert!(Signal::Sell.is_actionable());
        assert!(!Signal::Hold.is_actionable());
    }
}
