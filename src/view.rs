//! Pure view model for the dashboard: analytics rows mapped into the
//! point vectors, tables, and labels the terminal UI renders.

use chrono::{DateTime, Utc};

use crate::analysis::{analyze, summarize};
use crate::model::{AnalyticsRow, PriceSample, PriceSummary, Signal};

/// Rows kept in the tail tables.
pub const TAIL_ROWS: usize = 10;

/// Everything a single frame needs, derived once per data or range change.
///
/// Chart points carry the timestamp as epoch seconds on the x axis so all
/// datasets of one chart share a scale. Rows whose indicator is still in
/// its warm-up window are simply absent from the corresponding vector,
/// which renders as a leading gap in the overlay lines.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub rows: Vec<AnalyticsRow>,
    pub summary: Option<PriceSummary>,
    pub price_points: Vec<(f64, f64)>,
    pub sma_points: Vec<(f64, f64)>,
    pub volatility_points: Vec<(f64, f64)>,
    pub anomaly_points: Vec<(f64, f64)>,
    pub buy_points: Vec<(f64, f64)>,
    pub sell_points: Vec<(f64, f64)>,
    pub last_rows: Vec<AnalyticsRow>,
    pub last_signals: Vec<AnalyticsRow>,
}

/// Runs the analytics over the selected range and shapes the result for
/// rendering.
pub fn build_view(series: &[PriceSample], range: (DateTime<Utc>, DateTime<Utc>)) -> DashboardView {
    let rows = analyze(series, range);
    let summary = summarize(&rows);

    let mut view = DashboardView {
        summary,
        ..DashboardView::default()
    };

    for row in &rows {
        let x = row.timestamp.timestamp() as f64;
        view.price_points.push((x, row.price));
        if let Some(sma) = row.sma30 {
            view.sma_points.push((x, sma));
        }
        if let Some(vol) = row.volatility30 {
            view.volatility_points.push((x, vol));
        }
        if row.anomaly {
            view.anomaly_points.push((x, row.price));
        }
        match row.signal {
            Signal::Buy => view.buy_points.push((x, row.price)),
            Signal::Sell => view.sell_points.push((x, row.price)),
            Signal::Hold => {}
        }
    }

    view.last_rows = rows.iter().rev().take(TAIL_ROWS).rev().cloned().collect();
    // Collected newest first; the reverse restores chronological order.
    let mut last_signals: Vec<AnalyticsRow> = rows
        .iter()
        .filter(|r| r.signal.is_actionable())
        .rev()
        .take(TAIL_ROWS)
        .cloned()
        .collect();
    last_signals.reverse();
    view.last_signals = last_signals;
    view.rows = rows;
    view
}

/// Combined `[min, max]` of the y values across the datasets of one chart,
/// widened by a small margin so lines do not hug the frame. `None` when no
/// dataset has a point.
pub fn y_extent(datasets: &[&[(f64, f64)]]) -> Option<[f64; 2]> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for points in datasets {
        for &(_, y) in *points {
            min = min.min(y);
            max = max.max(y);
        }
    }
    if min > max {
        return None;
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some([min - pad, max + pad])
}

/// `[min, max]` of the x values of the price dataset, which always spans
/// the full selected range.
pub fn x_extent(points: &[(f64, f64)]) -> Option<[f64; 2]> {
    match (points.first(), points.last()) {
        (Some(&(first, _)), Some(&(last, _))) if last > first => Some([first, last]),
        (Some(&(only, _)), Some(_)) => Some([only - 1.0, only + 1.0]),
        _ => None,
    }
}

/// Wall-clock label used on the x axis and the range slider.
pub fn hhmm(ts: DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

/// Dollar amount with thousands separators, e.g. `$64,123.46`.
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some(parts) => parts,
        None => (formatted.as_str(), "00"),
    };
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}
