//! Rolling and whole-series statistics over a price vector.
//!
//! Every function here is pure and operates on `&[f64]`; the rolling
//! variants return a vector aligned to the input, with `None` for rows
//! where a full trailing window is not yet available.

/// Trailing simple moving average.
///
/// `out[i]` is the mean of `values[i + 1 - window..=i]`, defined only once
/// a full window ends at `i` (i.e. `i >= window - 1`).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || values.len() < window {
        return vec![None; values.len()];
    }
    let mut out = vec![None; window - 1];
    out.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
    );
    out
}

/// Trailing sample standard deviation (N−1 denominator), same window
/// alignment as [`rolling_mean`].
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 || values.len() < window {
        return vec![None; values.len()];
    }
    let mut out = vec![None; window - 1];
    out.extend(values.windows(window).map(|w| {
        let mean = w.iter().sum::<f64>() / window as f64;
        let variance =
            w.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        Some(variance.sqrt())
    }));
    out
}

/// Replaces each NaN with the last preceding non-NaN value.
///
/// Leading NaNs stay NaN; they fall out of the anomaly comparison later
/// because NaN comparisons are always false.
pub fn forward_fill(values: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                last = v;
            }
            last
        })
        .collect()
}

/// Z-score of every value against the whole input (population standard
/// deviation, N denominator).
///
/// A zero-variance input yields NaN for every element (0/0), which no
/// downstream threshold ever matches.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let std =
        (values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    values.iter().map(|&x| (x - mean) / std).collect()
}
