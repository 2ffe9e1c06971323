// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// The unweighted mean of the most recent `window` closing prices:
//
//   SMA_t = (close_{t-window+1} + ... + close_t) / window
//
// Columns are aligned 1:1 with the input closes; positions before a full
// window exists are `None`.  A series shorter than the window still produces
// a column (entirely `None`) so downstream consumers render "N/A" uniformly
// instead of dropping the column.

use std::collections::BTreeMap;

/// Compute the trailing simple mean over each `window`-length span of
/// `closes`.
///
/// The output has the same length as the input.  The first `window - 1`
/// positions are `None`; if fewer than `window` closes exist, every position
/// is `None`.
///
/// # Edge cases
/// - `window == 0` => all-`None` column (no meaningful mean)
/// - `closes.len() < window` => all-`None` column
pub fn rolling_mean(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || closes.len() < window {
        return vec![None; closes.len()];
    }

    // Summing each window directly keeps a stray non-finite close from
    // poisoning every later position, unlike a running sum.
    let mut result = vec![None; closes.len()];
    for i in (window - 1)..closes.len() {
        let sum: f64 = closes[i + 1 - window..=i].iter().sum();
        result[i] = finite_mean(sum, window);
    }

    result
}

/// Compute one SMA column per requested window.
///
/// Non-positive (zero) windows are ignored.  The map is keyed by window
/// length, so iteration order is ascending.
pub fn moving_averages(
    closes: &[f64],
    windows: &[usize],
) -> BTreeMap<usize, Vec<Option<f64>>> {
    let mut columns = BTreeMap::new();
    for &window in windows {
        if window == 0 {
            continue;
        }
        columns.insert(window, rolling_mean(closes, window));
    }
    columns
}

fn finite_mean(sum: f64, window: usize) -> Option<f64> {
    let mean = sum / window as f64;
    mean.is_finite().then_some(mean)
}
