// =============================================================================
// Moving-Average Signal Derivation
// =============================================================================
//
// Classifies the latest close against each moving-average value.  The test is
// a strict greater-than: an exact tie classifies as `Below`.  No "equal"
// state exists, so a close sitting exactly on its SMA reads as not above it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relationship between the latest close and one moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaSignal {
    Above,
    Below,
    NotAvailable,
}

impl std::fmt::Display for MaSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "above"),
            Self::Below => write!(f, "below"),
            Self::NotAvailable => write!(f, "n/a"),
        }
    }
}

/// Classify a single close/SMA pair.
///
/// `NotAvailable` when either operand is missing or non-finite; otherwise
/// `Above` iff `close > ma` (ties are `Below`).
pub fn classify(close: Option<f64>, ma: Option<f64>) -> MaSignal {
    match (close, ma) {
        (Some(c), Some(m)) if c.is_finite() && m.is_finite() => {
            if c > m {
                MaSignal::Above
            } else {
                MaSignal::Below
            }
        }
        _ => MaSignal::NotAvailable,
    }
}

/// Classify the latest close against the latest value of every SMA column.
///
/// Windows present in `averages` but with an empty or all-missing column
/// produce `NotAvailable`, as does an empty close series.
pub fn ma_signals(
    closes: &[f64],
    averages: &BTreeMap<usize, Vec<Option<f64>>>,
) -> BTreeMap<usize, MaSignal> {
    let latest_close = closes.last().copied();

    averages
        .iter()
        .map(|(&window, column)| {
            let latest_ma = column.last().copied().flatten();
            (window, classify(latest_close, latest_ma))
        })
        .collect()
}

/// Percent change from `first` to `last`: +50.0 means a 50 % rise.
///
/// `None` when the starting value is zero or either operand is non-finite —
/// a missing change, never a division error.
pub fn percent_change(first: f64, last: f64) -> Option<f64> {
    if first == 0.0 || !first.is_finite() || !last.is_finite() {
        return None;
    }
    let pct = (last / first - 1.0) * 100.0;
    pct.is_finite().then_some(pct)
}

/// Percentage distance of the close above (+) or below (−) the SMA.
pub fn price_vs_ma_pct(close: Option<f64>, ma: Option<f64>) -> Option<f64> {
    percent_change(ma?, close?)
}
