// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free building blocks of the screener: scalar coercion of
// messy wire cells, rolling simple moving averages, and above/below signal
// classification.  Every public function returns `Option<T>` (or a column of
// `Option<f64>`) so callers are forced to handle missing data explicitly.

pub mod scalar;
pub mod signal;
pub mod sma;

pub use scalar::coerce_scalar;
pub use signal::{ma_signals, percent_change, price_vs_ma_pct, MaSignal};
pub use sma::{moving_averages, rolling_mean};
