// =============================================================================
// Screener — joins IPO metadata with price/indicator data into table rows
// =============================================================================
//
// One row per ticker: IPO metadata, latest price/volume, percent change since
// the start of the price window, sector/market cap from the info source, and
// per-window price-vs-SMA percentage plus an above/below signal.  Tickers
// with no price data are skipped (logged, never fatal).  Processing is
// sequential per ticker; each fetch+compute step is independent and cached.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::indicators::{ma_signals, moving_averages, percent_change, price_vs_ma_pct, MaSignal};
use crate::sources::stock_info::{probe_number, probe_string};
use crate::types::{IpoRecord, PriceBar};

/// Price-vs-SMA cell for one window.
#[derive(Debug, Clone, Serialize)]
pub struct MaCell {
    /// Percentage distance of the latest close above (+) or below (−) the
    /// SMA; `None` when either side is missing.
    pub vs_pct: Option<f64>,
    pub signal: MaSignal,
}

/// One assembled screener table row.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenerRow {
    pub ticker: String,
    pub company: String,
    pub exchange: String,
    pub ipo_date: Option<NaiveDate>,
    pub days_since_ipo: Option<i64>,
    pub sector: Option<String>,
    pub last_close: f64,
    /// Percent change from the first bar in the window to the latest.
    pub change_pct: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    /// Per-window price-vs-SMA cells, keyed by window length.
    pub ma: BTreeMap<usize, MaCell>,
}

/// Merge user-supplied tickers into the IPO set.
///
/// Symbols already present are left untouched; new ones get today's date as
/// a synthetic IPO date, the ticker as company name, and no exchange.
pub fn merge_manual_tickers(records: &mut Vec<IpoRecord>, manual: &[String], today: NaiveDate) {
    for raw in manual {
        let ticker = raw.trim().to_uppercase();
        if ticker.is_empty() || records.iter().any(|r| r.ticker == ticker) {
            continue;
        }
        records.push(IpoRecord {
            company: ticker.clone(),
            ticker,
            exchange: String::new(),
            ipo_date: Some(today),
        });
    }
}

/// Assemble a single row from already-fetched inputs.
///
/// Pure: no IO.  Returns `None` when `bars` is empty — the caller skips the
/// ticker entirely.
pub fn assemble_row(
    ipo: &IpoRecord,
    bars: &[PriceBar],
    info: &Map<String, Value>,
    windows: &[usize],
    today: NaiveDate,
) -> Option<ScreenerRow> {
    let first = bars.first()?;
    let latest = bars.last()?;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let averages = moving_averages(&closes, windows);
    let signals = ma_signals(&closes, &averages);

    let ma = averages
        .iter()
        .map(|(&window, column)| {
            let latest_ma = column.last().copied().flatten();
            let cell = MaCell {
                vs_pct: price_vs_ma_pct(Some(latest.close), latest_ma),
                signal: signals
                    .get(&window)
                    .copied()
                    .unwrap_or(MaSignal::NotAvailable),
            };
            (window, cell)
        })
        .collect();

    Some(ScreenerRow {
        ticker: ipo.ticker.clone(),
        company: ipo.company.clone(),
        exchange: ipo.exchange.clone(),
        ipo_date: ipo.ipo_date,
        days_since_ipo: ipo.ipo_date.map(|d| (today - d).num_days()),
        sector: probe_string(info, &["sector", "industry"]),
        last_close: latest.close,
        change_pct: percent_change(first.close, latest.close),
        volume: Some(latest.volume),
        market_cap: probe_number(info, &["marketCap", "market_cap"]),
        ma,
    })
}

/// Run one full screening pass and replace the shared table.
///
/// Loads the IPO universe (calendar + manual tickers), then walks the
/// tickers sequentially: fetch price history and info through the caches,
/// assemble a row, skip tickers without price data.  Fetch failures and
/// skipped tickers land in the error ring; none of them is fatal.  Returns
/// the number of assembled rows.
pub async fn refresh(state: &Arc<AppState>) -> Result<usize> {
    let (lookback_days, windows, period, manual) = {
        let config = state.runtime_config.read();
        (
            config.lookback_days,
            config.effective_windows(),
            config.period,
            config.manual_tickers.clone(),
        )
    };

    let today = Utc::now().date_naive();

    let mut ipos = match state.ipo_cache.get(&lookback_days) {
        Some(cached) => cached,
        None => {
            let fetched = match state.ipo_calendar.recent_ipos(lookback_days).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "IPO calendar fetch failed — using demo list");
                    state.push_error(format!("IPO calendar fetch failed: {e}"));
                    state.ipo_calendar.demo_universe()
                }
            };
            state.ipo_cache.insert(lookback_days, fetched.clone());
            fetched
        }
    };
    merge_manual_tickers(&mut ipos, &manual, today);

    if ipos.is_empty() {
        warn!(lookback_days, "no IPOs found for the selected window");
        *state.screener.write() = Vec::new();
        *state.empty_message.write() =
            Some("No IPOs found for the selected window.".to_string());
        state.increment_version();
        return Ok(0);
    }

    ipos.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    let total = ipos.len();
    let mut rows = Vec::with_capacity(total);

    for (idx, ipo) in ipos.iter().enumerate() {
        let bars = state.cached_bars(&ipo.ticker, period).await;
        if bars.is_empty() {
            warn!(ticker = %ipo.ticker, "no price data — skipping ticker");
            state.push_error(format!("{}: no price data — ticker skipped", ipo.ticker));
            continue;
        }

        let info = state.cached_info(&ipo.ticker).await;

        match assemble_row(ipo, &bars, &info, &windows, today) {
            Some(row) => rows.push(row),
            None => warn!(ticker = %ipo.ticker, "row assembly produced no data"),
        }

        debug!(ticker = %ipo.ticker, progress = idx + 1, total, "ticker screened");
    }

    let count = rows.len();
    let message = if count == 0 {
        warn!("no price data available for the IPO list");
        Some("No price data available for the IPO list.".to_string())
    } else {
        None
    };

    *state.screener.write() = rows;
    *state.empty_message.write() = message;
    *state.last_refresh.write() = Some(std::time::Instant::now());
    state.increment_version();

    info!(rows = count, universe = total, "screener table refreshed");
    Ok(count)
}
