// =============================================================================
// Price History Client — daily OHLCV bars
// =============================================================================
//
// Fetches daily bars for one ticker over a named period from a Yahoo-chart
// style endpoint.  The quote arrays in these payloads are ragged: individual
// cells can be null, strings, or (rarely) nested arrays, so every cell goes
// through `coerce_scalar` before it becomes a bar.  Bars with no usable close
// are dropped.  Fetch and parse failures surface as errors; the screener
// boundary records them and substitutes an empty bar list.

use anyhow::{Context, Result};
use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use crate::indicators::coerce_scalar;
use crate::types::{Period, PriceBar};

/// Client for the daily price-history source.
#[derive(Debug, Clone)]
pub struct PriceHistoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl PriceHistoryClient {
    pub fn new() -> Self {
        Self::with_base_url("https://query1.finance.yahoo.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Fetch daily bars for `ticker` over `period`, oldest first.
    ///
    /// An empty ticker yields an empty vector without a network call.
    /// Transport and parse errors propagate to the caller.
    pub async fn daily_bars(&self, ticker: &str, period: Period) -> Result<Vec<PriceBar>> {
        if ticker.trim().is_empty() {
            return Ok(Vec::new());
        }

        let bars = self.fetch_chart(ticker, period).await?;
        debug!(ticker, period = %period, count = bars.len(), "price history fetched");
        Ok(bars)
    }

    async fn fetch_chart(&self, ticker: &str, period: Period) -> Result<Vec<PriceBar>> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url,
            ticker,
            period.as_str()
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET chart request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse chart response")?;

        if !status.is_success() {
            anyhow::bail!("price source returned {}: {}", status, body);
        }

        parse_chart(&body)
    }
}

impl Default for PriceHistoryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a chart payload of the shape
/// `{ "chart": { "result": [ { "timestamp": [..], "indicators":
/// { "quote": [ { "open": [..], "high": [..], ... } ] } } ] } }`.
///
/// Bars whose close cell cannot be coerced to a number are skipped; missing
/// open/high/low cells fall back to the close, missing volume to zero.
fn parse_chart(body: &Value) -> Result<Vec<PriceBar>> {
    let result = body["chart"]["result"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("chart response missing result entry")?;

    let timestamps = result["timestamp"]
        .as_array()
        .context("chart result missing timestamps")?;

    let quote = result["indicators"]["quote"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("chart result missing quote block")?;

    let column = |name: &str| quote[name].as_array().cloned().unwrap_or_default();
    let opens = column("open");
    let highs = column("high");
    let lows = column("low");
    let closes = column("close");
    let volumes = column("volume");

    let cell = |col: &[Value], i: usize| col.get(i).and_then(coerce_scalar);

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;

    for (i, ts) in timestamps.iter().enumerate() {
        let date = match ts
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        {
            Some(dt) => dt.date_naive(),
            None => {
                skipped += 1;
                continue;
            }
        };

        let close = match cell(&closes, i) {
            Some(c) => c,
            None => {
                skipped += 1;
                continue;
            }
        };

        bars.push(PriceBar {
            date,
            open: cell(&opens, i).unwrap_or(close),
            high: cell(&highs, i).unwrap_or(close),
            low: cell(&lows, i).unwrap_or(close),
            close,
            volume: cell(&volumes, i).unwrap_or(0.0),
        });
    }

    if skipped > 0 {
        debug!(skipped, "dropped bars without a usable close");
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_body(timestamps: Value, quote: Value) -> Value {
        json!({
            "chart": {
                "result": [{
                    "timestamp": timestamps,
                    "indicators": { "quote": [quote] }
                }]
            }
        })
    }

    // One trading day in seconds.
    const DAY: i64 = 86_400;

    #[test]
    fn parses_clean_payload() {
        let body = chart_body(
            json!([1_700_000_000, 1_700_000_000 + DAY]),
            json!({
                "open":   [10.0, 11.0],
                "high":   [10.5, 11.5],
                "low":    [9.5, 10.5],
                "close":  [10.2, 11.2],
                "volume": [1000.0, 2000.0]
            }),
        );

        let bars = parse_chart(&body).unwrap();
        assert_eq!(bars.len(), 2);
        assert!((bars[0].close - 10.2).abs() < 1e-10);
        assert!((bars[1].volume - 2000.0).abs() < 1e-10);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn null_close_drops_the_bar() {
        let body = chart_body(
            json!([1_700_000_000, 1_700_000_000 + DAY, 1_700_000_000 + 2 * DAY]),
            json!({
                "open":   [10.0, 11.0, 12.0],
                "high":   [10.5, 11.5, 12.5],
                "low":    [9.5, 10.5, 11.5],
                "close":  [10.2, null, 12.2],
                "volume": [1000.0, 2000.0, 3000.0]
            }),
        );

        let bars = parse_chart(&body).unwrap();
        assert_eq!(bars.len(), 2);
        assert!((bars[1].close - 12.2).abs() < 1e-10);
    }

    #[test]
    fn string_cells_are_coerced() {
        let body = chart_body(
            json!([1_700_000_000]),
            json!({
                "open":   ["10.0"],
                "high":   ["10.5"],
                "low":    ["9.5"],
                "close":  ["10.2"],
                "volume": ["1000"]
            }),
        );

        let bars = parse_chart(&body).unwrap();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].close - 10.2).abs() < 1e-10);
    }

    #[test]
    fn missing_side_columns_fall_back_to_close() {
        let body = chart_body(
            json!([1_700_000_000]),
            json!({ "close": [10.2] }),
        );

        let bars = parse_chart(&body).unwrap();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].open - 10.2).abs() < 1e-10);
        assert!((bars[0].volume - 0.0).abs() < 1e-10);
    }

    #[test]
    fn out_of_order_timestamps_are_sorted() {
        let body = chart_body(
            json!([1_700_000_000 + DAY, 1_700_000_000]),
            json!({
                "close":  [11.2, 10.2],
                "volume": [2000.0, 1000.0]
            }),
        );

        let bars = parse_chart(&body).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].date < bars[1].date);
        assert!((bars[0].close - 10.2).abs() < 1e-10);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_chart(&json!({})).is_err());
        assert!(parse_chart(&json!({ "chart": { "result": [] } })).is_err());
        assert!(parse_chart(&json!({ "chart": { "result": [{}] } })).is_err());
    }
}
