// =============================================================================
// IPO Calendar Client
// =============================================================================
//
// Fetches the recent-IPO calendar from a Finnhub-compatible REST endpoint.
// With no API key, or when the live calendar comes back empty, a small fixed
// demo list stands in so the screener still produces a table.  Fetch failures
// surface as errors; the screener boundary records them and falls back to
// `demo_universe`.  The API key travels as a `token` query parameter and is
// never logged.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tracing::debug;

use crate::types::IpoRecord;

/// Exchanges kept by the US-listing filter. Matched as substrings because
/// the calendar reports variants like "NASDAQ Global Select".
const US_EXCHANGES: &[&str] = &["NASDAQ", "NYSE", "AMEX", "BATS"];

/// Client for the IPO calendar source.
#[derive(Clone)]
pub struct IpoCalendarClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl IpoCalendarClient {
    /// Create a new client. `api_key = None` puts the client in demo mode.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, "https://finnhub.io/api/v1")
    }

    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
            client,
        }
    }

    /// Fetch IPOs whose listing date falls in the last `days_back` days.
    ///
    /// Without an API key, or when the live calendar comes back empty, the
    /// demo list stands in. A live-fetch error propagates to the caller.
    /// The result is deduplicated by ticker (keeping the most recent IPO
    /// date) and sorted by date then ticker.
    pub async fn recent_ipos(&self, days_back: i64) -> Result<Vec<IpoRecord>> {
        let today = Utc::now().date_naive();
        let from = today - Duration::days(days_back.max(0));

        let mut records = Vec::new();

        if self.api_key.is_some() {
            records = self.fetch_calendar(from, today).await?;
        } else {
            debug!("no IPO calendar API key configured — using demo list");
        }

        if records.is_empty() {
            records = demo_ipos(today);
        }

        Ok(dedupe_latest(records))
    }

    /// The fixed demo universe, dated relative to today. Stands in for the
    /// live calendar when a fetch fails.
    pub fn demo_universe(&self) -> Vec<IpoRecord> {
        dedupe_latest(demo_ipos(Utc::now().date_naive()))
    }

    /// GET /calendar/ipo for the given date range.
    async fn fetch_calendar(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<IpoRecord>> {
        let token = self
            .api_key
            .as_deref()
            .context("IPO calendar fetch requires an API key")?;

        let url = format!(
            "{}/calendar/ipo?from={}&to={}&token={}",
            self.base_url, from, to, token
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /calendar/ipo request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse IPO calendar response")?;

        if !status.is_success() {
            anyhow::bail!("IPO calendar returned {}: {}", status, body);
        }

        let records = parse_calendar(&body);
        debug!(count = records.len(), "IPO calendar fetched");
        Ok(records)
    }
}

impl std::fmt::Debug for IpoCalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpoCalendarClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Parse a calendar payload of the shape `{ "ipoCalendar": [ { symbol, name,
/// exchange, date, ... }, ... ] }`, keeping US-listed rows only.
fn parse_calendar(body: &Value) -> Vec<IpoRecord> {
    let rows = match body["ipoCalendar"].as_array() {
        Some(rows) => rows,
        None => return Vec::new(),
    };

    let mut records = Vec::new();
    for row in rows {
        let symbol = match row["symbol"].as_str() {
            Some(s) if !s.trim().is_empty() => s.trim().to_uppercase(),
            _ => continue,
        };

        let exchange = row["exchange"].as_str().unwrap_or("").to_uppercase();
        if !US_EXCHANGES.iter().any(|x| exchange.contains(x)) {
            continue;
        }

        let ipo_date = row["date"]
            .as_str()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        let company = row["name"]
            .as_str()
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| symbol.clone());

        records.push(IpoRecord {
            ticker: symbol,
            company,
            exchange,
            ipo_date,
        });
    }

    records
}

/// Fixed demo list of realistic recent US IPOs, dated relative to `today`.
fn demo_ipos(today: NaiveDate) -> Vec<IpoRecord> {
    let entry = |ticker: &str, company: &str, exchange: &str, days_ago: i64| IpoRecord {
        ticker: ticker.to_string(),
        company: company.to_string(),
        exchange: exchange.to_string(),
        ipo_date: Some(today - Duration::days(days_ago)),
    };

    vec![
        entry("ARM", "Arm Holdings plc", "NASDAQ", 160),
        entry("KVYO", "Klaviyo Inc.", "NYSE", 140),
        entry("CART", "Maplebear Inc. (Instacart)", "NASDAQ", 135),
        entry("BIRK", "Birkenstock Holding plc", "NYSE", 130),
        entry("SEMR", "Semrush Holdings, Inc.", "NYSE", 320),
        entry("NUVL", "Nuvalent, Inc.", "NASDAQ", 280),
    ]
}

/// Deduplicate by ticker, keeping the entry with the most recent IPO date,
/// then sort by date (dated entries first) and ticker.
fn dedupe_latest(mut records: Vec<IpoRecord>) -> Vec<IpoRecord> {
    // Stable sort: undated entries sink to the front so a later dated entry
    // for the same ticker wins below.
    records.sort_by(|a, b| a.ipo_date.cmp(&b.ipo_date));

    let mut by_ticker: std::collections::HashMap<String, IpoRecord> = std::collections::HashMap::new();
    for record in records {
        by_ticker.insert(record.ticker.clone(), record);
    }

    let mut deduped: Vec<IpoRecord> = by_ticker.into_values().collect();
    deduped.sort_by(|a, b| {
        a.ipo_date
            .cmp(&b.ipo_date)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_keeps_us_exchanges_only() {
        let body = json!({
            "ipoCalendar": [
                { "symbol": "abc", "name": "Abc Corp", "exchange": "NASDAQ Global Select", "date": "2026-07-01" },
                { "symbol": "LSEX", "name": "London Listing", "exchange": "LSE", "date": "2026-07-02" },
                { "symbol": "NYS1", "name": "Nyse One", "exchange": "NYSE", "date": "2026-07-03" }
            ]
        });

        let records = parse_calendar(&body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ticker, "ABC");
        assert_eq!(records[1].ticker, "NYS1");
    }

    #[test]
    fn parse_skips_rows_without_symbol() {
        let body = json!({
            "ipoCalendar": [
                { "symbol": "", "name": "Nameless", "exchange": "NYSE", "date": "2026-07-01" },
                { "name": "No Symbol", "exchange": "NYSE", "date": "2026-07-01" },
                { "symbol": "OK", "exchange": "NYSE", "date": "2026-07-01" }
            ]
        });

        let records = parse_calendar(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "OK");
        // Missing name falls back to the symbol.
        assert_eq!(records[0].company, "OK");
    }

    #[test]
    fn parse_tolerates_missing_or_bad_dates() {
        let body = json!({
            "ipoCalendar": [
                { "symbol": "NODATE", "exchange": "NASDAQ" },
                { "symbol": "BADDATE", "exchange": "NASDAQ", "date": "soon" }
            ]
        });

        let records = parse_calendar(&body);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.ipo_date.is_none()));
    }

    #[test]
    fn parse_empty_or_malformed_body_yields_nothing() {
        assert!(parse_calendar(&json!({})).is_empty());
        assert!(parse_calendar(&json!({ "ipoCalendar": null })).is_empty());
        assert!(parse_calendar(&json!("oops")).is_empty());
    }

    #[test]
    fn demo_list_is_six_us_listings() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        let demo = demo_ipos(today);
        assert_eq!(demo.len(), 6);
        assert!(demo.iter().all(|r| r.ipo_date.is_some()));
        assert!(demo
            .iter()
            .all(|r| r.exchange == "NASDAQ" || r.exchange == "NYSE"));
    }

    #[test]
    fn dedupe_keeps_most_recent_date() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        let records = vec![
            IpoRecord {
                ticker: "DUP".into(),
                company: "Old filing".into(),
                exchange: "NYSE".into(),
                ipo_date: d(2026, 3, 1),
            },
            IpoRecord {
                ticker: "DUP".into(),
                company: "New filing".into(),
                exchange: "NYSE".into(),
                ipo_date: d(2026, 6, 1),
            },
            IpoRecord {
                ticker: "SOLO".into(),
                company: "Solo".into(),
                exchange: "NASDAQ".into(),
                ipo_date: d(2026, 4, 1),
            },
        ];

        let deduped = dedupe_latest(records);
        assert_eq!(deduped.len(), 2);
        let dup = deduped.iter().find(|r| r.ticker == "DUP").unwrap();
        assert_eq!(dup.company, "New filing");
        assert_eq!(dup.ipo_date, d(2026, 6, 1));
    }

    #[test]
    fn dedupe_dated_entry_beats_undated() {
        let records = vec![
            IpoRecord {
                ticker: "X".into(),
                company: "Dated".into(),
                exchange: "NYSE".into(),
                ipo_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            },
            IpoRecord {
                ticker: "X".into(),
                company: "Undated".into(),
                exchange: "NYSE".into(),
                ipo_date: None,
            },
        ];

        let deduped = dedupe_latest(records);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].company, "Dated");
    }
}
