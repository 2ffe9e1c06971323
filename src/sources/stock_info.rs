// =============================================================================
// Stock Info Client — loosely-keyed profile and metrics map
// =============================================================================
//
// The info source returns sector, market capitalization, 52-week range and
// similar facts, but the key spellings vary by source version (`marketCap`
// vs `market_cap`, `fiftyTwoWeekHigh` vs `yearHigh`, ...).  The payload is
// therefore kept as a flat `serde_json` map and consumers probe several key
// names, tolerating total absence.  Fetch failures surface as errors; the
// screener boundary records them and substitutes an empty map.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use crate::indicators::coerce_scalar;

/// Client for the stock info/profile source.
#[derive(Debug, Clone)]
pub struct StockInfoClient {
    base_url: String,
    client: reqwest::Client,
}

impl StockInfoClient {
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

    /// Fetch the info map for `ticker`.
    ///
    /// An empty ticker yields an empty map without a network call.  Fetch
    /// and parse errors propagate; every consumer already tolerates an
    /// empty map when the caller substitutes one.
    pub async fn info(&self, ticker: &str) -> Result<Map<String, Value>> {
        if ticker.trim().is_empty() {
            return Ok(Map::new());
        }

        let map = self.fetch_summary(ticker).await?;
        debug!(ticker, keys = map.len(), "stock info fetched");
        Ok(map)
    }

    async fn fetch_summary(&self, ticker: &str) -> Result<Map<String, Value>> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=assetProfile,summaryDetail,price",
            self.base_url, ticker
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET quoteSummary request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse quoteSummary response")?;

        if !status.is_success() {
            anyhow::bail!("info source returned {}: {}", status, body);
        }

        Ok(flatten_summary(&body))
    }
}

impl Default for StockInfoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten the module objects of a quoteSummary payload into one map.
///
/// Wrapped numeric cells of the form `{ "raw": 123, "fmt": "123" }` are
/// unwrapped to their raw value.  Later modules do not overwrite keys set by
/// earlier ones.
fn flatten_summary(body: &Value) -> Map<String, Value> {
    let mut flat = Map::new();

    let modules = body["quoteSummary"]["result"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|entry| entry.as_object());

    let modules = match modules {
        Some(m) => m,
        None => return flat,
    };

    for module in modules.values() {
        if let Some(fields) = module.as_object() {
            for (key, value) in fields {
                if flat.contains_key(key) {
                    continue;
                }
                let unwrapped = match value.get("raw") {
                    Some(raw) => raw.clone(),
                    None => value.clone(),
                };
                flat.insert(key.clone(), unwrapped);
            }
        }
    }

    flat
}

/// Probe the map for the first key that coerces to a number.
pub fn probe_number(info: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| info.get(*k))
        .find_map(coerce_scalar)
}

/// Probe the map for the first key holding a non-empty string.
pub fn probe_string(info: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| info.get(*k))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn probe_number_tries_spellings_in_order() {
        let info = as_map(json!({ "market_cap": 1.5e9 }));
        assert_eq!(probe_number(&info, &["marketCap", "market_cap"]), Some(1.5e9));
    }

    #[test]
    fn probe_number_skips_non_numeric_hits() {
        let info = as_map(json!({ "marketCap": "n/a", "market_cap": 2.0e9 }));
        assert_eq!(probe_number(&info, &["marketCap", "market_cap"]), Some(2.0e9));
    }

    #[test]
    fn probe_tolerates_total_absence() {
        let info = Map::new();
        assert_eq!(probe_number(&info, &["marketCap", "market_cap"]), None);
        assert_eq!(probe_string(&info, &["sector", "industry"]), None);
    }

    #[test]
    fn probe_string_skips_empty_values() {
        let info = as_map(json!({ "sector": "  ", "industry": "Semiconductors" }));
        assert_eq!(
            probe_string(&info, &["sector", "industry"]),
            Some("Semiconductors".to_string())
        );
    }

    #[test]
    fn flatten_unwraps_raw_cells_and_merges_modules() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "assetProfile": { "sector": "Technology" },
                    "summaryDetail": {
                        "marketCap": { "raw": 5.0e10, "fmt": "50B" },
                        "fiftyTwoWeekHigh": { "raw": 188.75, "fmt": "188.75" }
                    }
                }]
            }
        });

        let flat = flatten_summary(&body);
        assert_eq!(flat["sector"], json!("Technology"));
        assert_eq!(probe_number(&flat, &["marketCap"]), Some(5.0e10));
        assert_eq!(probe_number(&flat, &["fiftyTwoWeekHigh"]), Some(188.75));
    }

    #[test]
    fn flatten_first_module_wins_on_key_collision() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    // Object iteration over serde_json::Map is key-ordered.
                    "a_module": { "sector": "Primary" },
                    "b_module": { "sector": "Secondary" }
                }]
            }
        });

        let flat = flatten_summary(&body);
        assert_eq!(flat["sector"], json!("Primary"));
    }

    #[test]
    fn flatten_malformed_body_is_empty() {
        assert!(flatten_summary(&json!({})).is_empty());
        assert!(flatten_summary(&json!({ "quoteSummary": { "result": [] } })).is_empty());
    }
}
