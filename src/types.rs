// =============================================================================
// Shared types used across the IPO screener
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry from the IPO calendar (live or demo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpoRecord {
    pub ticker: String,
    pub company: String,
    /// Listing exchange as reported by the calendar source. Empty for
    /// manually added tickers.
    #[serde(default)]
    pub exchange: String,
    /// May be absent when the calendar row carries no date.
    pub ipo_date: Option<NaiveDate>,
}

/// A single daily OHLCV bar. Bars are ordered chronologically and never
/// modified after being fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Named lookback period for price history.
///
/// The four shorter periods match the chart timeframes; `TwoYears` exists for
/// screening runs that need more history than any chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl Default for Period {
    fn default() -> Self {
        Self::SixMonths
    }
}

impl Period {
    /// Wire representation used both in config files and in the price
    /// source's `range` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            other => anyhow::bail!("unknown period '{other}' (expected 1mo/3mo/6mo/1y/2y)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_roundtrip() {
        for p in [
            Period::OneMonth,
            Period::ThreeMonths,
            Period::SixMonths,
            Period::OneYear,
            Period::TwoYears,
        ] {
            let parsed: Period = p.as_str().parse().unwrap();
            assert_eq!(parsed, p);
        }
    }

    #[test]
    fn period_rejects_unknown() {
        assert!("5d".parse::<Period>().is_err());
    }

    #[test]
    fn period_serde_uses_wire_names() {
        let json = serde_json::to_string(&Period::SixMonths).unwrap();
        assert_eq!(json, "\"6mo\"");
        let back: Period = serde_json::from_str("\"1y\"").unwrap();
        assert_eq!(back, Period::OneYear);
    }
}
