// =============================================================================
// Central Application State — IPO Screener Service
// =============================================================================
//
// The single source of truth for the service: configuration, the fetch
// clients and their memo caches, the assembled screener table, and a small
// error ring for the API's status payload.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared collections.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::runtime_config::RuntimeConfig;
use crate::screener::ScreenerRow;
use crate::sources::{FetchCache, IpoCalendarClient, PriceHistoryClient, PriceKey, StockInfoClient};
use crate::types::{IpoRecord, Period, PriceBar};

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded error event for the API error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Central application state shared across tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Data sources & caches ───────────────────────────────────────────
    pub ipo_calendar: IpoCalendarClient,
    pub price_history: PriceHistoryClient,
    pub stock_info: StockInfoClient,
    pub ipo_cache: FetchCache<i64, Vec<IpoRecord>>,
    pub price_cache: FetchCache<PriceKey, Vec<PriceBar>>,
    pub info_cache: FetchCache<String, Map<String, Value>>,

    // ── Screener output ─────────────────────────────────────────────────
    pub screener: RwLock<Vec<ScreenerRow>>,
    /// User-visible message when the table is empty (no IPOs / no prices).
    pub empty_message: RwLock<Option<String>>,
    pub last_refresh: RwLock<Option<std::time::Instant>>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the runtime configuration and the
    /// three fetch clients. Typically wrapped in `Arc` immediately.
    pub fn new(
        config: RuntimeConfig,
        ipo_calendar: IpoCalendarClient,
        price_history: PriceHistoryClient,
        stock_info: StockInfoClient,
    ) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            ipo_calendar,
            price_history,
            stock_info,
            ipo_cache: FetchCache::new(),
            price_cache: FetchCache::new(),
            info_cache: FetchCache::new(),
            screener: RwLock::new(Vec::new()),
            empty_message: RwLock::new(None),
            last_refresh: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted when the limit is reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Cached fetch helpers ────────────────────────────────────────────

    /// Daily bars for `(ticker, period)`, memoized. A fetch failure is
    /// logged, recorded in the error ring, and cached as an empty list so it
    /// is not retried within the cache lifetime.
    pub async fn cached_bars(&self, ticker: &str, period: Period) -> Vec<PriceBar> {
        let key = PriceKey {
            ticker: ticker.to_string(),
            period,
        };
        if let Some(bars) = self.price_cache.get(&key) {
            return bars;
        }
        let bars = match self.price_history.daily_bars(ticker, period).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!(ticker, period = %period, error = %e, "price history fetch failed");
                self.push_error(format!("{ticker}: price history fetch failed: {e}"));
                Vec::new()
            }
        };
        self.price_cache.insert(key, bars.clone());
        bars
    }

    /// Info map for `ticker`, memoized. A fetch failure is logged, recorded
    /// in the error ring, and cached as an empty map.
    pub async fn cached_info(&self, ticker: &str) -> Map<String, Value> {
        if let Some(info) = self.info_cache.get(&ticker.to_string()) {
            return info;
        }
        let info = match self.stock_info.info(ticker).await {
            Ok(info) => info,
            Err(e) => {
                warn!(ticker, error = %e, "stock info fetch failed — continuing without it");
                self.push_error(format!("{ticker}: stock info fetch failed: {e}"));
                Map::new()
            }
        };
        self.info_cache.insert(ticker.to_string(), info.clone());
        info
    }

    /// Drop all memoized fetch results so the next refresh hits the sources.
    pub fn invalidate_caches(&self) {
        self.ipo_cache.clear();
        self.price_cache.clear();
        self.info_cache.clear();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build the serialisable snapshot served by `GET /api/v1/screener`.
    pub fn build_snapshot(&self) -> ScreenerSnapshot {
        let rows = self.screener.read().clone();
        ScreenerSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            row_count: rows.len(),
            rows,
            message: self.empty_message.read().clone(),
            last_refresh_age_s: self.last_refresh.read().map(|t| t.elapsed().as_secs()),
            uptime_s: self.start_time.elapsed().as_secs(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

/// Full screener snapshot sent to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenerSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub row_count: usize,
    pub rows: Vec<ScreenerRow>,

    /// Set when the table is empty, explaining why.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh_age_s: Option<u64>,

    pub uptime_s: u64,
    pub recent_errors: Vec<ErrorRecord>,
}
