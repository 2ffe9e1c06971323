// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Read-only JSON surface under `/api/v1/`.  The screener has no control
// plane: refreshes run on a timer, and the endpoints only expose the current
// table, per-ticker chart data, and the active configuration.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::app_state::AppState;
use crate::indicators::{ma_signals, moving_averages, MaSignal};
use crate::sources::stock_info::{probe_number, probe_string};
use crate::types::PriceBar;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/screener", get(screener_table))
        .route("/api/v1/screener/:ticker", get(ticker_detail))
        .route("/api/v1/config", get(get_config))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Screener table
// =============================================================================

async fn screener_table(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Per-ticker chart data
// =============================================================================

/// Everything the detail chart view needs for one ticker: the raw bars, one
/// SMA series per window, the latest signals, and key stats.
#[derive(Serialize)]
struct TickerDetail {
    ticker: String,
    period: String,
    bars: Vec<PriceBar>,
    averages: BTreeMap<usize, Vec<Option<f64>>>,
    signals: BTreeMap<usize, MaSignal>,
    stats: KeyStats,
}

#[derive(Serialize)]
struct KeyStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fifty_two_week_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fifty_two_week_high: Option<f64>,
}

async fn ticker_detail(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> impl IntoResponse {
    let ticker = ticker.trim().to_uppercase();
    let (windows, period) = {
        let config = state.runtime_config.read();
        (config.effective_windows(), config.period)
    };

    let bars = state.cached_bars(&ticker, period).await;
    if bars.is_empty() {
        let body = serde_json::json!({
            "ticker": ticker,
            "message": "no price data available for this ticker",
        });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let averages = moving_averages(&closes, &windows);
    let signals = ma_signals(&closes, &averages);

    let info = state.cached_info(&ticker).await;
    let stats = KeyStats {
        sector: probe_string(&info, &["sector", "industry"]),
        market_cap: probe_number(&info, &["marketCap", "market_cap"]),
        fifty_two_week_low: probe_number(
            &info,
            &["fiftyTwoWeekLow", "fifty_two_week_low", "yearLow"],
        ),
        fifty_two_week_high: probe_number(
            &info,
            &["fiftyTwoWeekHigh", "fifty_two_week_high", "yearHigh"],
        ),
    };

    debug!(ticker = %ticker, bars = bars.len(), "ticker detail served");

    let detail = TickerDetail {
        ticker,
        period: period.to_string(),
        bars,
        averages,
        signals,
        stats,
    };
    Json(detail).into_response()
}

// =============================================================================
// Config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}
