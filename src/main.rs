// =============================================================================
// IPO Technical Screener — Main Entry Point
// =============================================================================
//
// Screens recently IPO'd US equities and classifies each against its simple
// moving averages.  Without a FINNHUB_API_KEY the calendar falls back to a
// demo list, so the service always produces a table.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod indicators;
mod runtime_config;
mod screener;
mod sources;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;
use crate::sources::{IpoCalendarClient, PriceHistoryClient, StockInfoClient};

const CONFIG_PATH: &str = "screener_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("IPO Technical Screener — starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Manual tickers can be supplied via the environment.
    if let Ok(tickers) = std::env::var("SCREENER_TICKERS") {
        config.manual_tickers = tickers
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    let api_key = std::env::var("FINNHUB_API_KEY").ok();
    if api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        info!("no FINNHUB_API_KEY set — IPO calendar runs in demo mode");
    }

    info!(
        lookback_days = config.lookback_days,
        period = %config.period,
        windows = ?config.effective_windows(),
        manual = ?config.manual_tickers,
        "screener configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(
        config,
        IpoCalendarClient::new(api_key),
        PriceHistoryClient::new(),
        StockInfoClient::new(),
    ));

    // ── 3. Initial screening pass ────────────────────────────────────────
    match screener::refresh(&state).await {
        Ok(rows) => info!(rows, "initial screening pass complete"),
        Err(e) => {
            error!(error = %e, "initial screening pass failed");
            state.push_error(format!("initial screening pass failed: {e}"));
        }
    }

    // ── 4. Periodic refresh loop ─────────────────────────────────────────
    let refresh_state = state.clone();
    tokio::spawn(async move {
        let secs = refresh_state.runtime_config.read().refresh_interval_secs;
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(secs.max(60)));
        interval.tick().await; // first tick fires immediately; skip it

        loop {
            interval.tick().await;

            // Fresh data every cycle: the caches only dedupe within a pass.
            refresh_state.invalidate_caches();

            match screener::refresh(&refresh_state).await {
                Ok(rows) => info!(rows, "scheduled screener refresh complete"),
                Err(e) => {
                    warn!(error = %e, "scheduled screener refresh failed");
                    refresh_state.push_error(format!("screener refresh failed: {e}"));
                }
            }
        }
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr =
        std::env::var("SCREENER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("IPO screener shut down complete.");
    Ok(())
}
