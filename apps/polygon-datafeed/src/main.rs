//! Polygon Datafeed Binary
//!
//! Starts the datafeed service and tails live bars for the tickers given
//! on the command line.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin polygon-datafeed -- AAPL MSFT
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `POLYGON_API_KEY`: Polygon.io API key
//!
//! ## Optional
//! - `POLYGON_LIVE_PUSH`: "push" | "poll" (default: push)
//! - `POLYGON_POLL_INTERVAL_SECS`: Poll-mode interval (default: 15)
//! - `POLYGON_POLL_WINDOW_SECS`: Poll-mode trailing window (default: 120)
//! - `POLYGON_RECONNECT_DELAY_MS`: Reconnect delay (default: 2000)
//! - `POLYGON_REST_URL`: REST base URL (default: <https://api.polygon.io>)
//! - `POLYGON_WS_URL`: WebSocket URL (default: wss://socket.polygon.io/stocks)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use polygon_datafeed::infrastructure::polygon::reconnect::ReconnectConfig;
use polygon_datafeed::infrastructure::telemetry;
use polygon_datafeed::{
    DatafeedConfig, DatafeedService, Resolution, RestClient, StreamClient, StreamClientConfig,
    StreamEvent, SubscriptionRegistry, pump_stream_events,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();
    telemetry::init();

    tracing::info!("Starting Polygon datafeed");

    let config = DatafeedConfig::from_env()?;
    log_config(&config);

    let tickers: Vec<String> = std::env::args().skip(1).collect();

    let shutdown_token = CancellationToken::new();
    let registry = Arc::new(SubscriptionRegistry::new());
    let gateway = Arc::new(RestClient::new(
        config.rest_url.clone(),
        config.api_key.clone(),
    ));

    let stream = if config.liveness.is_push() {
        let (event_tx, event_rx) = mpsc::channel::<StreamEvent>(1024);

        let mut stream_config =
            StreamClientConfig::new(config.stream_url.clone(), config.api_key.clone());
        stream_config.reconnect = ReconnectConfig {
            delay: config.reconnect_delay,
        };

        let stream = Arc::new(StreamClient::new(
            stream_config,
            event_tx,
            shutdown_token.clone(),
        ));

        let pump_registry = Arc::clone(&registry);
        tokio::spawn(async move {
            pump_stream_events(pump_registry, event_rx).await;
        });

        let stream_clone = Arc::clone(&stream);
        tokio::spawn(async move {
            if let Err(e) = stream_clone.run().await {
                tracing::error!(error = %e, "live feed client error");
            }
        });

        Some(stream)
    } else {
        None
    };

    let service = Arc::new(DatafeedService::new(
        gateway,
        Arc::clone(&registry),
        stream,
        config.liveness,
        config.poll,
        shutdown_token.clone(),
    ));

    for ticker in &tickers {
        match service.resolve_symbol(ticker).await {
            Ok(info) => {
                tracing::info!(
                    ticker = %info.ticker,
                    description = %info.description,
                    "resolved symbol"
                );

                // Recent history window before going live.
                let now_ms = chrono::Utc::now().timestamp_millis();
                match service
                    .get_bars(&info, Resolution::Minutes(1), now_ms - 3_600_000, now_ms)
                    .await
                {
                    Ok((bars, status)) => {
                        tracing::info!(
                            ticker = %info.ticker,
                            bars = bars.len(),
                            no_data = status.no_data,
                            "fetched trailing hour of history"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(ticker = %info.ticker, error = %e, "history fetch failed");
                    }
                }

                let (bar_tx, bar_rx) = mpsc::unbounded_channel();
                service.subscribe_bars(
                    &info,
                    Resolution::Minutes(1),
                    format!("cli:{}", info.ticker),
                    bar_tx,
                );

                let ticker = info.ticker;
                tokio::spawn(async move {
                    log_bars(ticker, bar_rx).await;
                });
            }
            Err(e) => {
                tracing::error!(ticker, error = %e, "failed to resolve symbol");
            }
        }
    }

    if tickers.is_empty() {
        tracing::warn!("no tickers given; running idle (pass tickers as arguments)");
    }

    tracing::info!("Datafeed ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Datafeed stopped");
    Ok(())
}

/// Log each bar batch received for a ticker.
async fn log_bars(
    ticker: String,
    mut rx: mpsc::UnboundedReceiver<Vec<polygon_datafeed::Bar>>,
) {
    while let Some(bars) = rx.recv().await {
        for bar in bars {
            tracing::info!(
                ticker,
                time = bar.time,
                open = bar.open,
                high = bar.high,
                low = bar.low,
                close = bar.close,
                volume = bar.volume,
                "bar"
            );
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &DatafeedConfig) {
    tracing::info!(
        rest_url = %config.rest_url,
        stream_url = %config.stream_url,
        liveness = ?config.liveness,
        poll_interval_secs = config.poll.interval.as_secs(),
        poll_window_secs = config.poll.window.as_secs(),
        reconnect_delay_ms = config.reconnect_delay.as_millis(),
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
