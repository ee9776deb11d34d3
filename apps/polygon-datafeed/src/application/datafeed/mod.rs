//! Datafeed Service
//!
//! Implements the charting widget's datafeed contract on top of the Polygon
//! adapters: symbol search and resolution, historical bar retrieval, and
//! live bar subscriptions.
//!
//! # Liveness
//!
//! Live updates run in one of two modes, fixed at startup. Only one-minute
//! subscriptions are eligible in either mode; coarser resolutions are
//! history-only.
//!
//! - **Push**: bars arrive over the WebSocket channel and are fanned out to
//!   subscribers by ticker.
//! - **Poll**: each subscription gets its own task polling the history
//!   endpoint on a fixed interval over a trailing window. Results arriving
//!   after the subscription is removed are discarded at the registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::debounce::Debouncer;
use crate::application::ports::{GatewayError, MarketDataGateway};
use crate::domain::bars::{Bar, HistoryStatus, Resolution};
use crate::domain::subscription::{BarSender, BarSubscription, SubscriptionRegistry};
use crate::domain::symbols::{SymbolInfo, SymbolSearchResult, strip_exchange_prefix};
use crate::infrastructure::config::{LivenessMode, PollSettings};
use crate::infrastructure::polygon::stream::{StreamClient, StreamEvent};

// =============================================================================
// Service
// =============================================================================

/// The datafeed use-cases, wired over a gateway and an optional push channel.
pub struct DatafeedService {
    gateway: Arc<dyn MarketDataGateway>,
    registry: Arc<SubscriptionRegistry>,
    stream: Option<Arc<StreamClient>>,
    liveness: LivenessMode,
    poll: PollSettings,
    search_debouncer: Debouncer,
    cancel: CancellationToken,
    poll_tasks: parking_lot::Mutex<HashMap<String, CancellationToken>>,
}

impl DatafeedService {
    /// Create a new datafeed service.
    ///
    /// `stream` must be `Some` in push mode and is ignored in poll mode.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        registry: Arc<SubscriptionRegistry>,
        stream: Option<Arc<StreamClient>>,
        liveness: LivenessMode,
        poll: PollSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            registry,
            stream,
            liveness,
            poll,
            search_debouncer: Debouncer::default(),
            cancel,
            poll_tasks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Search reference tickers matching `query`, optionally narrowed by
    /// exchange code and instrument type.
    ///
    /// Degrades to an empty result set on provider failure; search is a
    /// best-effort convenience and must never surface an error to the
    /// widget.
    pub async fn search_symbols(
        &self,
        query: &str,
        exchange: Option<&str>,
        symbol_type: Option<&str>,
        limit: u32,
    ) -> Vec<SymbolSearchResult> {
        run_search(&*self.gateway, query, exchange, symbol_type, limit).await
    }

    /// Debounced variant of [`Self::search_symbols`].
    ///
    /// Keystroke bursts collapse to one provider call; only the last query
    /// in a burst reaches `on_results`.
    pub fn search_symbols_debounced<F>(
        &self,
        query: &str,
        exchange: Option<&str>,
        symbol_type: Option<&str>,
        limit: u32,
        on_results: F,
    ) where
        F: FnOnce(Vec<SymbolSearchResult>) + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let query = query.to_string();
        let exchange = exchange.map(ToString::to_string);
        let symbol_type = symbol_type.map(ToString::to_string);

        self.search_debouncer.call(move || async move {
            let results = run_search(
                &*gateway,
                &query,
                exchange.as_deref(),
                symbol_type.as_deref(),
                limit,
            )
            .await;
            on_results(results);
        });
    }

    /// Resolve a symbol string into full metadata.
    ///
    /// Accepts exchange-prefixed forms (`"NASDAQ:AAPL"`); resolution always
    /// operates on the bare ticker.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SymbolNotFound`] for unknown tickers, or
    /// another [`GatewayError`] on provider failure.
    pub async fn resolve_symbol(&self, symbol: &str) -> Result<SymbolInfo, GatewayError> {
        let ticker = strip_exchange_prefix(symbol);
        self.gateway.resolve_symbol(ticker).await
    }

    /// Fetch historical bars for `[from_ms, to_ms]` at the given resolution.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on provider failure.
    pub async fn get_bars(
        &self,
        symbol_info: &SymbolInfo,
        resolution: Resolution,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<(Vec<Bar>, HistoryStatus), GatewayError> {
        let (multiplier, timespan) = resolution.provider_params();

        let bars = self
            .gateway
            .fetch_bars(&symbol_info.ticker, multiplier, timespan, from_ms, to_ms)
            .await?;

        let status = HistoryStatus::from_bars(&bars);
        Ok((bars, status))
    }

    /// Register a live bar subscription under `key`.
    ///
    /// Only one-minute subscriptions are eligible for live updates in
    /// either mode; any other resolution is refused with a warning and no
    /// registration. Coarser resolutions are history-only.
    pub fn subscribe_bars(
        &self,
        symbol_info: &SymbolInfo,
        resolution: Resolution,
        key: impl Into<String>,
        sender: BarSender,
    ) {
        let key = key.into();

        if !resolution.supports_streaming() {
            tracing::warn!(
                key,
                resolution = %resolution,
                "live updates are only served at one-minute resolution"
            );
            return;
        }

        self.registry.add(BarSubscription {
            key: key.clone(),
            symbol_info: symbol_info.clone(),
            resolution,
            sender,
        });

        if self.liveness.is_push() {
            if let Some(stream) = &self.stream {
                stream.subscribe([format!("AM.{}", symbol_info.ticker)]);
            }
        } else {
            self.spawn_poll_task(key, symbol_info.clone(), resolution);
        }
    }

    /// Remove the subscription under `key`.
    ///
    /// Idempotent; the stream channel set is left untouched (it never
    /// shrinks) and stale bars are filtered out at the registry.
    pub fn unsubscribe_bars(&self, key: &str) {
        let removed = self.registry.remove(key);
        tracing::debug!(key, removed, "unsubscribed");

        if let Some(token) = self.poll_tasks.lock().remove(key) {
            token.cancel();
        }
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.registry.len()
    }

    fn spawn_poll_task(&self, key: String, symbol_info: SymbolInfo, resolution: Resolution) {
        // A re-subscribe under the same key replaces the old poll task.
        if let Some(old) = self.poll_tasks.lock().remove(&key) {
            old.cancel();
        }

        let token = self.cancel.child_token();
        self.poll_tasks.lock().insert(key.clone(), token.clone());

        let gateway = Arc::clone(&self.gateway);
        let registry = Arc::clone(&self.registry);
        let settings = self.poll;

        tokio::spawn(async move {
            let (multiplier, timespan) = resolution.provider_params();
            let window_ms = i64::try_from(settings.window.as_millis()).unwrap_or(120_000);
            let mut ticker = tokio::time::interval(settings.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let to_ms = chrono::Utc::now().timestamp_millis();
                let from_ms = to_ms - window_ms;

                match gateway
                    .fetch_bars(&symbol_info.ticker, multiplier, timespan, from_ms, to_ms)
                    .await
                {
                    Ok(bars) if bars.is_empty() => {}
                    Ok(bars) => {
                        if !registry.deliver_to_key(&key, &bars) {
                            tracing::debug!(key, "subscription removed; stopping poll task");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "poll fetch failed");
                    }
                }
            }
        });
    }
}

/// Fan stream events out to subscribers until the channel closes.
///
/// Aggregate records are reshaped to bars and delivered ticker-filtered;
/// lifecycle events are logged.
pub async fn pump_stream_events(
    registry: Arc<SubscriptionRegistry>,
    mut events: tokio::sync::mpsc::Receiver<StreamEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Aggregate(aggregate) => {
                let bar = Bar::from(&aggregate);
                let delivered = registry.deliver(&aggregate.sym, &[bar]);
                tracing::trace!(sym = %aggregate.sym, delivered, "live bar");
            }
            StreamEvent::Connected => {
                tracing::info!("live feed connected");
            }
            StreamEvent::Disconnected => {
                tracing::warn!("live feed disconnected");
            }
            StreamEvent::Reconnecting { attempt } => {
                tracing::info!(attempt, "live feed reconnecting");
            }
        }
    }

    tracing::info!("stream event pump stopped");
}

async fn run_search(
    gateway: &dyn MarketDataGateway,
    query: &str,
    exchange: Option<&str>,
    symbol_type: Option<&str>,
    limit: u32,
) -> Vec<SymbolSearchResult> {
    let mut results = match gateway.search_symbols(query, limit).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(query, error = %e, "symbol search failed; returning no matches");
            return Vec::new();
        }
    };

    if let Some(exchange) = exchange {
        results.retain(|r| r.exchange.eq_ignore_ascii_case(exchange));
    }
    if let Some(symbol_type) = symbol_type {
        results.retain(|r| r.symbol_type.eq_ignore_ascii_case(symbol_type));
    }

    results
}
