//! Live-Feed WebSocket Client
//!
//! Owns exactly one logical connection to Polygon's streaming endpoint and
//! re-publishes parsed records as typed [`StreamEvent`]s, in arrival order,
//! to an mpsc consumer.
//!
//! # Connection Lifecycle
//!
//! Disconnected → connect → send one auth frame → on `auth_success` mark
//! ready and flush the full tracked channel set as one subscribe frame
//! (covering sends issued before the socket was ready). Any connect error,
//! protocol error, or close resets to Disconnected and schedules one
//! reconnect after a fixed delay; the client retries forever.
//!
//! # Subscriptions
//!
//! [`StreamClient::subscribe`] merges channel names into the tracked set.
//! When authenticated, only the newly added channels are sent immediately;
//! otherwise they ride the next post-auth flush. The set never shrinks:
//! there is no unsubscribe frame, and stale channels are filtered out at
//! the fan-out layer instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::auth::{ApiKey, AuthError, AuthState};
use super::codec::{CodecError, JsonCodec};
use super::messages::{ActionRequest, FeedMessage, StatusKind};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};

/// Default streaming endpoint for US stocks.
pub const DEFAULT_STREAM_URL: &str = "wss://socket.polygon.io/stocks";

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the live-feed client.
#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Frame encoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Authentication rejected by the server.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Server closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// `run()` was invoked more than once.
    #[error("client connection loop is already running")]
    AlreadyRunning,
}

// =============================================================================
// Client Events
// =============================================================================

/// Events emitted by the live-feed client.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Connected and authenticated; channel set flushed.
    Connected,
    /// Connection lost; a reconnect will be scheduled.
    Disconnected,
    /// Reconnecting after the fixed delay.
    Reconnecting {
        /// Reconnection attempt number since the last successful auth.
        attempt: u32,
    },
    /// Received an aggregate bar record.
    Aggregate(super::messages::AggregateMessage),
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the live-feed client.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// API credential forwarded in the auth frame.
    pub api_key: ApiKey,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
}

impl StreamClientConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            url: url.into(),
            api_key,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Configuration for the production stocks cluster.
    #[must_use]
    pub fn stocks(api_key: ApiKey) -> Self {
        Self::new(DEFAULT_STREAM_URL, api_key)
    }
}

// =============================================================================
// Live-Feed Client
// =============================================================================

/// WebSocket client for Polygon's push channel.
///
/// Manages the connection lifecycle:
/// - Single-frame API-key authentication
/// - Full channel-set flush after every successful authentication
/// - Incremental subscribe frames while connected
/// - Unconditional fixed-delay reconnection
pub struct StreamClient {
    config: StreamClientConfig,
    codec: JsonCodec,
    event_tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    channels: parking_lot::RwLock<Vec<String>>,
    authenticated: AtomicBool,
    pending_tx: mpsc::UnboundedSender<Vec<String>>,
    pending_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<Vec<String>>>>,
}

impl StreamClient {
    /// Create a new live-feed client.
    #[must_use]
    pub fn new(
        config: StreamClientConfig,
        event_tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        Self {
            config,
            codec: JsonCodec::new(),
            event_tx,
            cancel,
            channels: parking_lot::RwLock::new(Vec::new()),
            authenticated: AtomicBool::new(false),
            pending_tx,
            pending_rx: parking_lot::Mutex::new(Some(pending_rx)),
        }
    }

    /// Merge channel names into the tracked set.
    ///
    /// Names already tracked are ignored. When authenticated, the newly
    /// added channels are sent immediately as one subscribe frame; before
    /// authentication they are picked up by the post-auth full flush.
    pub fn subscribe<I, S>(&self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        {
            let mut tracked = self.channels.write();
            for channel in channels {
                let channel: String = channel.into();
                if !tracked.contains(&channel) {
                    tracked.push(channel.clone());
                    added.push(channel);
                }
            }
        }

        if added.is_empty() {
            return;
        }

        if self.pending_tx.send(added).is_err() {
            tracing::debug!("connection loop stopped; channels flush on next run");
        }
    }

    /// Snapshot of the tracked channel set.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        self.channels.read().clone()
    }

    /// Whether the client is currently authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Run the connection loop until cancelled.
    ///
    /// Connects, authenticates, and processes records; every failure
    /// schedules a reconnect after the fixed delay, forever.
    ///
    /// # Errors
    ///
    /// Returns [`StreamClientError::AlreadyRunning`] if called twice;
    /// otherwise only returns once cancelled, with `Ok(())`.
    pub async fn run(self: Arc<Self>) -> Result<(), StreamClientError> {
        let mut pending_rx = self
            .pending_rx
            .lock()
            .take()
            .ok_or(StreamClientError::AlreadyRunning)?;

        let mut policy = ReconnectPolicy::new(self.config.reconnect);

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("live feed cancelled");
                return Ok(());
            }

            match self.connect_and_run(&mut pending_rx, &mut policy).await {
                Ok(()) => {
                    tracing::info!("live feed closed gracefully");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "live feed connection error");

                    self.authenticated.store(false, Ordering::SeqCst);
                    let _ = self.event_tx.send(StreamEvent::Disconnected).await;

                    let delay = policy.next_delay();
                    let attempt = policy.attempt_count();
                    tracing::info!(attempt, delay_ms = delay.as_millis(), "reconnecting");
                    let _ = self
                        .event_tx
                        .send(StreamEvent::Reconnecting { attempt })
                        .await;

                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            tracing::info!("live feed cancelled during reconnect delay");
                            return Ok(());
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Connect, authenticate, and process records until error or cancel.
    async fn connect_and_run(
        &self,
        pending_rx: &mut mpsc::UnboundedReceiver<Vec<String>>,
        policy: &mut ReconnectPolicy,
    ) -> Result<(), StreamClientError> {
        tracing::info!(url = %self.config.url, "connecting to live feed");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        // Single auth frame immediately after open.
        let auth_frame = self
            .codec
            .encode(&ActionRequest::auth(self.config.api_key.as_str()))?;
        write.send(Message::Text(auth_frame.into())).await?;
        let mut auth_state = AuthState::Authenticating;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    return Ok(());
                }
                added = pending_rx.recv() => {
                    if let Some(channels) = added
                        && self.is_authenticated()
                    {
                        // Channels queued before auth ride the full flush.
                        self.send_subscribe(&mut write, &channels).await?;
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text, &mut auth_state, &mut write, pending_rx, policy)
                                .await?;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("server sent close frame");
                            return Err(StreamClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        None => {
                            tracing::info!("stream ended");
                            return Err(StreamClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Handle one text frame: decode and dispatch each record in order.
    ///
    /// Malformed frames are logged and skipped; the connection stays up.
    async fn handle_frame<W>(
        &self,
        text: &str,
        auth_state: &mut AuthState,
        write: &mut W,
        pending_rx: &mut mpsc::UnboundedReceiver<Vec<String>>,
        policy: &mut ReconnectPolicy,
    ) -> Result<(), StreamClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let records = match self.codec.decode(text) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "skipping undecodable frame");
                return Ok(());
            }
        };

        for record in records {
            match record {
                FeedMessage::Status(status) => match status.status {
                    StatusKind::Connected => {
                        tracing::debug!(message = ?status.message, "channel accepted connection");
                    }
                    StatusKind::AuthSuccess => {
                        if !auth_state.is_authenticating() {
                            tracing::debug!("duplicate auth_success ignored");
                            continue;
                        }
                        *auth_state = AuthState::Authenticated;
                        self.authenticated.store(true, Ordering::SeqCst);
                        policy.reset();
                        tracing::info!("live feed authenticated");
                        let _ = self.event_tx.send(StreamEvent::Connected).await;

                        // Deltas queued before auth are covered by the full
                        // flush below; drop them so they are not re-sent.
                        while pending_rx.try_recv().is_ok() {}

                        let tracked = self.channels();
                        if !tracked.is_empty() {
                            self.send_subscribe(write, &tracked).await?;
                        }
                    }
                    StatusKind::AuthFailed => {
                        *auth_state = AuthState::Failed;
                        let reason = status.message.unwrap_or_else(|| "auth_failed".to_string());
                        return Err(AuthError::Rejected(reason).into());
                    }
                    StatusKind::Success | StatusKind::Error | StatusKind::Other => {
                        tracing::info!(
                            status = ?status.status,
                            message = ?status.message,
                            "status update"
                        );
                    }
                },
                FeedMessage::Aggregate(aggregate) => {
                    let _ = self.event_tx.send(StreamEvent::Aggregate(aggregate)).await;
                }
            }
        }

        Ok(())
    }

    /// Send one subscribe frame for the given channels.
    async fn send_subscribe<W>(
        &self,
        write: &mut W,
        channels: &[String],
    ) -> Result<(), StreamClientError>
    where
        W: SinkExt<Message> + Unpin,
        W::Error: std::fmt::Display,
    {
        let frame = self.codec.encode(&ActionRequest::subscribe(channels))?;

        tracing::debug!(?channels, "sending subscribe frame");

        write
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to send subscribe frame");
                StreamClientError::ConnectionClosed
            })?;

        Ok(())
    }
}
