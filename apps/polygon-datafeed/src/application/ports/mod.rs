//! Application Ports
//!
//! Trait boundaries between the datafeed use-cases and the market-data
//! provider. Infrastructure adapters implement these; the application layer
//! depends only on the traits, which keeps the use-cases testable with mocks.

use async_trait::async_trait;

use crate::domain::bars::{Bar, Timespan};
use crate::domain::symbols::{SymbolInfo, SymbolSearchResult};

// =============================================================================
// Error Type
// =============================================================================

/// Errors crossing the gateway boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request could not reach the provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Provider returned a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response detail, if any.
        message: String,
    },

    /// The requested ticker is unknown to the provider.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
}

// =============================================================================
// Market Data Gateway
// =============================================================================

/// Pull-side access to the market-data provider.
///
/// Covers symbol search, symbol resolution, and historical bar retrieval.
/// The push side (live bar streaming) is a separate concern owned by the
/// streaming client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Search reference tickers matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport, decode, or provider failure.
    async fn search_symbols(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SymbolSearchResult>, GatewayError>;

    /// Resolve one ticker into full symbol metadata.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SymbolNotFound`] for unknown tickers, or
    /// another [`GatewayError`] on transport, decode, or provider failure.
    async fn resolve_symbol(&self, ticker: &str) -> Result<SymbolInfo, GatewayError>;

    /// Fetch historical aggregate bars for `[from_ms, to_ms]`.
    ///
    /// Bars are returned in ascending time order; an empty vector means the
    /// provider has no data for the window.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport, decode, or provider failure.
    async fn fetch_bars(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: Timespan,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<Bar>, GatewayError>;
}
