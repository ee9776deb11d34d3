//! Symbol Descriptors
//!
//! Records produced by symbol search and symbol resolution. A resolved
//! [`SymbolInfo`] is immutable and is passed back into bar-fetching calls
//! as a capability token.

use serde::{Deserialize, Serialize};

/// Default session string (regular US equity hours).
pub const DEFAULT_SESSION: &str = "0930-1600";

/// Default exchange timezone.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

// =============================================================================
// Search Results
// =============================================================================

/// One symbol search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSearchResult {
    /// Short symbol (e.g. "AAPL").
    pub symbol: String,
    /// Full company or instrument name.
    pub full_name: String,
    /// Human-readable description.
    pub description: String,
    /// Listing exchange code.
    pub exchange: String,
    /// Ticker used for subsequent resolution.
    pub ticker: String,
    /// Instrument type (e.g. "stock").
    #[serde(rename = "type")]
    pub symbol_type: String,
}

// =============================================================================
// Symbol Info
// =============================================================================

/// Descriptive record produced by symbol resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Display name (the bare ticker).
    pub name: String,
    /// Ticker used in bar fetches and stream channel names.
    pub ticker: String,
    /// Human-readable description.
    pub description: String,
    /// Instrument type (e.g. "stock").
    #[serde(rename = "type")]
    pub symbol_type: String,
    /// Listing exchange code.
    pub exchange: String,
    /// Exchange timezone (IANA name).
    pub timezone: String,
    /// Trading session string.
    pub session: String,
    /// Price scale (10^decimals shown by the chart).
    pub pricescale: u32,
    /// Minimal price movement in pricescale units.
    pub minmov: u32,
    /// Whether intraday history is available.
    pub has_intraday: bool,
    /// Whether daily history is available.
    pub has_daily: bool,
    /// Industry sector, when the provider reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Resolution tokens this symbol supports.
    pub supported_resolutions: Vec<String>,
}

/// Strip an exchange prefix from a symbol string.
///
/// The charting widget may hand back symbols as `"NASDAQ:AAPL"`; resolution
/// always operates on the bare ticker (the last `:`-separated segment).
#[must_use]
pub fn strip_exchange_prefix(symbol: &str) -> &str {
    symbol.rsplit(':').next().unwrap_or(symbol)
}
