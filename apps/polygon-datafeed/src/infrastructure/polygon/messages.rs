//! Polygon Wire Message Types
//!
//! Types for the streaming channel and the REST endpoints.
//!
//! # Streaming Protocol
//!
//! Client→server frames are JSON objects with an `action` field (`auth` or
//! `subscribe`) and a `params` field carrying the API key or a comma-joined
//! channel list. Server→client frames are JSON arrays of tagged records,
//! each with an `ev` field identifying the record type:
//!
//! - `status`: connection lifecycle updates (logged, never re-emitted)
//! - `AM`: per-minute aggregate bar
//! - `A`: per-second aggregate bar
//!
//! # REST Endpoints
//!
//! - Ticker search/detail: `/v3/reference/tickers`
//! - Aggregate bars: `/v2/aggs/ticker/{ticker}/range/{m}/{timespan}/{from}/{to}`

use serde::{Deserialize, Serialize};

use crate::domain::bars::Bar;

// =============================================================================
// Client -> Server Frames
// =============================================================================

/// Client→server control frame.
///
/// # Wire Format (JSON)
/// ```json
/// {"action":"auth","params":"<api key>"}
/// {"action":"subscribe","params":"AM.AAPL,AM.MSFT"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Requested action: "auth" or "subscribe".
    pub action: String,
    /// Action parameter: the API key, or a comma-joined channel list.
    pub params: String,
}

impl ActionRequest {
    /// Create an authentication frame.
    #[must_use]
    pub fn auth(api_key: &str) -> Self {
        Self {
            action: "auth".to_string(),
            params: api_key.to_string(),
        }
    }

    /// Create a subscribe frame for the given channels.
    #[must_use]
    pub fn subscribe(channels: &[String]) -> Self {
        Self {
            action: "subscribe".to_string(),
            params: channels.join(","),
        }
    }
}

// =============================================================================
// Server -> Client Records
// =============================================================================

/// Connection lifecycle status carried by a status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Socket accepted, authentication expected next.
    Connected,
    /// Authentication succeeded.
    AuthSuccess,
    /// Authentication rejected.
    AuthFailed,
    /// Subscription acknowledged.
    Success,
    /// Server-side error report.
    Error,
    /// Forward-compatible catch-all for unrecognized statuses.
    #[serde(other)]
    Other,
}

/// Status update record.
///
/// # Wire Format (JSON)
/// ```json
/// {"ev":"status","status":"auth_success","message":"authenticated"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Record tag (always "status").
    pub ev: String,
    /// Lifecycle status.
    pub status: StatusKind,
    /// Human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
}

/// Aggregate bar record (`AM` per-minute, `A` per-second).
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "ev": "AM",
///   "sym": "AAPL",
///   "v": 4110,
///   "av": 9470157,
///   "op": 190.49,
///   "vw": 189.3416,
///   "o": 189.34,
///   "c": 189.35,
///   "h": 189.37,
///   "l": 189.30,
///   "s": 1700000040000,
///   "e": 1700000100000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMessage {
    /// Record tag: "AM" (minute) or "A" (second).
    pub ev: String,

    /// Ticker symbol.
    pub sym: String,

    /// Open price for the window.
    #[serde(rename = "o")]
    pub open: f64,

    /// High price for the window.
    #[serde(rename = "h")]
    pub high: f64,

    /// Low price for the window.
    #[serde(rename = "l")]
    pub low: f64,

    /// Close price for the window.
    #[serde(rename = "c")]
    pub close: f64,

    /// Volume over the window.
    #[serde(rename = "v")]
    pub volume: f64,

    /// Window start, epoch milliseconds.
    #[serde(rename = "s")]
    pub start_ms: i64,

    /// Window end, epoch milliseconds.
    #[serde(rename = "e")]
    pub end_ms: i64,

    /// Session-accumulated volume.
    #[serde(rename = "av", default)]
    pub accumulated_volume: Option<f64>,

    /// Session open price.
    #[serde(rename = "op", default)]
    pub session_open: Option<f64>,

    /// Volume-weighted average price for the window.
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl From<&AggregateMessage> for Bar {
    /// Reshape an aggregate record into a chart bar: OHLCV copied verbatim,
    /// time taken from the window start.
    fn from(agg: &AggregateMessage) -> Self {
        Self {
            time: agg.start_ms,
            open: agg.open,
            high: agg.high,
            low: agg.low,
            close: agg.close,
            volume: agg.volume,
        }
    }
}

/// A decoded server record, closed over the known `ev` tags.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// Connection lifecycle status update.
    Status(StatusMessage),
    /// Aggregate bar.
    Aggregate(AggregateMessage),
}

// =============================================================================
// REST Response Shapes
// =============================================================================

/// Envelope shared by the reference-ticker endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerListResponse {
    /// Matched tickers.
    #[serde(default)]
    pub results: Vec<TickerRecord>,
}

/// Envelope of the single-ticker detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerDetailResponse {
    /// The matched ticker, absent when unknown.
    pub results: Option<TickerRecord>,
}

/// One reference-ticker record.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerRecord {
    /// Ticker symbol.
    pub ticker: String,
    /// Company or instrument name.
    #[serde(default)]
    pub name: String,
    /// Listing exchange code (MIC).
    #[serde(default)]
    pub primary_exchange: Option<String>,
    /// Instrument type code.
    #[serde(default, rename = "type")]
    pub ticker_type: Option<String>,
    /// Long-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// SIC sector description.
    #[serde(default)]
    pub sic_description: Option<String>,
}

/// Envelope of the aggregate-bars endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatesResponse {
    /// Ticker the aggregates belong to.
    #[serde(default)]
    pub ticker: String,
    /// Number of aggregates in `results`.
    #[serde(default, rename = "resultsCount")]
    pub results_count: u64,
    /// Aggregate records in ascending time order.
    #[serde(default)]
    pub results: Vec<AggregateRecord>,
}

/// One historical aggregate record.
///
/// # Wire Format (JSON)
/// ```json
/// {"t":1700000040000,"o":189.34,"h":189.37,"l":189.30,"c":189.35,"v":4110}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AggregateRecord {
    /// Bucket start, epoch milliseconds.
    #[serde(rename = "t")]
    pub time_ms: i64,
    /// Open price.
    #[serde(rename = "o")]
    pub open: f64,
    /// High price.
    #[serde(rename = "h")]
    pub high: f64,
    /// Low price.
    #[serde(rename = "l")]
    pub low: f64,
    /// Close price.
    #[serde(rename = "c")]
    pub close: f64,
    /// Volume.
    #[serde(rename = "v")]
    pub volume: f64,
}

impl From<&AggregateRecord> for Bar {
    fn from(record: &AggregateRecord) -> Self {
        Self {
            time: record.time_ms,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        }
    }
}
