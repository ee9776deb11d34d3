#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Polygon Datafeed - Charting Data Adapter
//!
//! Bridges Polygon.io's market-data APIs to the datafeed contract of a
//! charting widget: symbol search and resolution over REST, historical
//! aggregate bars over REST, and live per-minute bars over a single
//! multiplexed WebSocket connection.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core data types and subscription bookkeeping
//!   - `bars`: OHLCV bars, resolutions, history status
//!   - `symbols`: Search results and resolved symbol metadata
//!   - `subscription`: Subscription registry and ticker-filtered fan-out
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Gateway interface to the market-data provider
//!   - `datafeed`: The datafeed contract implementation
//!   - `debounce`: Trailing-edge call debouncing
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `polygon`: WebSocket stream client and REST gateway
//!   - `config`: Environment-based configuration
//!   - `telemetry`: Log subscriber setup
//!
//! # Data Flow
//!
//! ```text
//! Polygon WS  ──► StreamClient ──► event pump ──► SubscriptionRegistry ──► subscribers
//! Polygon REST ──► RestClient ──► DatafeedService ──► search / resolve / history
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core datafeed types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::bars::{Bar, HistoryStatus, Resolution, ResolutionError, Timespan};
pub use domain::subscription::{BarSender, BarSubscription, SubscriptionRegistry};
pub use domain::symbols::{SymbolInfo, SymbolSearchResult, strip_exchange_prefix};

// Application services
pub use application::datafeed::{DatafeedService, pump_stream_events};
pub use application::debounce::Debouncer;
pub use application::ports::{GatewayError, MarketDataGateway};

// Infrastructure config
pub use infrastructure::config::{ConfigError, DatafeedConfig, LivenessMode, PollSettings};

// Polygon adapters (for integration tests)
pub use infrastructure::polygon::{
    ApiKey, JsonCodec, ReconnectConfig, RestClient, StreamClient, StreamClientConfig,
    StreamClientError, StreamEvent,
};

// Telemetry
pub use infrastructure::telemetry::init as init_telemetry;
