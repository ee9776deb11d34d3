//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the datafeed use-cases and the port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for the market-data provider.
pub mod ports;

/// Datafeed use-cases (search, resolve, history, live subscriptions).
pub mod datafeed;

/// Trailing-edge debouncing for keystroke-driven calls.
pub mod debounce;
