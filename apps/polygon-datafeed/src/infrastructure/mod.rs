//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Polygon provider adapters (streaming channel, REST endpoints).
pub mod polygon;

/// Configuration loading.
pub mod config;

/// Log subscriber setup.
pub mod telemetry;
