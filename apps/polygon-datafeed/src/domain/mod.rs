//! Domain layer - Core datafeed types with no external integrations.

/// Bar records, resolution tokens, and history pagination hints.
pub mod bars;

/// Bar subscription registry and fan-out.
pub mod subscription;

/// Symbol descriptors produced by search and resolution.
pub mod symbols;
