//! Configuration Module
//!
//! Configuration loading for the datafeed service.

mod settings;

pub use settings::{ConfigError, DatafeedConfig, LivenessMode, PollSettings};
