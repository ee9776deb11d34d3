//! Log Subscriber Setup
//!
//! Configures the `tracing` subscriber for the datafeed service: an
//! environment filter (via `RUST_LOG`) layered with a compact fmt writer.
//!
//! # Usage
//!
//! ```ignore
//! use polygon_datafeed::infrastructure::telemetry;
//!
//! telemetry::init();
//! tracing::info!("starting up");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global log subscriber.
///
/// Respects `RUST_LOG`; defaults the crate itself to `info` and quiets
/// the HTTP stack.
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive(
            "polygon_datafeed=info"
                .parse()
                .expect("static directive 'polygon_datafeed=info' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        )
        .add_directive(
            "reqwest=warn"
                .parse()
                .expect("static directive 'reqwest=warn' is valid"),
        )
        .add_directive(
            "tungstenite=warn"
                .parse()
                .expect("static directive 'tungstenite=warn' is valid"),
        );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
