//! Trailing-Edge Debouncer
//!
//! Collapses bursts of calls into one: each call restarts the quiet window,
//! and only the latest call's action runs once the window elapses. Used to
//! keep keystroke-driven symbol searches from hammering the provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default quiet window before a burst's last call fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Trailing-edge debouncer.
///
/// Cheap to clone; clones share the same generation counter, so a call on
/// any clone supersedes pending calls on all of them.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `action` to run after the quiet window, unless another call
    /// arrives first. Superseded actions never run.
    pub fn call<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let counter = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if counter.load(Ordering::SeqCst) == generation {
                action().await;
            }
        });
    }
}
