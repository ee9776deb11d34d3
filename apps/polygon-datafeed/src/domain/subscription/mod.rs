//! Bar Subscription Registry
//!
//! Tracks live bar subscriptions keyed by a caller-supplied key and fans
//! incoming bars out to them.
//!
//! # Design
//!
//! The registry owns the subscription list as an explicit collection (no
//! ambient state) and exposes four operations: add, remove-by-key, deliver
//! by ticker, and deliver by key. Removal strips every subscription carrying
//! the key and is idempotent. Delivery by ticker filters on the resolved
//! ticker so a subscriber never receives another symbol's bars; delivery by
//! key silently drops results whose subscription has since been removed
//! (late poll completions).
//!
//! Both the registry and the stream channel set can be touched from the
//! subscribe path and a receive loop concurrently, so the list lives behind
//! a `parking_lot::RwLock`.

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::domain::bars::{Bar, Resolution};
use crate::domain::symbols::SymbolInfo;

/// Delivery handle for one subscription. Each update is a batch of bars in
/// ascending time order.
pub type BarSender = mpsc::UnboundedSender<Vec<Bar>>;

// =============================================================================
// Subscription
// =============================================================================

/// One live bar subscription.
#[derive(Debug, Clone)]
pub struct BarSubscription {
    /// Caller-supplied unique key.
    pub key: String,
    /// Resolved symbol this subscription tracks.
    pub symbol_info: SymbolInfo,
    /// Requested bar granularity.
    pub resolution: Resolution,
    /// Channel receiving bar updates.
    pub sender: BarSender,
}

// =============================================================================
// Registry
// =============================================================================

/// Thread-safe registry of active bar subscriptions.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<Vec<BarSubscription>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription.
    pub fn add(&self, subscription: BarSubscription) {
        self.subscriptions.write().push(subscription);
    }

    /// Remove every subscription matching `key`.
    ///
    /// Returns the number removed; removing an unknown key is a no-op.
    pub fn remove(&self, key: &str) -> usize {
        let mut subs = self.subscriptions.write();
        let before = subs.len();
        subs.retain(|s| s.key != key);
        before - subs.len()
    }

    /// Deliver bars to every subscription whose ticker matches.
    ///
    /// Returns the number of subscriptions that received the batch.
    pub fn deliver(&self, ticker: &str, bars: &[Bar]) -> usize {
        let subs = self.subscriptions.read();
        let mut delivered = 0;

        for sub in subs.iter().filter(|s| s.symbol_info.ticker == ticker) {
            if sub.sender.send(bars.to_vec()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(key = %sub.key, ticker, "subscriber receiver dropped");
            }
        }

        delivered
    }

    /// Deliver bars to the subscription holding `key`, if still registered.
    ///
    /// Returns false when the key is gone; late results for removed
    /// subscriptions are discarded here rather than by cancelling fetches.
    pub fn deliver_to_key(&self, key: &str, bars: &[Bar]) -> bool {
        let subs = self.subscriptions.read();
        subs.iter()
            .find(|s| s.key == key)
            .is_some_and(|s| s.sender.send(bars.to_vec()).is_ok())
    }

    /// Snapshot of the current subscriptions.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BarSubscription> {
        self.subscriptions.read().clone()
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Whether the registry holds no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbols::{DEFAULT_SESSION, DEFAULT_TIMEZONE};

    fn symbol(ticker: &str) -> SymbolInfo {
        SymbolInfo {
            name: ticker.to_string(),
            ticker: ticker.to_string(),
            description: String::new(),
            symbol_type: "stock".to_string(),
            exchange: "XNAS".to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            session: DEFAULT_SESSION.to_string(),
            pricescale: 100,
            minmov: 1,
            has_intraday: true,
            has_daily: true,
            sector: None,
            supported_resolutions: vec!["1".to_string(), "1D".to_string()],
        }
    }

    fn bar(time: i64) -> Bar {
        Bar {
            time,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 10.0,
        }
    }

    fn subscribe(
        registry: &SubscriptionRegistry,
        key: &str,
        ticker: &str,
    ) -> mpsc::UnboundedReceiver<Vec<Bar>> {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.add(BarSubscription {
            key: key.to_string(),
            symbol_info: symbol(ticker),
            resolution: Resolution::Minutes(1),
            sender: tx,
        });
        rx
    }

    #[test]
    fn deliver_filters_by_ticker() {
        let registry = SubscriptionRegistry::new();
        let mut aapl_rx = subscribe(&registry, "A", "AAPL");
        let mut msft_rx = subscribe(&registry, "B", "MSFT");

        let delivered = registry.deliver("AAPL", &[bar(1)]);

        assert_eq!(delivered, 1);
        assert_eq!(aapl_rx.try_recv().unwrap(), vec![bar(1)]);
        assert!(msft_rx.try_recv().is_err());
    }

    #[test]
    fn deliver_fans_out_to_same_ticker() {
        let registry = SubscriptionRegistry::new();
        let mut rx1 = subscribe(&registry, "A", "AAPL");
        let mut rx2 = subscribe(&registry, "B", "AAPL");

        assert_eq!(registry.deliver("AAPL", &[bar(7)]), 2);
        assert_eq!(rx1.try_recv().unwrap(), vec![bar(7)]);
        assert_eq!(rx2.try_recv().unwrap(), vec![bar(7)]);
    }

    #[test]
    fn remove_strips_all_matches_and_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let _rx = subscribe(&registry, "A", "AAPL");

        assert_eq!(registry.remove("A"), 1);
        assert_eq!(registry.remove("A"), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn late_delivery_after_remove_is_dropped() {
        let registry = SubscriptionRegistry::new();
        let mut rx = subscribe(&registry, "A", "AAPL");

        registry.remove("A");

        assert!(!registry.deliver_to_key("A", &[bar(1)]));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn deliver_to_key_reaches_registered_subscription() {
        let registry = SubscriptionRegistry::new();
        let mut rx = subscribe(&registry, "A", "AAPL");

        assert!(registry.deliver_to_key("A", &[bar(3), bar(4)]));
        assert_eq!(rx.try_recv().unwrap(), vec![bar(3), bar(4)]);
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let registry = SubscriptionRegistry::new();
        let _rx1 = subscribe(&registry, "A", "AAPL");
        let _rx2 = subscribe(&registry, "B", "MSFT");

        let keys: Vec<_> = registry.snapshot().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["A".to_string(), "B".to_string()]);
    }
}
