//! Global atomic counters for routing observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    signals_sent: AtomicU64,
    deliveries: AtomicU64,
    signals_suppressed: AtomicU64,
    agents_added: AtomicU64,
    agents_removed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            signals_sent: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            signals_suppressed: AtomicU64::new(0),
            agents_added: AtomicU64::new(0),
            agents_removed: AtomicU64::new(0),
        }
    }

    /// A node started dispatching a signal it provides.
    pub fn inc_signals_sent(&self) {
        self.signals_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// A signal reached one interested peer.
    pub fn inc_deliveries(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    /// A filter stopped a signal in transit.
    pub fn inc_suppressed(&self) {
        self.signals_suppressed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "signals_suppressed", "counter incremented");
    }

    pub fn inc_agents_added(&self) {
        self.agents_added.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agents_added", "counter incremented");
    }

    pub fn inc_agents_removed(&self) {
        self.agents_removed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "agents_removed", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            signals_sent = self.signals_sent(),
            deliveries = self.deliveries(),
            signals_suppressed = self.signals_suppressed(),
            agents_added = self.agents_added(),
            agents_removed = self.agents_removed(),
        );
    }

    pub fn signals_sent(&self) -> u64 {
        self.signals_sent.load(Ordering::Relaxed)
    }

    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    pub fn signals_suppressed(&self) -> u64 {
        self.signals_suppressed.load(Ordering::Relaxed)
    }

    pub fn agents_added(&self) -> u64 {
        self.agents_added.load(Ordering::Relaxed)
    }

    pub fn agents_removed(&self) -> u64 {
        self.agents_removed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.signals_sent.store(0, Ordering::Relaxed);
        self.deliveries.store(0, Ordering::Relaxed);
        self.signals_suppressed.store(0, Ordering::Relaxed);
        self.agents_added.store(0, Ordering::Relaxed);
        self.agents_removed.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_signals_sent();
        m.inc_deliveries();
        m.inc_deliveries();
        assert_eq!(m.signals_sent(), 1);
        assert_eq!(m.deliveries(), 2);

        m.inc_agents_added();
        m.inc_agents_added();
        m.inc_agents_removed();
        assert_eq!(m.agents_added(), 2);
        assert_eq!(m.agents_removed(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_signals_sent();
        m.inc_suppressed();
        m.inc_agents_added();
        m.reset();
        assert_eq!(m.signals_sent(), 0);
        assert_eq!(m.signals_suppressed(), 0);
        assert_eq!(m.agents_added(), 0);
    }
}
