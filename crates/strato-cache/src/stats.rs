//! Sink statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for distribution sink operations.
///
/// All counters are atomic and can be safely read from multiple
/// threads.
#[derive(Debug, Default)]
pub struct SinkStats {
    /// Number of snapshots deposited.
    deposits: AtomicU64,
    /// Number of fetches that found a snapshot.
    fetch_hits: AtomicU64,
    /// Number of fetches that found nothing.
    fetch_misses: AtomicU64,
    /// Number of snapshots removed.
    removals: AtomicU64,
    /// Number of subscription deliveries.
    notifications: AtomicU64,
}

impl SinkStats {
    /// Create new sink statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit.
    #[inline]
    pub(crate) fn record_deposit(&self) {
        self.deposits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fetch hit.
    #[inline]
    pub(crate) fn record_hit(&self) {
        self.fetch_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fetch miss.
    #[inline]
    pub(crate) fn record_miss(&self) {
        self.fetch_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removal.
    #[inline]
    pub(crate) fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record subscription deliveries.
    #[inline]
    pub(crate) fn record_notifications(&self, count: u64) {
        self.notifications.fetch_add(count, Ordering::Relaxed);
    }

    /// Get total snapshots deposited.
    #[inline]
    pub fn deposits(&self) -> u64 {
        self.deposits.load(Ordering::Relaxed)
    }

    /// Get total fetch hits.
    #[inline]
    pub fn fetch_hits(&self) -> u64 {
        self.fetch_hits.load(Ordering::Relaxed)
    }

    /// Get total fetch misses.
    #[inline]
    pub fn fetch_misses(&self) -> u64 {
        self.fetch_misses.load(Ordering::Relaxed)
    }

    /// Get total snapshots removed.
    #[inline]
    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    /// Get total subscription deliveries.
    #[inline]
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    /// Calculate the fetch hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.fetch_hits() as f64;
        let total = hits + self.fetch_misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.deposits.store(0, Ordering::Relaxed);
        self.fetch_hits.store(0, Ordering::Relaxed);
        self.fetch_misses.store(0, Ordering::Relaxed);
        self.removals.store(0, Ordering::Relaxed);
        self.notifications.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_basic() {
        let stats = SinkStats::new();

        stats.record_deposit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_notifications(3);

        assert_eq!(stats.deposits(), 1);
        assert_eq!(stats.fetch_hits(), 2);
        assert_eq!(stats.fetch_misses(), 1);
        assert_eq!(stats.notifications(), 3);
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn stats_reset() {
        let stats = SinkStats::new();
        stats.record_deposit();
        stats.record_removal();
        stats.reset();
        assert_eq!(stats.deposits(), 0);
        assert_eq!(stats.removals(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
