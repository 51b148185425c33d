//! Cache counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of cache activity since construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Reads answered by a fresh entry
    pub hits: u64,
    /// Reads answered by an expired entry under stale-while-revalidate
    pub stale_hits: u64,
    /// Reads that waited on a fetch
    pub misses: u64,
    /// Waited-on fetches that failed
    pub fetch_failures: u64,
    /// Background refreshes started
    pub revalidations_started: u64,
    /// Background refreshes that failed
    pub revalidations_failed: u64,
    /// Entries removed by the sweep
    pub swept: u64,
    /// Entries currently stored
    pub entries: usize,
    /// Background refreshes currently in flight
    pub revalidating: usize,
}

impl CacheStats {
    /// Fraction of reads served from the cache, stale or fresh.
    pub fn hit_ratio(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            return 0.0;
        }
        served as f64 / total as f64
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    fetch_failures: AtomicU64,
    revalidations_started: AtomicU64,
    revalidations_failed: AtomicU64,
    swept: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn revalidation_started(&self) {
        self.revalidations_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn revalidation_failed(&self) {
        self.revalidations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn swept(&self, count: usize) {
        self.swept.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize, revalidating: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            revalidations_started: self.revalidations_started.load(Ordering::Relaxed),
            revalidations_failed: self.revalidations_failed.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
            entries,
            revalidating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let recorder = StatsRecorder::default();
        recorder.hit();
        recorder.hit();
        recorder.stale_hit();
        recorder.miss();
        recorder.swept(3);

        let stats = recorder.snapshot(4, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.stale_hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.swept, 3);
        assert_eq!(stats.entries, 4);
        assert_eq!(stats.revalidating, 1);
    }

    #[test]
    fn test_hit_ratio() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);

        let stats = CacheStats {
            hits: 2,
            stale_hits: 1,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
