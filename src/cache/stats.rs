//! Cache Statistics Module
//!
//! Access-time summary of stored entries plus hit/miss/eviction counters for
//! the current cache instance.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot returned by `Cache::stats`.
///
/// `entries`, `oldest_access` and `newest_access` come from the stored
/// access-time records and survive restarts. On an empty cache the
/// timestamps are defaults (`oldest_access` = now, `newest_access` = 0), so
/// check `entries` first.
///
/// `hits`, `misses` and `evictions` only count activity of this instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of memoized results with an access-time record
    pub entries: usize,
    /// Least recent access (Unix seconds)
    pub oldest_access: f64,
    /// Most recent access (Unix seconds)
    pub newest_access: f64,
    /// Calls answered from the cache
    pub hits: u64,
    /// Calls that had to compute
    pub misses: u64,
    /// Entries removed by age-based clearing
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no calls have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Access Summary ==
    /// Folds one stored access time into the summary.
    pub fn observe_access(&mut self, atime: f64) {
        self.entries += 1;
        self.oldest_access = self.oldest_access.min(atime);
        self.newest_access = self.newest_access.max(atime);
    }

    /// Seconds since the least recent access, relative to `now`.
    pub fn oldest_age(&self, now: f64) -> f64 {
        (now - self.oldest_access).max(0.0)
    }

    /// Seconds since the most recent access, relative to `now`.
    pub fn newest_age(&self, now: f64) -> f64 {
        (now - self.newest_access).max(0.0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_evictions() {
        let mut stats = CacheStats::new();
        stats.record_evictions(2);
        stats.record_evictions(3);
        assert_eq!(stats.evictions, 5);
    }

    #[test]
    fn test_observe_access() {
        let mut stats = CacheStats {
            oldest_access: 1000.0,
            newest_access: 0.0,
            ..CacheStats::default()
        };

        stats.observe_access(500.0);
        stats.observe_access(700.0);
        stats.observe_access(600.0);

        assert_eq!(stats.entries, 3);
        assert_eq!(stats.oldest_access, 500.0);
        assert_eq!(stats.newest_access, 700.0);
        assert_eq!(stats.oldest_age(1000.0), 500.0);
        assert_eq!(stats.newest_age(1000.0), 300.0);
    }
}
