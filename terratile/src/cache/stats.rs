//! Cache statistics tracking and reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters for one [`TileCache`](super::TileCache).
///
/// Updated lock-free from concurrent lookups; read through
/// [`CacheStats::snapshot`].
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt: AtomicU64,
    fallback_hits: AtomicU64,
    fallback_misses: AtomicU64,
    writes: AtomicU64,
    write_conflicts: AtomicU64,
    write_failures: AtomicU64,
    created_at: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            corrupt: AtomicU64::new(0),
            fallback_hits: AtomicU64::new(0),
            fallback_misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            write_conflicts: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    /// Record a local store hit.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a local store miss.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row that failed to decode.
    pub fn record_corrupt(&self) {
        self.corrupt.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_miss(&self) {
        self.fallback_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful write-back.
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a write-back that lost the insert race.
    pub fn record_write_conflict(&self) {
        self.write_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed write-back.
    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the uptime duration since statistics started.
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            corrupt: self.corrupt.load(Ordering::Relaxed),
            fallback_hits: self.fallback_hits.load(Ordering::Relaxed),
            fallback_misses: self.fallback_misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_conflicts: self.write_conflicts.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

/// Snapshot of cache statistics for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub corrupt: u64,
    pub fallback_hits: u64,
    pub fallback_misses: u64,
    pub writes: u64,
    pub write_conflicts: u64,
    pub write_failures: u64,
    pub uptime_secs: u64,
}

impl CacheStatistics {
    /// Local store hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }

    /// Share of local misses the fallback resolved (0.0 to 1.0).
    pub fn fallback_hit_rate(&self) -> f64 {
        ratio(self.fallback_hits, self.fallback_hits + self.fallback_misses)
    }

    /// Share of all lookups that produced a record (0.0 to 1.0).
    pub fn overall_hit_rate(&self) -> f64 {
        ratio(self.hits + self.fallback_hits, self.hits + self.misses)
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self, name: &str) -> String {
        format!(
            r#"Tile Cache Statistics
Cache: {}

LOCAL STORE
  Hits:        {}
  Misses:      {}
  Corrupt:     {}
  Hit Rate:    {:.1}%

FALLBACK
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%

WRITE-BACK
  Writes:      {}
  Conflicts:   {}
  Failures:    {}

OVERALL
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            name,
            self.hits,
            self.misses,
            self.corrupt,
            self.hit_rate() * 100.0,
            self.fallback_hits,
            self.fallback_misses,
            self.fallback_hit_rate() * 100.0,
            self.writes,
            self.write_conflicts,
            self.write_failures,
            self.overall_hit_rate() * 100.0,
            self.uptime_secs,
        )
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
