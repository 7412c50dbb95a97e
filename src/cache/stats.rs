//! Per-tier cache statistics: monotonic counters plus point-in-time gauges.

use std::sync::atomic::{AtomicU64, Ordering};

/// A snapshot of one tier's counters and gauges at the moment `stats()` was
/// called.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TierStats {
  pub tier_name: String,
  pub hits: u64,
  pub misses: u64,
  pub evictions: u64,
  pub sets: u64,
  pub deletes: u64,
  pub bytes_in_use: u64,
  pub entry_count: u64,
}

impl TierStats {
  /// Hit ratio over this tier alone; `0.0` when no requests have been served.
  pub fn hit_ratio(&self) -> f64 {
    let total = self.hits + self.misses;
    if total == 0 {
      0.0
    } else {
      self.hits as f64 / total as f64
    }
  }
}

/// Atomic counters backing a tier's [`TierStats`]. Gauges (`bytes_in_use`,
/// `entry_count`) are supplied at snapshot time by the tier itself, since they
/// reflect live map state rather than an accumulated count.
#[derive(Default)]
pub struct TierCounters {
  hits: AtomicU64,
  misses: AtomicU64,
  evictions: AtomicU64,
  sets: AtomicU64,
  deletes: AtomicU64,
}

impl TierCounters {
  pub fn record_hit(&self) {
    self.hits.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_miss(&self) {
    self.misses.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_eviction(&self) {
    self.evictions.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_set(&self) {
    self.sets.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_delete(&self) {
    self.deletes.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self, tier_name: &str, bytes_in_use: u64, entry_count: u64) -> TierStats {
    TierStats {
      tier_name: tier_name.to_string(),
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      evictions: self.evictions.load(Ordering::Relaxed),
      sets: self.sets.load(Ordering::Relaxed),
      deletes: self.deletes.load(Ordering::Relaxed),
      bytes_in_use,
      entry_count,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hit_ratio_is_zero_with_no_traffic() {
    let stats = TierStats::default();
    assert_eq!(stats.hit_ratio(), 0.0);
  }

  #[test]
  fn hit_ratio_reflects_recorded_traffic() {
    let counters = TierCounters::default();
    counters.record_hit();
    counters.record_hit();
    counters.record_miss();
    let snapshot = counters.snapshot("memory", 0, 0);
    assert_eq!(snapshot.hits, 2);
    assert_eq!(snapshot.misses, 1);
    assert!((snapshot.hit_ratio() - (2.0 / 3.0)).abs() < 1e-9);
  }
}
