//! The memory tier: an LRU cache bounded by both item count and total bytes.

use std::{
  collections::VecDeque,
  time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::cache::{
  stats::{TierCounters, TierStats},
  value::CacheValue,
};

/// Configuration for the memory tier, per the configuration enumeration's
/// `capacity_items` / `capacity_bytes` / `default_ttl_seconds` /
/// `compression_enabled` / `compression_threshold_bytes` fields.
#[derive(Clone, Debug)]
pub struct MemoryCacheConfig {
  pub capacity_items: usize,
  pub capacity_bytes: usize,
  pub default_ttl_seconds: u64,
  pub compression_enabled: bool,
  pub compression_threshold_bytes: usize,
}

impl Default for MemoryCacheConfig {
  fn default() -> Self {
    Self {
      capacity_items: 10_000,
      capacity_bytes: 64 * 1024 * 1024,
      default_ttl_seconds: 300,
      compression_enabled: false,
      compression_threshold_bytes: 1024,
    }
  }
}

struct Entry {
  bytes: Vec<u8>,
  compressed: bool,
  stored_at: Instant,
  ttl: Duration,
  size_bytes: usize,
}

impl Entry {
  fn is_expired(&self, now: Instant) -> bool {
    now.saturating_duration_since(self.stored_at) > self.ttl
  }
}

/// LRU memory tier. Recency is tracked as a separate ordered list rather than an
/// intrusive linked list threaded through the map itself — simpler to reason
/// about at the cost of an O(n) scan on eviction, which only runs when the
/// tier is actually over a cap.
pub struct MemoryTier {
  config: MemoryCacheConfig,
  entries: DashMap<String, Entry>,
  recency: Mutex<VecDeque<String>>,
  bytes_in_use: std::sync::atomic::AtomicUsize,
  counters: TierCounters,
}

impl MemoryTier {
  pub fn new(config: MemoryCacheConfig) -> Self {
    Self {
      config,
      entries: DashMap::new(),
      recency: Mutex::new(VecDeque::new()),
      bytes_in_use: std::sync::atomic::AtomicUsize::new(0),
      counters: TierCounters::default(),
    }
  }

  fn touch(&self, key: &str) {
    let mut recency = self.recency.lock();
    if let Some(pos) = recency.iter().position(|k| k == key) {
      recency.remove(pos);
    }
    recency.push_back(key.to_string());
  }

  fn untrack(&self, key: &str) {
    let mut recency = self.recency.lock();
    if let Some(pos) = recency.iter().position(|k| k == key) {
      recency.remove(pos);
    }
  }

  pub fn get(&self, key: &str) -> (Option<CacheValue>, bool) {
    let Some(entry) = self.entries.get(key) else {
      self.counters.record_miss();
      return (None, false);
    };

    if entry.is_expired(Instant::now()) {
      drop(entry);
      self.remove_entry(key);
      self.counters.record_miss();
      return (None, false);
    }

    let value = decode(&entry.bytes, entry.compressed);
    drop(entry);
    self.touch(key);

    match value {
      Some(value) => {
        self.counters.record_hit();
        (Some(value), true)
      }
      None => {
        self.counters.record_miss();
        (None, false)
      }
    }
  }

  pub fn set(&self, key: &str, value: &CacheValue, ttl: Option<Duration>) {
    let ttl = ttl.unwrap_or(Duration::from_secs(self.config.default_ttl_seconds));
    let serialized = serde_json::to_vec(value).unwrap_or_default();

    let (bytes, compressed) = if self.config.compression_enabled
      && serialized.len() > self.config.compression_threshold_bytes
    {
      compress(&serialized)
    } else {
      (serialized, false)
    };

    let size_bytes = bytes.len();
    let entry = Entry {
      bytes,
      compressed,
      stored_at: Instant::now(),
      ttl,
      size_bytes,
    };

    if let Some(old) = self.entries.insert(key.to_string(), entry) {
      self
        .bytes_in_use
        .fetch_sub(old.size_bytes, std::sync::atomic::Ordering::Relaxed);
    }
    self
      .bytes_in_use
      .fetch_add(size_bytes, std::sync::atomic::Ordering::Relaxed);
    self.touch(key);
    self.counters.record_set();

    self.evict_until_within_caps();
  }

  pub fn delete(&self, key: &str) -> bool {
    let existed = self.remove_entry(key);
    if existed {
      self.counters.record_delete();
    }
    existed
  }

  fn remove_entry(&self, key: &str) -> bool {
    if let Some((_, entry)) = self.entries.remove(key) {
      self
        .bytes_in_use
        .fetch_sub(entry.size_bytes, std::sync::atomic::Ordering::Relaxed);
      self.untrack(key);
      true
    } else {
      false
    }
  }

  pub fn exists(&self, key: &str) -> bool {
    let expired = match self.entries.get(key) {
      Some(entry) => entry.is_expired(Instant::now()),
      None => return false,
    };
    if expired {
      self.remove_entry(key);
      false
    } else {
      true
    }
  }

  pub fn clear(&self) {
    self.entries.clear();
    self.recency.lock().clear();
    self.bytes_in_use.store(0, std::sync::atomic::Ordering::Relaxed);
  }

  pub fn stats(&self) -> TierStats {
    self.counters.snapshot(
      "memory",
      self.bytes_in_use.load(std::sync::atomic::Ordering::Relaxed) as u64,
      self.entries.len() as u64,
    )
  }

  /// Copies `value` into this tier at `ttl`, used for promotion from a lower
  /// tier. Identical to `set` except it never trips the compression threshold
  /// accounting differently — promotion is just a normal store.
  pub fn promote(&self, key: &str, value: &CacheValue, ttl: Duration) {
    self.set(key, value, Some(ttl));
  }

  fn evict_until_within_caps(&self) {
    loop {
      let over_items = self.entries.len() > self.config.capacity_items;
      let over_bytes =
        self.bytes_in_use.load(std::sync::atomic::Ordering::Relaxed) > self.config.capacity_bytes;
      if !over_items && !over_bytes {
        break;
      }
      let oldest = { self.recency.lock().pop_front() };
      match oldest {
        Some(key) => {
          if self.remove_entry(&key) {
            self.counters.record_eviction();
          }
        }
        None => break,
      }
    }
  }
}

fn decode(bytes: &[u8], compressed: bool) -> Option<CacheValue> {
  let plain = if compressed { decompress(bytes) } else { bytes.to_vec() };
  serde_json::from_slice(&plain).ok()
}

#[cfg(feature = "plugins")]
fn compress(bytes: &[u8]) -> (Vec<u8>, bool) {
  use std::io::Write;
  let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
  if encoder.write_all(bytes).is_err() {
    return (bytes.to_vec(), false);
  }
  match encoder.finish() {
    Ok(compressed) => (compressed, true),
    Err(_) => (bytes.to_vec(), false),
  }
}

#[cfg(feature = "plugins")]
fn decompress(bytes: &[u8]) -> Vec<u8> {
  use std::io::Read;
  let mut decoder = flate2::read::GzDecoder::new(bytes);
  let mut out = Vec::new();
  if decoder.read_to_end(&mut out).is_ok() {
    out
  } else {
    Vec::new()
  }
}

#[cfg(not(feature = "plugins"))]
fn compress(bytes: &[u8]) -> (Vec<u8>, bool) {
  tracing::debug!("cache compression requested but the `plugins` feature (flate2) is disabled");
  (bytes.to_vec(), false)
}

#[cfg(not(feature = "plugins"))]
fn decompress(bytes: &[u8]) -> Vec<u8> {
  bytes.to_vec()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tier(capacity_items: usize, capacity_bytes: usize) -> MemoryTier {
    MemoryTier::new(MemoryCacheConfig {
      capacity_items,
      capacity_bytes,
      default_ttl_seconds: 300,
      compression_enabled: false,
      compression_threshold_bytes: 1024,
    })
  }

  #[test]
  fn round_trips_a_value() {
    let tier = tier(10, 1_000_000);
    tier.set("k", &CacheValue::Integer(7), None);
    let (value, found) = tier.get("k");
    assert!(found);
    assert_eq!(value, Some(CacheValue::Integer(7)));
  }

  #[test]
  fn expired_entry_reads_as_a_miss() {
    let tier = MemoryTier::new(MemoryCacheConfig {
      default_ttl_seconds: 0,
      ..MemoryCacheConfig::default()
    });
    tier.set("k", &CacheValue::Bool(true), Some(Duration::from_millis(0)));
    std::thread::sleep(Duration::from_millis(5));
    let (value, found) = tier.get("k");
    assert!(!found);
    assert_eq!(value, None);
  }

  #[test]
  fn item_cap_evicts_least_recently_used() {
    let tier = tier(2, 1_000_000);
    tier.set("a", &CacheValue::Integer(1), None);
    tier.set("b", &CacheValue::Integer(2), None);
    tier.set("c", &CacheValue::Integer(3), None);

    assert!(!tier.exists("a"));
    assert!(tier.exists("b"));
    assert!(tier.exists("c"));
    assert_eq!(tier.stats().entry_count, 2);
  }

  #[test]
  fn delete_is_idempotent() {
    let tier = tier(10, 1_000_000);
    tier.set("k", &CacheValue::Bool(true), None);
    assert!(tier.delete("k"));
    assert!(!tier.delete("k"));
  }

  #[test]
  fn accessing_an_entry_protects_it_from_eviction() {
    let tier = tier(2, 1_000_000);
    tier.set("a", &CacheValue::Integer(1), None);
    tier.set("b", &CacheValue::Integer(2), None);
    // Touch `a` so it becomes more recently used than `b`.
    let _ = tier.get("a");
    tier.set("c", &CacheValue::Integer(3), None);

    assert!(tier.exists("a"));
    assert!(!tier.exists("b"));
  }
}
