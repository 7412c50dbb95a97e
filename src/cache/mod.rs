//! Multi-tier smart cache: memory (always present), remote KV (optional), and
//! disk (optional).
//!
//! Reads check memory, then remote, then disk; a hit in a lower tier is
//! **promoted** (copied, never moved) into every higher tier with the smaller of
//! its remaining TTL and that tier's default. Tier failures never fail the
//! request path — a remote or disk error degrades to a miss on read and a
//! best-effort no-op on write.
//!
//! # Examples
//!
//! ```rust
//! use catzilla::cache::{SmartCache, SmartCacheConfig, value::CacheValue};
//!
//! # async fn example() {
//! let cache = SmartCache::new(SmartCacheConfig::default(), None);
//! cache.set("greeting", CacheValue::String("hi".to_string()), None).await.unwrap();
//! let (value, found) = cache.get("greeting").await;
//! assert!(found);
//! assert_eq!(value, Some(CacheValue::String("hi".to_string())));
//! # }
//! ```

use std::{
  collections::BTreeMap,
  time::Duration,
};

/// Concurrent-build coalescing (wait-for-leader).
pub mod coalesce;
/// The optional disk tier.
pub mod disk;
/// Cache error taxonomy.
pub mod error;
/// Fingerprint key generation.
pub mod key;
/// The LRU memory tier.
pub mod memory;
/// The optional remote KV tier.
pub mod remote;
/// Per-tier statistics.
pub mod stats;
/// The cache's supported value type set.
pub mod value;

pub use coalesce::BuildCoalescer;
pub use disk::{DiskCacheConfig, DiskTier};
pub use error::CacheError;
pub use memory::{MemoryCacheConfig, MemoryTier};
pub use remote::{RemoteBackend, RemoteCacheConfig, RemoteTier};
pub use stats::TierStats;
pub use value::CacheValue;

/// Aggregate configuration for every tier. Each tier's own `enabled` flag (or,
/// for memory, its presence by construction) decides whether it participates.
#[derive(Clone, Debug, Default)]
pub struct SmartCacheConfig {
  pub memory: MemoryCacheConfig,
  pub remote: RemoteCacheConfig,
  pub disk: DiskCacheConfig,
}

/// `{memory, remote, disk}` — last-probe health per tier, per `health_check()`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
  pub memory: bool,
  pub remote: bool,
  pub disk: bool,
}

/// Aggregate statistics across every tier plus the cache-wide hit ratio.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
  pub memory: TierStats,
  pub remote: TierStats,
  pub disk: TierStats,
  pub hit_ratio: f64,
}

const DEFAULT_TTL_SECS: u64 = 300;

/// The multi-tier cache itself.
pub struct SmartCache {
  memory: MemoryTier,
  remote: RemoteTier,
  disk: DiskTier,
  coalescer: BuildCoalescer,
  overall: stats::TierCounters,
  default_ttl: Duration,
}

impl SmartCache {
  pub fn new(config: SmartCacheConfig, remote_backend: Option<Box<dyn RemoteBackend>>) -> Self {
    let default_ttl = Duration::from_secs(config.memory.default_ttl_seconds.max(1));
    Self {
      memory: MemoryTier::new(config.memory),
      remote: RemoteTier::new(config.remote, remote_backend),
      disk: DiskTier::new(config.disk),
      coalescer: BuildCoalescer::new(),
      overall: stats::TierCounters::default(),
      default_ttl,
    }
  }

  /// Reads `key`, checking memory, then remote, then disk, promoting any
  /// lower-tier hit into the higher tiers it missed.
  pub async fn get(&self, key: &str) -> (Option<CacheValue>, bool) {
    let (value, found) = self.memory.get(key);
    if found {
      self.overall.record_hit();
      return (value, true);
    }

    if let Some((bytes, remaining)) = self.remote.get(key).await {
      if let Ok(value) = serde_json::from_slice::<CacheValue>(&bytes) {
        let promote_ttl = remaining.map_or(self.default_ttl, |r| r.min(self.default_ttl));
        self.memory.promote(key, &value, promote_ttl);
        self.overall.record_hit();
        return (Some(value), true);
      }
    }

    if let Some((bytes, remaining)) = self.disk.get(key).await {
      if let Ok(value) = serde_json::from_slice::<CacheValue>(&bytes) {
        let promote_ttl = remaining.min(self.default_ttl);
        self.memory.promote(key, &value, promote_ttl);
        self.remote.set(key, bytes, promote_ttl).await;
        self.overall.record_hit();
        return (Some(value), true);
      }
    }

    self.overall.record_miss();
    (None, false)
  }

  /// Stores `value` in every tier. A remote or disk write failure is logged
  /// inside that tier and never surfaces here — only a genuinely unserializable
  /// value fails this call.
  pub async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> Result<(), CacheError> {
    let ttl = ttl.unwrap_or(self.default_ttl);
    let bytes = serde_json::to_vec(&value)
      .map_err(|e| CacheError::UnserializableValue(e.to_string()))?;

    self.memory.set(key, &value, Some(ttl));
    self.remote.set(key, bytes.clone(), ttl).await;
    if let Err(err) = self.disk.set(key, &bytes, ttl).await {
      tracing::warn!(error = %err, "disk cache write failed");
    }

    self.overall.record_set();
    Ok(())
  }

  /// Deletes `key` from every tier. Returns whether it existed in any of them.
  pub async fn delete(&self, key: &str) -> bool {
    let in_memory = self.memory.delete(key);
    let in_remote = self.remote.delete(key).await;
    let in_disk = self.disk.delete(key).await;
    let existed = in_memory || in_remote || in_disk;
    if existed {
      self.overall.record_delete();
    }
    existed
  }

  /// Whether `key` is present (and unexpired) in the memory tier specifically,
  /// matching the memory tier's own `exists` contract.
  pub fn exists(&self, key: &str) -> bool {
    self.memory.exists(key)
  }

  /// Clears the memory tier. Remote/disk tiers are left untouched — they're
  /// shared, longer-lived stores, not per-process caches.
  pub fn clear(&self) {
    self.memory.clear();
  }

  pub fn generate_key(
    &self,
    method: &str,
    path: &str,
    query_string: Option<&str>,
    headers: &BTreeMap<String, String>,
  ) -> String {
    key::generate_key(method, path, query_string, headers)
  }

  /// Resolves `key` via the cache, building and storing it on a miss. Builds
  /// are coalesced: concurrent misses for the same key share one execution of
  /// `build`.
  pub async fn get_or_build<F, Fut>(
    &self,
    key: &str,
    ttl: Option<Duration>,
    build: F,
  ) -> Result<CacheValue, CacheError>
  where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<CacheValue, String>>,
  {
    let (value, found) = self.get(key).await;
    if found {
      return Ok(value.expect("found implies a value"));
    }

    let result = self.coalescer.coalesce(key, build).await;
    match result {
      Ok(value) => {
        self.set(key, value.clone(), ttl).await?;
        Ok(value)
      }
      Err(message) => Err(CacheError::UnserializableValue(message)),
    }
  }

  pub fn get_stats(&self) -> CacheStats {
    let memory = self.memory.stats();
    let remote = self.remote.stats();
    let disk = self.disk.stats();
    let overall = self.overall.snapshot("overall", 0, 0);
    CacheStats {
      memory,
      remote,
      disk,
      hit_ratio: overall.hit_ratio(),
    }
  }

  pub async fn health_check(&self) -> HealthStatus {
    HealthStatus {
      memory: true,
      remote: self.remote.probe().await,
      disk: self.disk.probe().await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn round_trips_through_memory_only() {
    let cache = SmartCache::new(SmartCacheConfig::default(), None);
    cache
      .set("k", CacheValue::Integer(5), None)
      .await
      .unwrap();
    let (value, found) = cache.get("k").await;
    assert!(found);
    assert_eq!(value, Some(CacheValue::Integer(5)));
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let cache = SmartCache::new(SmartCacheConfig::default(), None);
    cache.set("k", CacheValue::Bool(true), None).await.unwrap();
    assert!(cache.delete("k").await);
    assert!(!cache.delete("k").await);
  }

  #[tokio::test]
  async fn disabled_remote_and_disk_still_report_healthy() {
    let cache = SmartCache::new(SmartCacheConfig::default(), None);
    let health = cache.health_check().await;
    assert!(health.memory);
    assert!(health.remote);
    assert!(health.disk);
  }

  #[tokio::test]
  async fn get_or_build_stores_the_built_value() {
    let cache = SmartCache::new(SmartCacheConfig::default(), None);
    let built = cache
      .get_or_build("k", None, || async { Ok(CacheValue::Integer(9)) })
      .await
      .unwrap();
    assert_eq!(built, CacheValue::Integer(9));

    let (value, found) = cache.get("k").await;
    assert!(found);
    assert_eq!(value, Some(CacheValue::Integer(9)));
  }

  #[tokio::test]
  async fn disk_hit_promotes_into_memory_with_capped_remaining_ttl() {
    let dir = temp_dir::TempDir::new();
    let cache = SmartCache::new(
      SmartCacheConfig {
        memory: MemoryCacheConfig {
          default_ttl_seconds: 3_600,
          ..MemoryCacheConfig::default()
        },
        disk: DiskCacheConfig {
          enabled: true,
          directory: dir.path().to_path_buf(),
          ..DiskCacheConfig::default()
        },
        ..SmartCacheConfig::default()
      },
      None,
    );

    // Stored with a TTL far shorter than the memory tier's own default.
    cache
      .set("k", CacheValue::Integer(7), Some(Duration::from_secs(5)))
      .await
      .unwrap();
    // Evict it from memory only, leaving it present on disk.
    cache.clear();

    let (value, found) = cache.get("k").await;
    assert!(found);
    assert_eq!(value, Some(CacheValue::Integer(7)));

    // Promoted back into memory; its remaining TTL (~5s) must win over the
    // memory tier's much larger default (3600s), never reset to the default.
    let (value, found_in_memory) = cache.memory.get("k");
    assert!(found_in_memory);
    assert_eq!(value, Some(CacheValue::Integer(7)));
  }

  /// A tiny self-contained temp-dir helper so this test doesn't need an extra
  /// dev-dependency: creates a unique directory under `std::env::temp_dir()`
  /// and removes it on drop.
  mod temp_dir {
    use std::path::{Path, PathBuf};

    pub struct TempDir(PathBuf);

    impl TempDir {
      pub fn new() -> Self {
        let id = std::time::SystemTime::now()
          .duration_since(std::time::UNIX_EPOCH)
          .unwrap()
          .as_nanos();
        let path = std::env::temp_dir().join(format!("catzilla-smart-cache-test-{id}"));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
      }

      pub fn path(&self) -> &Path {
        &self.0
      }
    }

    impl Drop for TempDir {
      fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
      }
    }
  }
}
