//! The optional remote (KV) tier.
//!
//! There is no bundled Redis client in the teacher's dependency stack, so this
//! tier is expressed as a trait: an application wires in whatever client it
//! already depends on (Redis, Memcached, an internal KV service) by implementing
//! [`RemoteBackend`]. Failures are caught at this layer and turned into a miss
//! or a counted failure — they never propagate past [`RemoteTier`].

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::stats::{TierCounters, TierStats};

/// The operations a remote KV backend must support. `get`/`set`/`delete` take
/// and return already-serialized bytes — the remote tier has no opinion on
/// [`crate::cache::value::CacheValue`], it just moves bytes.
///
/// `get` also reports the entry's remaining TTL when the backend can supply
/// one (e.g. Redis's `PTTL`), so a hit promoted into a higher tier keeps
/// `min(remaining, tier_default)` instead of resetting to the tier default.
/// `None` means the backend doesn't expose remaining TTL for this entry;
/// promotion then falls back to the tier default.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
  async fn get(&self, key: &str) -> anyhow::Result<Option<(Vec<u8>, Option<Duration>)>>;
  async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> anyhow::Result<()>;
  async fn delete(&self, key: &str) -> anyhow::Result<bool>;
  async fn ping(&self) -> anyhow::Result<()>;
}

/// Configuration for the remote tier, per the configuration enumeration's
/// `enabled` / `endpoint` / `timeout_ms` / `namespace` fields.
#[derive(Clone, Debug)]
pub struct RemoteCacheConfig {
  pub enabled: bool,
  pub endpoint: String,
  pub timeout_ms: u64,
  pub namespace: String,
}

impl Default for RemoteCacheConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      endpoint: String::new(),
      timeout_ms: 200,
      namespace: "catzilla".to_string(),
    }
  }
}

pub struct RemoteTier {
  config: RemoteCacheConfig,
  backend: Option<Box<dyn RemoteBackend>>,
  counters: TierCounters,
  last_probe_ok: std::sync::atomic::AtomicBool,
}

impl RemoteTier {
  pub fn new(config: RemoteCacheConfig, backend: Option<Box<dyn RemoteBackend>>) -> Self {
    Self {
      config,
      backend,
      counters: TierCounters::default(),
      last_probe_ok: std::sync::atomic::AtomicBool::new(false),
    }
  }

  fn namespaced(&self, key: &str) -> String {
    format!("{}:{}", self.config.namespace, key)
  }

  fn timeout(&self) -> Duration {
    Duration::from_millis(self.config.timeout_ms)
  }

  /// Reads `key`, returning the bytes alongside the backend's reported
  /// remaining TTL (if any). Any backend error or timeout degrades to a plain
  /// miss — the cache contract forbids a remote failure from propagating to
  /// the caller.
  pub async fn get(&self, key: &str) -> Option<(Vec<u8>, Option<Duration>)> {
    if !self.config.enabled {
      return None;
    }
    let Some(backend) = &self.backend else {
      return None;
    };

    let namespaced = self.namespaced(key);
    match tokio::time::timeout(self.timeout(), backend.get(&namespaced)).await {
      Ok(Ok(Some(found))) => {
        self.counters.record_hit();
        Some(found)
      }
      Ok(Ok(None)) => {
        self.counters.record_miss();
        None
      }
      Ok(Err(err)) => {
        tracing::warn!(error = %err, "remote cache get failed");
        self.counters.record_miss();
        None
      }
      Err(_) => {
        tracing::warn!("remote cache get timed out");
        self.counters.record_miss();
        None
      }
    }
  }

  /// Writes `bytes` for `key`. Best-effort: a failure is logged and counted
  /// but never surfaced, since a memory-tier write already satisfied `set`.
  pub async fn set(&self, key: &str, bytes: Vec<u8>, ttl: Duration) {
    if !self.config.enabled {
      return;
    }
    let Some(backend) = &self.backend else {
      return;
    };

    let namespaced = self.namespaced(key);
    match tokio::time::timeout(self.timeout(), backend.set(&namespaced, bytes, ttl)).await {
      Ok(Ok(())) => self.counters.record_set(),
      Ok(Err(err)) => tracing::warn!(error = %err, "remote cache set failed"),
      Err(_) => tracing::warn!("remote cache set timed out"),
    }
  }

  pub async fn delete(&self, key: &str) -> bool {
    if !self.config.enabled {
      return false;
    }
    let Some(backend) = &self.backend else {
      return false;
    };

    let namespaced = self.namespaced(key);
    match tokio::time::timeout(self.timeout(), backend.delete(&namespaced)).await {
      Ok(Ok(existed)) => {
        if existed {
          self.counters.record_delete();
        }
        existed
      }
      _ => false,
    }
  }

  /// Probes the backend and records the result for [`health_check`](super::SmartCache::health_check).
  pub async fn probe(&self) -> bool {
    if !self.config.enabled {
      return true;
    }
    let Some(backend) = &self.backend else {
      return false;
    };
    let ok = tokio::time::timeout(self.timeout(), backend.ping())
      .await
      .map(|r| r.is_ok())
      .unwrap_or(false);
    self.last_probe_ok.store(ok, std::sync::atomic::Ordering::Relaxed);
    ok
  }

  pub fn is_healthy(&self) -> bool {
    !self.config.enabled || self.last_probe_ok.load(std::sync::atomic::Ordering::Relaxed)
  }

  pub fn stats(&self) -> TierStats {
    self.counters.snapshot("remote", 0, 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct FlakyBackend {
    fail: std::sync::Arc<AtomicUsize>,
  }

  #[async_trait]
  impl RemoteBackend for FlakyBackend {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<(Vec<u8>, Option<Duration>)>> {
      if self.fail.load(Ordering::SeqCst) > 0 {
        anyhow::bail!("simulated outage");
      }
      Ok(None)
    }
    async fn set(&self, _key: &str, _bytes: Vec<u8>, _ttl: Duration) -> anyhow::Result<()> {
      if self.fail.load(Ordering::SeqCst) > 0 {
        anyhow::bail!("simulated outage");
      }
      Ok(())
    }
    async fn delete(&self, _key: &str) -> anyhow::Result<bool> {
      Ok(false)
    }
    async fn ping(&self) -> anyhow::Result<()> {
      if self.fail.load(Ordering::SeqCst) > 0 {
        anyhow::bail!("simulated outage");
      }
      Ok(())
    }
  }

  #[tokio::test]
  async fn backend_failure_degrades_to_a_miss_not_an_error() {
    let fail = std::sync::Arc::new(AtomicUsize::new(1));
    let tier = RemoteTier::new(
      RemoteCacheConfig {
        enabled: true,
        ..RemoteCacheConfig::default()
      },
      Some(Box::new(FlakyBackend { fail })),
    );

    assert_eq!(tier.get("k").await, None);
    tier.set("k", b"v".to_vec(), Duration::from_secs(1)).await;
  }

  #[tokio::test]
  async fn disabled_tier_is_always_a_miss_and_reports_healthy() {
    let tier = RemoteTier::new(RemoteCacheConfig::default(), None);
    assert_eq!(tier.get("k").await, None);
    assert!(tier.is_healthy());
  }
}
