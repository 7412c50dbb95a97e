//! The optional disk tier: a simple key-to-file mapping with atomic writes.

use std::{
  path::{Path, PathBuf},
  time::{Duration, SystemTime, UNIX_EPOCH},
};

use sha1::{Digest, Sha1};

use crate::cache::stats::{TierCounters, TierStats};

/// Configuration for the disk tier, per the configuration enumeration's
/// `enabled` / `directory` / `default_ttl_seconds` / `max_bytes` fields.
#[derive(Clone, Debug)]
pub struct DiskCacheConfig {
  pub enabled: bool,
  pub directory: PathBuf,
  pub default_ttl_seconds: u64,
  pub max_bytes: u64,
}

impl Default for DiskCacheConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      directory: PathBuf::from(".catzilla-cache"),
      default_ttl_seconds: 86_400,
      max_bytes: 512 * 1024 * 1024,
    }
  }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct EntryMeta {
  stored_at: u64,
  ttl_seconds: u64,
  size_bytes: u64,
  digest: String,
}

impl EntryMeta {
  fn is_expired(&self, now: u64) -> bool {
    now.saturating_sub(self.stored_at) > self.ttl_seconds
  }
}

pub struct DiskTier {
  config: DiskCacheConfig,
  counters: TierCounters,
}

fn filename_for(key: &str) -> String {
  let mut hasher = Sha1::new();
  hasher.update(key.as_bytes());
  let digest = hasher.finalize();
  digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_secs() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0)
}

impl DiskTier {
  pub fn new(config: DiskCacheConfig) -> Self {
    Self {
      config,
      counters: TierCounters::default(),
    }
  }

  fn paths_for(&self, key: &str) -> (PathBuf, PathBuf) {
    let name = filename_for(key);
    (
      self.config.directory.join(format!("{name}.bin")),
      self.config.directory.join(format!("{name}.meta")),
    )
  }

  /// Returns the cached bytes alongside the entry's remaining TTL, so callers
  /// promoting a disk hit into a higher tier can cap the promoted TTL at
  /// `min(remaining, tier_default)` rather than resetting it to the tier
  /// default.
  pub async fn get(&self, key: &str) -> Option<(Vec<u8>, Duration)> {
    if !self.config.enabled {
      return None;
    }
    let (data_path, meta_path) = self.paths_for(key);

    let meta_bytes = tokio::fs::read(&meta_path).await.ok()?;
    let meta: EntryMeta = serde_json::from_slice(&meta_bytes).ok()?;

    let now = now_secs();
    if meta.is_expired(now) {
      let _ = tokio::fs::remove_file(&data_path).await;
      let _ = tokio::fs::remove_file(&meta_path).await;
      self.counters.record_miss();
      return None;
    }
    let remaining = Duration::from_secs(meta.ttl_seconds.saturating_sub(now.saturating_sub(meta.stored_at)));

    match tokio::fs::read(&data_path).await {
      Ok(bytes) => {
        self.counters.record_hit();
        Some((bytes, remaining))
      }
      Err(_) => {
        self.counters.record_miss();
        None
      }
    }
  }

  /// Writes `bytes` for `key` via write-temp-then-rename so a reader never
  /// observes a partially written file.
  pub async fn set(&self, key: &str, bytes: &[u8], ttl: Duration) -> anyhow::Result<()> {
    if !self.config.enabled {
      return Ok(());
    }
    tokio::fs::create_dir_all(&self.config.directory).await?;

    let (data_path, meta_path) = self.paths_for(key);
    let meta = EntryMeta {
      stored_at: now_secs(),
      ttl_seconds: ttl.as_secs(),
      size_bytes: bytes.len() as u64,
      digest: filename_for(key),
    };

    write_atomic(&data_path, bytes).await?;
    write_atomic(&meta_path, &serde_json::to_vec(&meta)?).await?;

    self.counters.record_set();
    Ok(())
  }

  pub async fn delete(&self, key: &str) -> bool {
    if !self.config.enabled {
      return false;
    }
    let (data_path, meta_path) = self.paths_for(key);
    let existed = tokio::fs::remove_file(&data_path).await.is_ok();
    let _ = tokio::fs::remove_file(&meta_path).await;
    if existed {
      self.counters.record_delete();
    }
    existed
  }

  /// Probes that the cache directory is writable.
  pub async fn probe(&self) -> bool {
    if !self.config.enabled {
      return true;
    }
    tokio::fs::create_dir_all(&self.config.directory).await.is_ok()
  }

  pub fn stats(&self) -> TierStats {
    self.counters.snapshot("disk", 0, 0)
  }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
  let tmp_path = PathBuf::from(format!("{}.tmp", path.display()));
  tokio::fs::write(&tmp_path, bytes).await?;
  tokio::fs::rename(&tmp_path, path).await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tier() -> (DiskTier, tempfile_dir::TempDir) {
    let dir = tempfile_dir::TempDir::new();
    let tier = DiskTier::new(DiskCacheConfig {
      enabled: true,
      directory: dir.path().to_path_buf(),
      default_ttl_seconds: 60,
      max_bytes: 1024 * 1024,
    });
    (tier, dir)
  }

  #[tokio::test]
  async fn round_trips_bytes() {
    let (tier, _dir) = tier();
    tier.set("k", b"hello", Duration::from_secs(60)).await.unwrap();
    let (bytes, remaining) = tier.get("k").await.unwrap();
    assert_eq!(bytes, b"hello".to_vec());
    assert!(remaining <= Duration::from_secs(60) && remaining > Duration::from_secs(0));
  }

  #[tokio::test]
  async fn expired_entry_is_a_miss_and_removed() {
    let (tier, _dir) = tier();
    tier.set("k", b"hello", Duration::from_secs(0)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(tier.get("k").await.is_none());
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let (tier, _dir) = tier();
    tier.set("k", b"hello", Duration::from_secs(60)).await.unwrap();
    assert!(tier.delete("k").await);
    assert!(!tier.delete("k").await);
  }

  /// A tiny self-contained temp-dir helper so disk-tier tests don't need an
  /// extra dev-dependency: creates a unique directory under `std::env::temp_dir()`
  /// and removes it on drop.
  mod tempfile_dir {
    use std::path::{Path, PathBuf};

    pub struct TempDir(PathBuf);

    impl TempDir {
      pub fn new() -> Self {
        let id = std::time::SystemTime::now()
          .duration_since(std::time::UNIX_EPOCH)
          .unwrap()
          .as_nanos();
        let path = std::env::temp_dir().join(format!("catzilla-disk-cache-test-{id}"));
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
