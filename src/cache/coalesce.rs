//! Concurrent-build coalescing: at most one in-flight build per key.
//!
//! While one caller is computing a value for key `K`, concurrent callers for `K`
//! wait for that result rather than each recomputing it — the default
//! "wait-for-leader" policy. Used both by decorated user-function caches and by
//! the response-cache middleware, keyed by request fingerprint.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::cache::value::CacheValue;

type BuildResult = Result<CacheValue, String>;

/// Tracks in-flight builds by key. Each key's [`OnceCell`] is discarded once its
/// build completes, so a later cache miss for the same key starts a fresh build
/// rather than replaying a stale result.
#[derive(Default)]
pub struct BuildCoalescer {
  in_flight: DashMap<String, Arc<OnceCell<BuildResult>>>,
}

impl BuildCoalescer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Runs `build` for `key` if no build is currently in flight, otherwise waits
  /// for the in-flight build's result. The factory is guaranteed to run exactly
  /// once per coalescing window regardless of how many concurrent callers ask
  /// for `key`.
  pub async fn coalesce<F, Fut>(&self, key: &str, build: F) -> BuildResult
  where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = BuildResult>,
  {
    let cell = self
      .in_flight
      .entry(key.to_string())
      .or_insert_with(|| Arc::new(OnceCell::new()))
      .clone();

    let result = cell.get_or_init(build).await.clone();

    self.in_flight.remove_if(key, |_, existing| Arc::ptr_eq(existing, &cell));

    result
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[tokio::test]
  async fn concurrent_callers_share_a_single_build() {
    let coalescer = Arc::new(BuildCoalescer::new());
    let build_count = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
      let coalescer = coalescer.clone();
      let build_count = build_count.clone();
      handles.push(tokio::spawn(async move {
        coalescer
          .coalesce("k", || async move {
            build_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(CacheValue::Integer(42))
          })
          .await
      }));
    }

    for handle in handles {
      assert_eq!(handle.await.unwrap(), Ok(CacheValue::Integer(42)));
    }
    assert_eq!(build_count.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn a_later_call_after_completion_rebuilds() {
    let coalescer = BuildCoalescer::new();
    let build_count = Arc::new(AtomicUsize::new(0));

    let c = build_count.clone();
    coalescer
      .coalesce("k", || async move {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(CacheValue::Integer(1))
      })
      .await
      .unwrap();

    let c = build_count.clone();
    coalescer
      .coalesce("k", || async move {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(CacheValue::Integer(2))
      })
      .await
      .unwrap();

    assert_eq!(build_count.load(Ordering::SeqCst), 2);
  }
}
