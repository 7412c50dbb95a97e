//! Process-wide default DI container and smart cache.
//!
//! Mirrors [`crate::state::GLOBAL_STATE`]'s lazily-constructed, process-wide
//! storage, but for the two pieces of state an application typically wants
//! exactly one of by default: a [`DiContainer`] and a [`SmartCache`]. Both are
//! explicit, constructed on first access behind a `Lazy`, and replaceable via
//! `init_*` so an application can install its own configured instance before
//! anything resolves against the default. [`reset_for_tests`] discards both,
//! so process-wide state from one test doesn't leak into the next.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{
  cache::{SmartCache, SmartCacheConfig},
  di::DiContainer,
};

static DEFAULT_CONTAINER: Lazy<RwLock<DiContainer>> = Lazy::new(|| RwLock::new(DiContainer::new()));

static DEFAULT_CACHE: Lazy<RwLock<Arc<SmartCache>>> =
  Lazy::new(|| RwLock::new(Arc::new(SmartCache::new(SmartCacheConfig::default(), None))));

/// Returns the process-wide default DI container, constructing an empty one
/// on first access. `DiContainer` is a cheap `Arc` handle, so registering
/// against this returned value is visible to every other caller of
/// `default_container()`.
pub fn default_container() -> DiContainer {
  DEFAULT_CONTAINER.read().clone()
}

/// Replaces the process-wide default DI container with `container`.
pub fn init_default_container(container: DiContainer) {
  *DEFAULT_CONTAINER.write() = container;
}

/// Returns the process-wide default smart cache, constructing one with
/// `SmartCacheConfig::default()` (memory tier only) on first access.
pub fn default_cache() -> Arc<SmartCache> {
  DEFAULT_CACHE.read().clone()
}

/// Replaces the process-wide default smart cache with `cache`.
pub fn init_default_cache(cache: SmartCache) {
  *DEFAULT_CACHE.write() = Arc::new(cache);
}

/// Discards the current default container and cache, replacing both with
/// fresh, empty instances. Intended for test setup/teardown: without this,
/// a registration or cached value from one test is still visible to the
/// next, since both defaults are process-wide statics.
pub fn reset_for_tests() {
  init_default_container(DiContainer::new());
  init_default_cache(SmartCache::new(SmartCacheConfig::default(), None));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::di::Scope;

  #[test]
  fn reset_for_tests_clears_registrations() {
    reset_for_tests();
    default_container()
      .register(
        "svc",
        Arc::new(|_deps| Ok(Arc::new(1u32) as _)),
        Scope::Singleton,
        vec![],
      )
      .unwrap();
    assert!(default_container().get_service_info("svc").is_some());

    reset_for_tests();
    assert!(default_container().get_service_info("svc").is_none());
  }

  #[tokio::test]
  async fn reset_for_tests_clears_cached_values() {
    reset_for_tests();
    default_cache()
      .set("k", crate::cache::CacheValue::Integer(1), None)
      .await
      .unwrap();
    assert!(default_cache().get("k").await.1);

    reset_for_tests();
    assert!(!default_cache().get("k").await.1);
  }

  #[test]
  fn init_default_container_replaces_the_shared_instance() {
    let fresh = DiContainer::new();
    fresh
      .register(
        "only_on_fresh",
        Arc::new(|_deps| Ok(Arc::new(2u32) as _)),
        Scope::Singleton,
        vec![],
      )
      .unwrap();
    init_default_container(fresh);
    assert!(default_container().get_service_info("only_on_fresh").is_some());
    reset_for_tests();
  }
}
