//! Top-level configuration for every configurable subsystem, per the external
//! interfaces' configuration enumeration. Each subsystem also exposes its own
//! `Default`; `CatzillaConfig` just groups them for a single `from_env` call.

use serde::Deserialize;

use crate::{
  cache::{DiskCacheConfig, MemoryCacheConfig, RemoteCacheConfig},
  classifier::ClassifierConfig,
  response_cache,
};

/// DI configuration: the scope new registrations default to when none is
/// given, and whether this container has a parent (wired by the application,
/// not by configuration — `parent_container` here is a marker, not the
/// container itself).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DiConfig {
  pub default_scope: String,
  pub has_parent_container: bool,
}

impl Default for DiConfig {
  fn default() -> Self {
    Self {
      default_scope: "singleton".to_string(),
      has_parent_container: false,
    }
  }
}

/// Scope-manager configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
  pub thread_scope_enabled: bool,
}

impl Default for ScopeConfig {
  fn default() -> Self {
    Self {
      thread_scope_enabled: false,
    }
  }
}

/// Executor configuration driving the handler-type classifier's dispatch.
pub type ExecutorConfig = ClassifierConfig;

/// Groups every subsystem's configuration. The router has none (all
/// configuration is per-route at registration, per the external interfaces
/// section), so it is absent here.
#[derive(Clone, Debug, Default)]
pub struct CatzillaConfig {
  pub di: DiConfig,
  pub scope: ScopeConfig,
  pub memory_cache: MemoryCacheConfig,
  pub remote_cache: RemoteCacheConfig,
  pub disk_cache: DiskCacheConfig,
  pub response_cache: response_cache::Config,
  pub executor: ExecutorConfig,
}

/// The subset of configuration that maps cleanly onto flat environment
/// variables (`CATZILLA_*`). Cache tiers and the response-cache's `rules` are
/// structured enough that they're expected to be built programmatically
/// instead; this only covers the scalar knobs.
#[derive(Debug, Deserialize)]
struct EnvConfig {
  #[serde(default = "default_worker_pool_size")]
  worker_pool_size: usize,
  #[serde(default = "default_sync_timeout_seconds")]
  sync_timeout_seconds: u64,
  #[serde(default = "default_async_timeout_seconds")]
  async_timeout_seconds: u64,
  #[serde(default)]
  thread_scope_enabled: bool,
}

fn default_worker_pool_size() -> usize {
  32
}
fn default_sync_timeout_seconds() -> u64 {
  30
}
fn default_async_timeout_seconds() -> u64 {
  30
}

impl CatzillaConfig {
  /// Reads `CATZILLA_*` environment variables over a default configuration.
  /// Mirrors the `envy::prefixed(...).from_env()` pattern used elsewhere in
  /// this dependency stack for flat env-var configuration.
  pub fn from_env() -> Result<Self, envy::Error> {
    let env: EnvConfig = envy::prefixed("CATZILLA_").from_env()?;
    let mut config = Self::default();
    config.executor.worker_pool_size = env.worker_pool_size;
    config.executor.sync_timeout_seconds = env.sync_timeout_seconds;
    config.executor.async_timeout_seconds = env.async_timeout_seconds;
    config.scope.thread_scope_enabled = env.thread_scope_enabled;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_matches_the_documented_defaults() {
    let config = CatzillaConfig::default();
    assert_eq!(config.di.default_scope, "singleton");
    assert!(!config.scope.thread_scope_enabled);
    assert_eq!(config.executor.worker_pool_size, 32);
  }
}
