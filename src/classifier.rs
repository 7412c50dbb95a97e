//! Handler-type classification and dispatch.
//!
//! The core supports two handler execution modes: **blocking** handlers run on
//! a bounded worker pool with their own timeout; **suspending** handlers run
//! inline in the calling task with their own (typically longer) timeout.
//!
//! Rust has no runtime equivalent of introspecting a function object the way
//! the reference implementation inspects a generator/coroutine at registration
//! time — the handler's kind is a property of its *type*, not something a
//! classifier can discover by calling it. [`HandlerKind`] is therefore supplied
//! explicitly by the caller at registration (the [`Blocking`] / [`Suspending`]
//! wrappers), and the classifier's job narrows to: cache that decision per
//! handler identity, and dispatch accordingly. Two registrations under the
//! same identity with conflicting kinds is the one case this module can still
//! catch at registration time, and is reported as [`ClassifierError::Invalid`].

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::types::Response;

/// The two supported execution modes (`invalid` surfaces as
/// [`ClassifierError::Invalid`] rather than a third enum variant, since a
/// handler that is neither wrapped in [`Blocking`] nor [`Suspending`] cannot
/// reach this module at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
  Blocking,
  Suspending,
}

/// Marks a handler for worker-pool dispatch.
pub struct Blocking<F>(pub F);

/// Marks a handler for inline dispatch.
pub struct Suspending<F>(pub F);

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
  #[error("handler {0} was registered as both blocking and suspending")]
  Invalid(String),
  #[error("handler timed out")]
  HandlerTimeout,
  #[error("handler task panicked")]
  HandlerCrashed,
}

/// Configuration for the classifier's dispatch, per the executor configuration
/// enumeration's `worker_pool_size` / `sync_timeout_seconds` / `async_timeout_seconds`.
#[derive(Clone, Debug)]
pub struct ClassifierConfig {
  pub worker_pool_size: usize,
  pub sync_timeout_seconds: u64,
  pub async_timeout_seconds: u64,
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      worker_pool_size: 32,
      sync_timeout_seconds: 30,
      async_timeout_seconds: 30,
    }
  }
}

/// Classifies handlers by identity and dispatches them through the correct path.
pub struct Classifier {
  config: ClassifierConfig,
  worker_permits: Arc<Semaphore>,
  classifications: DashMap<String, HandlerKind>,
}

impl Classifier {
  pub fn new(config: ClassifierConfig) -> Self {
    let worker_permits = Arc::new(Semaphore::new(config.worker_pool_size.max(1)));
    Self {
      config,
      worker_permits,
      classifications: DashMap::new(),
    }
  }

  /// Records `kind` for `identity`, the handler's registration-time identity
  /// (e.g. its route path plus method). Re-registering the same identity with
  /// a different kind is rejected rather than silently overwritten.
  pub fn classify(&self, identity: &str, kind: HandlerKind) -> Result<HandlerKind, ClassifierError> {
    match self.classifications.get(identity).map(|entry| *entry) {
      Some(existing) if existing != kind => Err(ClassifierError::Invalid(identity.to_string())),
      Some(existing) => Ok(existing),
      None => {
        self.classifications.insert(identity.to_string(), kind);
        Ok(kind)
      }
    }
  }

  pub fn kind_of(&self, identity: &str) -> Option<HandlerKind> {
    self.classifications.get(identity).map(|entry| *entry)
  }

  /// Dispatches a blocking handler on the worker pool, bounded by
  /// `worker_pool_size` concurrent handlers and `sync_timeout_seconds`.
  pub async fn dispatch_blocking<F, Fut>(&self, work: F) -> Result<Response, ClassifierError>
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Response> + Send + 'static,
  {
    let permits = self.worker_permits.clone();
    let timeout = Duration::from_secs(self.config.sync_timeout_seconds);

    let task = tokio::spawn(async move {
      let _permit = permits.acquire_owned().await.expect("semaphore is never closed");
      work().await
    });

    match tokio::time::timeout(timeout, task).await {
      Ok(Ok(response)) => Ok(response),
      Ok(Err(_)) => Err(ClassifierError::HandlerCrashed),
      Err(_) => Err(ClassifierError::HandlerTimeout),
    }
  }

  /// Dispatches a suspending handler inline, bounded by `async_timeout_seconds`.
  pub async fn dispatch_suspending<Fut>(&self, work: Fut) -> Result<Response, ClassifierError>
  where
    Fut: std::future::Future<Output = Response>,
  {
    let timeout = Duration::from_secs(self.config.async_timeout_seconds);
    tokio::time::timeout(timeout, work)
      .await
      .map_err(|_| ClassifierError::HandlerTimeout)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::body::CatzillaBody;

  fn config() -> ClassifierConfig {
    ClassifierConfig {
      worker_pool_size: 2,
      sync_timeout_seconds: 1,
      async_timeout_seconds: 1,
    }
  }

  #[test]
  fn reclassifying_the_same_kind_is_idempotent() {
    let classifier = Classifier::new(config());
    assert_eq!(
      classifier.classify("GET /a", HandlerKind::Blocking).unwrap(),
      HandlerKind::Blocking
    );
    assert_eq!(
      classifier.classify("GET /a", HandlerKind::Blocking).unwrap(),
      HandlerKind::Blocking
    );
  }

  #[test]
  fn reclassifying_with_a_different_kind_is_invalid() {
    let classifier = Classifier::new(config());
    classifier.classify("GET /a", HandlerKind::Blocking).unwrap();
    let err = classifier.classify("GET /a", HandlerKind::Suspending).unwrap_err();
    assert!(matches!(err, ClassifierError::Invalid(_)));
  }

  #[tokio::test]
  async fn blocking_dispatch_honors_its_timeout() {
    let classifier = Classifier::new(config());
    let err = classifier
      .dispatch_blocking(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Response::new(CatzillaBody::empty())
      })
      .await
      .unwrap_err();
    assert!(matches!(err, ClassifierError::HandlerTimeout));
  }

  #[tokio::test]
  async fn suspending_dispatch_runs_inline_and_returns_the_response() {
    let classifier = Classifier::new(config());
    let response = classifier
      .dispatch_suspending(async { Response::new(CatzillaBody::empty()) })
      .await
      .unwrap();
    assert_eq!(response.status(), 200);
  }
}
