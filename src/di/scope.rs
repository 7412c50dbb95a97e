//! Process-wide registry of live scope frames.
//!
//! Mirrors the role `state::GLOBAL_STATE` plays for type-keyed application state, but
//! keyed by an opaque scope id and carrying its own instance map and LIFO cleanup
//! callbacks rather than a single value per type.

use std::{any::Any, sync::Arc};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// The five lifetimes a registered service may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
  /// One instance per container, cached for the container's lifetime.
  Singleton,
  /// A fresh instance on every resolution.
  Transient,
  /// One instance per request-scope frame.
  Request,
  /// One instance per session-scope id (an opaque, caller-supplied string).
  Session,
  /// One instance per execution-context id.
  Thread,
}

impl Scope {
  /// Whether instances of this scope are cached at all within a scope frame.
  ///
  /// Transient services are never cached; every other scope caches by name within
  /// its frame (singleton caching happens in the container itself, not a frame).
  pub(crate) fn is_framed(self) -> bool {
    !matches!(self, Scope::Singleton | Scope::Transient)
  }
}

type CleanupCallback = Box<dyn FnOnce() + Send>;

/// A live scope frame: the per-scope instance cache and its LIFO cleanup stack.
pub struct ScopeFrame {
  pub(crate) id: String,
  pub(crate) kind: Scope,
  pub(crate) instances: Mutex<std::collections::HashMap<String, Arc<dyn Any + Send + Sync>>>,
  cleanup_callbacks: Mutex<Vec<CleanupCallback>>,
  pub(crate) is_active: std::sync::atomic::AtomicBool,
}

impl ScopeFrame {
  fn new(id: String, kind: Scope) -> Self {
    Self {
      id,
      kind,
      instances: Mutex::new(std::collections::HashMap::new()),
      cleanup_callbacks: Mutex::new(Vec::new()),
      is_active: std::sync::atomic::AtomicBool::new(true),
    }
  }

  /// Registers a cleanup callback, run in LIFO order when the frame closes.
  pub(crate) fn on_cleanup(&self, callback: CleanupCallback) {
    self.cleanup_callbacks.lock().push(callback);
  }

  /// Runs every registered cleanup callback in reverse registration order and
  /// marks the frame inactive. Idempotent: a second call is a no-op.
  fn close(&self) {
    if !self.is_active.swap(false, std::sync::atomic::Ordering::SeqCst) {
      return;
    }
    let mut callbacks = self.cleanup_callbacks.lock();
    while let Some(cb) = callbacks.pop() {
      cb();
    }
  }
}

/// Process-wide map of scope id to live frame, mirroring the pattern used by
/// [`crate::state::GLOBAL_STATE`] for global application state.
static SCOPE_FRAMES: Lazy<DashMap<String, Arc<ScopeFrame>>> = Lazy::new(DashMap::new);

/// Opens (or returns the existing) scope frame for `id`, creating it with `kind`
/// the first time it's requested.
pub(crate) fn acquire(id: impl Into<String>, kind: Scope) -> Arc<ScopeFrame> {
  let id = id.into();
  SCOPE_FRAMES
    .entry(id.clone())
    .or_insert_with(|| Arc::new(ScopeFrame::new(id, kind)))
    .clone()
}

/// Looks up a live frame without creating one.
pub(crate) fn lookup(id: &str) -> Option<Arc<ScopeFrame>> {
  SCOPE_FRAMES.get(id).map(|entry| entry.clone())
}

/// Closes and removes the frame for `id`, running its cleanup callbacks in LIFO
/// order. A missing frame is a no-op — closing twice must be safe since request
/// teardown can run on both the success and cancellation paths.
pub fn release(id: &str) {
  if let Some((_, frame)) = SCOPE_FRAMES.remove(id) {
    frame.close();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cleanup_callbacks_run_in_lifo_order() {
    let frame = acquire("scope-test-lifo", Scope::Request);
    let order = Arc::new(Mutex::new(Vec::new()));

    let o1 = order.clone();
    frame.on_cleanup(Box::new(move || o1.lock().push(1)));
    let o2 = order.clone();
    frame.on_cleanup(Box::new(move || o2.lock().push(2)));

    release("scope-test-lifo");
    assert_eq!(*order.lock(), vec![2, 1]);
  }

  #[test]
  fn release_is_idempotent() {
    acquire("scope-test-idempotent", Scope::Session);
    release("scope-test-idempotent");
    release("scope-test-idempotent");
  }
}
