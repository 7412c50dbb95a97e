//! Per-request dependency resolution context.

use std::{
  collections::HashMap,
  sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

use crate::di::{
  container::{AnyArc, DiContainer},
  error::DiError,
  scope::{self, Scope},
};

type CleanupCallback = Box<dyn FnOnce() + Send>;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A dependency resolution context: opened at request entry, closed at request
/// exit. Caches request-scoped instances, tracks the in-flight resolution stack
/// for cycle detection, and optionally binds to a session and/or execution-context
/// (thread) scope id supplied by the caller so session/thread-scoped services
/// outlive this context.
pub struct DIContext {
  pub(crate) container: DiContainer,
  id: String,
  session_id: Option<String>,
  thread_id: Option<String>,
  request_instances: Mutex<HashMap<String, AnyArc>>,
  resolution_stack: Mutex<Vec<String>>,
  cleanup_callbacks: Mutex<Vec<CleanupCallback>>,
  active: std::sync::atomic::AtomicBool,
}

impl DIContext {
  pub(crate) fn new(container: DiContainer) -> Self {
    let id = format!("ctx-{}", NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
    scope::acquire(id.clone(), Scope::Request);
    Self {
      container,
      id,
      session_id: None,
      thread_id: None,
      request_instances: Mutex::new(HashMap::new()),
      resolution_stack: Mutex::new(Vec::new()),
      cleanup_callbacks: Mutex::new(Vec::new()),
      active: std::sync::atomic::AtomicBool::new(true),
    }
  }

  /// Binds this context to an opaque session id, so `Scope::Session` services
  /// resolved through it are cached in that session's scope frame rather than
  /// this request's own.
  pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
    self.session_id = Some(session_id.into());
    self
  }

  /// Binds this context to an opaque execution-context (thread) id.
  pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
    self.thread_id = Some(thread_id.into());
    self
  }

  /// Resolves `name` as `T` against this context's container.
  pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<std::sync::Arc<T>, DiError> {
    self.container.resolve(name, self)
  }

  pub(crate) fn enter_resolution(&self, name: &str) -> Result<(), DiError> {
    let mut stack = self.resolution_stack.lock();
    if let Some(start) = stack.iter().position(|n| n == name) {
      let mut path: Vec<String> = stack[start..].to_vec();
      path.push(name.to_string());
      return Err(DiError::CircularDependency(path));
    }
    stack.push(name.to_string());
    Ok(())
  }

  pub(crate) fn exit_resolution(&self, name: &str) {
    let mut stack = self.resolution_stack.lock();
    if let Some(pos) = stack.iter().rposition(|n| n == name) {
      stack.remove(pos);
    }
  }

  /// Registers a cleanup callback for this context. Request-scoped callbacks
  /// run in LIFO order on [`DIContext::cleanup`]; session/thread-scoped
  /// instances register their own callbacks against the owning scope frame
  /// instead (see [`DIContext::put_framed`]).
  pub fn on_cleanup<F: FnOnce() + Send + 'static>(&self, callback: F) {
    self.cleanup_callbacks.lock().push(Box::new(callback));
  }

  pub(crate) fn get_framed(&self, name: &str, kind: Scope) -> Option<AnyArc> {
    match kind {
      Scope::Request => self.request_instances.lock().get(name).cloned(),
      Scope::Session => {
        let id = self.session_id.as_deref()?;
        scope::lookup(id)?.instances.lock().get(name).cloned()
      }
      Scope::Thread => {
        let id = self.thread_id.as_deref()?;
        scope::lookup(id)?.instances.lock().get(name).cloned()
      }
      Scope::Singleton | Scope::Transient => None,
    }
  }

  pub(crate) fn put_framed(&self, name: &str, kind: Scope, instance: AnyArc) {
    match kind {
      Scope::Request => {
        self
          .request_instances
          .lock()
          .insert(name.to_string(), instance);
      }
      Scope::Session => {
        if let Some(id) = &self.session_id {
          let frame = scope::acquire(id.clone(), Scope::Session);
          frame.instances.lock().insert(name.to_string(), instance);
        }
      }
      Scope::Thread => {
        if let Some(id) = &self.thread_id {
          let frame = scope::acquire(id.clone(), Scope::Thread);
          frame.instances.lock().insert(name.to_string(), instance);
        }
      }
      Scope::Singleton | Scope::Transient => {}
    }
  }

  /// Tears down this context: runs request-scoped cleanup callbacks in LIFO
  /// order and releases its request-scope frame. Idempotent and safe to call
  /// on every exit path (normal return, error, or cancellation), matching the
  /// scope manager's guaranteed-release contract.
  pub fn cleanup(&self) {
    if !self.active.swap(false, Ordering::SeqCst) {
      return;
    }
    let mut callbacks = self.cleanup_callbacks.lock();
    while let Some(cb) = callbacks.pop() {
      cb();
    }
    scope::release(&self.id);
  }
}

impl Drop for DIContext {
  fn drop(&mut self) {
    self.cleanup();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::di::container::DiContainer;

  #[test]
  fn cleanup_runs_once_even_if_called_explicitly_then_dropped() {
    let container = DiContainer::new();
    let context = container.create_context();
    let ran = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let r = ran.clone();
    context.on_cleanup(move || {
      r.fetch_add(1, Ordering::SeqCst);
    });
    context.cleanup();
    drop(context);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
  }
}
