//! The dependency-injection container: registration and resolution.
//!
//! There's no runtime reflection in Rust the way the scope manager's originating
//! design assumed (inspecting a factory's formal parameters), so `declared_deps`
//! is always explicit here — callers name their dependencies at `register` time
//! rather than relying on introspection.

use std::{
  any::Any,
  collections::HashMap,
  sync::Arc,
};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::di::{context::DIContext, error::DiError, scope::Scope};

/// A type-erased, thread-safe handle to a resolved service instance.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Dependencies resolved so far for the service currently being constructed,
/// keyed by declared dependency name.
pub type ResolvedDeps = HashMap<String, AnyArc>;

/// A service factory: given its resolved dependencies, produces a new instance.
pub type Factory = Arc<dyn Fn(&ResolvedDeps) -> anyhow::Result<AnyArc> + Send + Sync>;

/// Metadata recorded at `register` time for a single named service.
#[derive(Clone)]
pub struct ServiceRegistration {
  pub name: String,
  pub factory: Factory,
  pub scope: Scope,
  pub declared_deps: Vec<String>,
}

struct Inner {
  parent: Option<DiContainer>,
  registrations: DashMap<String, ServiceRegistration>,
  singletons: DashMap<String, AnyArc>,
  /// Coarse lock guarding singleton construction. A plain `DashMap::entry()`
  /// closure would hold that shard's lock while the factory runs; if the
  /// factory recursively resolves another singleton that happens to hash to
  /// the same shard, that's a self-deadlock. A single mutex around the whole
  /// create-and-cache step avoids it at the cost of serializing singleton
  /// construction across the container, which is the rare path (each
  /// singleton is only actually built once).
  singleton_lock: Mutex<()>,
}

/// A scoped dependency-injection container, optionally backed by a parent.
///
/// Cloning a `DiContainer` is cheap and shares state (it's an `Arc` handle),
/// matching the registrations/singletons/parent link it wraps.
#[derive(Clone)]
pub struct DiContainer {
  inner: Arc<Inner>,
}

impl Default for DiContainer {
  fn default() -> Self {
    Self::new()
  }
}

impl DiContainer {
  /// Creates a root container with no parent.
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Inner {
        parent: None,
        registrations: DashMap::new(),
        singletons: DashMap::new(),
        singleton_lock: Mutex::new(()),
      }),
    }
  }

  /// Creates a child container that shadows `parent` by name: resolution walks
  /// this container first, then falls back to `parent`.
  pub fn with_parent(parent: DiContainer) -> Self {
    Self {
      inner: Arc::new(Inner {
        parent: Some(parent),
        registrations: DashMap::new(),
        singletons: DashMap::new(),
        singleton_lock: Mutex::new(()),
      }),
    }
  }

  /// Registers a named service. Fails with [`DiError::AlreadyRegistered`] if
  /// `name` is already registered in *this* container (a child may still
  /// shadow a parent registration of the same name).
  pub fn register(
    &self,
    name: impl Into<String>,
    factory: Factory,
    scope: Scope,
    declared_deps: Vec<String>,
  ) -> Result<(), DiError> {
    let name = name.into();
    if self.inner.registrations.contains_key(&name) {
      return Err(DiError::AlreadyRegistered(name));
    }
    self.inner.registrations.insert(
      name.clone(),
      ServiceRegistration {
        name,
        factory,
        scope,
        declared_deps,
      },
    );
    Ok(())
  }

  /// Opens a new resolution context bound to this container.
  pub fn create_context(&self) -> DIContext {
    DIContext::new(self.clone())
  }

  /// Lists every registered service name, including ancestor containers.
  pub fn list_services(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .inner
      .registrations
      .iter()
      .map(|entry| entry.key().clone())
      .collect();
    if let Some(parent) = &self.inner.parent {
      names.extend(parent.list_services());
    }
    names.sort();
    names.dedup();
    names
  }

  /// Returns registration metadata for `name`, if registered in this container
  /// or an ancestor.
  pub fn get_service_info(&self, name: &str) -> Option<ServiceRegistration> {
    if let Some(reg) = self.inner.registrations.get(name) {
      return Some(reg.clone());
    }
    self.inner.parent.as_ref()?.get_service_info(name)
  }

  /// Resolves `name` and downcasts it to `T`. Fails with
  /// [`DiError::FactoryFailed`] if the registered factory's concrete type
  /// doesn't match `T`.
  pub fn resolve<T: Send + Sync + 'static>(
    &self,
    name: &str,
    context: &DIContext,
  ) -> Result<Arc<T>, DiError> {
    let any = self.resolve_any(name, context)?;
    any.downcast::<T>().map_err(|_| DiError::FactoryFailed {
      name: name.to_string(),
      source: anyhow::anyhow!("resolved instance is not of the requested type"),
    })
  }

  /// Resolves `name` to a type-erased instance, implementing the seven-step
  /// resolution algorithm: parent delegation, singleton cache, scope-frame
  /// cache, cycle detection, recursive dependency resolution, factory
  /// invocation, and resolution-stack cleanup.
  pub fn resolve_any(&self, name: &str, context: &DIContext) -> Result<AnyArc, DiError> {
    let registration = match self.inner.registrations.get(name) {
      Some(reg) => reg.clone(),
      None => {
        return match &self.inner.parent {
          Some(parent) => parent.resolve_any(name, context),
          None => Err(DiError::ServiceNotFound(name.to_string())),
        };
      }
    };

    if registration.scope == Scope::Singleton {
      if let Some(instance) = self.inner.singletons.get(name) {
        return Ok(instance.clone());
      }
    }

    if registration.scope.is_framed() {
      if let Some(instance) = context.get_framed(name, registration.scope) {
        return Ok(instance);
      }
    }

    context.enter_resolution(name)?;
    let result = self.build(&registration, context);
    context.exit_resolution(name);
    result
  }

  fn build(&self, registration: &ServiceRegistration, context: &DIContext) -> Result<AnyArc, DiError> {
    let mut deps = ResolvedDeps::new();
    for dep_name in &registration.declared_deps {
      let resolved = self.resolve_any(dep_name, context)?;
      deps.insert(dep_name.clone(), resolved);
    }

    if registration.scope == Scope::Singleton {
      let _guard = self.inner.singleton_lock.lock();
      if let Some(instance) = self.inner.singletons.get(&registration.name) {
        return Ok(instance.clone());
      }
      let instance = (registration.factory)(&deps).map_err(|source| DiError::FactoryFailed {
        name: registration.name.clone(),
        source,
      })?;
      self
        .inner
        .singletons
        .insert(registration.name.clone(), instance.clone());
      return Ok(instance);
    }

    let instance = (registration.factory)(&deps).map_err(|source| DiError::FactoryFailed {
      name: registration.name.clone(),
      source,
    })?;

    if registration.scope.is_framed() {
      context.put_framed(&registration.name, registration.scope, instance.clone());
    }

    Ok(instance)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn factory_for<T: Send + Sync + 'static>(value: T) -> Factory {
    let value = Arc::new(value);
    Arc::new(move |_deps| Ok(value.clone() as AnyArc))
  }

  #[test]
  fn singleton_is_built_once_and_shared() {
    let container = DiContainer::new();
    let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let c = counter.clone();
    container
      .register(
        "counter",
        Arc::new(move |_deps: &ResolvedDeps| {
          c.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
          Ok(Arc::new(42u32) as AnyArc)
        }),
        Scope::Singleton,
        vec![],
      )
      .unwrap();

    let context = container.create_context();
    let a = container.resolve::<u32>("counter", &context).unwrap();
    let b = container.resolve::<u32>("counter", &context).unwrap();
    assert_eq!(*a, 42);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
  }

  #[test]
  fn transient_is_built_on_every_resolution() {
    let container = DiContainer::new();
    let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let c = counter.clone();
    container
      .register(
        "id",
        Arc::new(move |_deps: &ResolvedDeps| {
          Ok(Arc::new(c.fetch_add(1, std::sync::atomic::Ordering::SeqCst)) as AnyArc)
        }),
        Scope::Transient,
        vec![],
      )
      .unwrap();

    let context = container.create_context();
    let a = container.resolve::<usize>("id", &context).unwrap();
    let b = container.resolve::<usize>("id", &context).unwrap();
    assert_ne!(*a, *b);
  }

  #[test]
  fn missing_service_fails_not_found() {
    let container = DiContainer::new();
    let context = container.create_context();
    let err = container.resolve_any("nope", &context).unwrap_err();
    assert!(matches!(err, DiError::ServiceNotFound(name) if name == "nope"));
  }

  #[test]
  fn duplicate_registration_fails() {
    let container = DiContainer::new();
    container
      .register("svc", factory_for(1u32), Scope::Singleton, vec![])
      .unwrap();
    let err = container
      .register("svc", factory_for(2u32), Scope::Singleton, vec![])
      .unwrap_err();
    assert!(matches!(err, DiError::AlreadyRegistered(name) if name == "svc"));
  }

  #[test]
  fn self_referential_dependency_is_a_cycle() {
    let container = DiContainer::new();
    container
      .register(
        "a",
        Arc::new(|_deps: &ResolvedDeps| Ok(Arc::new(1u32) as AnyArc)),
        Scope::Transient,
        vec!["a".to_string()],
      )
      .unwrap();

    let context = container.create_context();
    let err = container.resolve_any("a", &context).unwrap_err();
    match err {
      DiError::CircularDependency(path) => assert_eq!(path, vec!["a".to_string(), "a".to_string()]),
      other => panic!("expected CircularDependency, got {other:?}"),
    }
  }

  #[test]
  fn two_name_cycle_mentions_both_names() {
    let container = DiContainer::new();
    container
      .register(
        "a",
        Arc::new(|_deps: &ResolvedDeps| Ok(Arc::new(1u32) as AnyArc)),
        Scope::Transient,
        vec!["b".to_string()],
      )
      .unwrap();
    container
      .register(
        "b",
        Arc::new(|_deps: &ResolvedDeps| Ok(Arc::new(2u32) as AnyArc)),
        Scope::Transient,
        vec!["a".to_string()],
      )
      .unwrap();

    let context = container.create_context();
    let err = container.resolve_any("a", &context).unwrap_err();
    let message = err.to_string();
    assert!(message.contains('a'), "message should mention 'a': {message}");
    assert!(message.contains('b'), "message should mention 'b': {message}");
    match err {
      DiError::CircularDependency(path) => assert_eq!(path, vec!["a".to_string(), "b".to_string(), "a".to_string()]),
      other => panic!("expected CircularDependency, got {other:?}"),
    }
  }

  #[test]
  fn child_container_shadows_parent_by_name() {
    let parent = DiContainer::new();
    parent
      .register("greeting", factory_for("parent".to_string()), Scope::Singleton, vec![])
      .unwrap();

    let child = DiContainer::with_parent(parent.clone());
    child
      .register("greeting", factory_for("child".to_string()), Scope::Singleton, vec![])
      .unwrap();

    let context = child.create_context();
    let resolved = child.resolve::<String>("greeting", &context).unwrap();
    assert_eq!(*resolved, "child");
  }

  #[test]
  fn child_delegates_to_parent_for_unregistered_names() {
    let parent = DiContainer::new();
    parent
      .register("shared", factory_for(7u32), Scope::Singleton, vec![])
      .unwrap();
    let child = DiContainer::with_parent(parent);

    let context = child.create_context();
    let resolved = child.resolve::<u32>("shared", &context).unwrap();
    assert_eq!(*resolved, 7);
  }

  #[test]
  fn dependencies_are_resolved_and_bound_by_name() {
    let container = DiContainer::new();
    container
      .register("port", factory_for(8080u32), Scope::Singleton, vec![])
      .unwrap();
    container
      .register(
        "url",
        Arc::new(|deps: &ResolvedDeps| {
          let port = deps.get("port").unwrap().downcast_ref::<u32>().unwrap();
          Ok(Arc::new(format!("http://localhost:{port}")) as AnyArc)
        }),
        Scope::Transient,
        vec!["port".to_string()],
      )
      .unwrap();

    let context = container.create_context();
    let url = container.resolve::<String>("url", &context).unwrap();
    assert_eq!(*url, "http://localhost:8080");
  }
}
