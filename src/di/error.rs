//! Error taxonomy for dependency registration and resolution failures.

use http::StatusCode;

use crate::responder::Responder;

/// Failure modes surfaced by [`super::container::DiContainer`].
///
/// Each variant maps to the failure semantics spelled out for the dependency
/// injection component: a duplicate name is a registration-time mistake, a
/// missing name or resolution cycle is caller error discovered at resolve
/// time, and a factory error is forwarded from application code.
#[derive(Debug)]
pub enum DiError {
  /// A service with this name is already registered in the container.
  AlreadyRegistered(String),
  /// No registration exists for this name in the container or any ancestor.
  ServiceNotFound(String),
  /// Resolving this name would re-enter its own resolution, directly or
  /// transitively, through `declared_deps`. Carries the full cycle path in
  /// resolution order, e.g. `["a", "b", "a"]` for `a` depending on `b`
  /// depending back on `a`.
  CircularDependency(Vec<String>),
  /// The registered factory returned an error while building an instance.
  FactoryFailed { name: String, source: anyhow::Error },
}

impl std::fmt::Display for DiError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DiError::AlreadyRegistered(name) => write!(f, "service '{name}' is already registered"),
      DiError::ServiceNotFound(name) => write!(f, "service '{name}' is not registered"),
      DiError::CircularDependency(path) => {
        write!(f, "circular dependency detected while resolving: {}", path.join(" -> "))
      }
      DiError::FactoryFailed { name, source } => {
        write!(f, "factory for service '{name}' failed: {source}")
      }
    }
  }
}

impl std::error::Error for DiError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      DiError::FactoryFailed { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl Responder for DiError {
  /// Registration/lookup mistakes are server-side configuration errors (500);
  /// factory failures forward whatever the application's own error implies,
  /// which we conservatively also treat as 500 since DI resolution normally
  /// happens before a handler has a chance to classify the failure itself.
  fn into_response(self) -> crate::types::Response {
    let message = self.to_string();
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
  }
}
