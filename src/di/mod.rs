//! Scoped dependency-injection container.
//!
//! Services are registered by name against a [`container::DiContainer`] with an
//! explicit lifetime ([`scope::Scope`]) and an explicit list of dependency names.
//! A [`context::DIContext`] is opened per request (or other unit of work) and
//! threads through resolution so that request/session/thread-scoped instances
//! are cached at the right granularity and resolution cycles are caught before
//! they overflow the stack.
//!
//! # Examples
//!
//! ```rust
//! use catzilla::di::{container::DiContainer, scope::Scope};
//! use std::sync::Arc;
//!
//! let container = DiContainer::new();
//! container
//!     .register(
//!         "greeting",
//!         Arc::new(|_deps| Ok(Arc::new("hello".to_string()) as _)),
//!         Scope::Singleton,
//!         vec![],
//!     )
//!     .unwrap();
//!
//! let context = container.create_context();
//! let greeting = context.resolve::<String>("greeting").unwrap();
//! assert_eq!(*greeting, "hello");
//! ```

/// The dependency-injection container: registration and resolution.
pub mod container;

/// Per-request dependency resolution context.
pub mod context;

/// Error taxonomy for registration and resolution failures.
pub mod error;

/// Service scopes and the process-wide scope-frame registry.
pub mod scope;

/// Per-request `DIContext` installation as ordinary server middleware.
pub mod middleware;

pub use container::DiContainer;
pub use context::DIContext;
pub use error::DiError;
pub use middleware::DiContextPlugin;
pub use scope::Scope;
