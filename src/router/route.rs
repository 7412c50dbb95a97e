//! HTTP route definition: path template, handler, and per-route middleware.
//!
//! A `Route` is immutable once registered (per the data model's lifecycle rule): its
//! path, method and handler never change after construction, and parameter names are
//! derived once from the path template rather than recomputed on every match.
//!
//! # Examples
//!
//! ```rust
//! use catzilla::router::route::Route;
//! use catzilla::handler::BoxHandler;
//! use catzilla::types::Request;
//! use http::Method;
//!
//! async fn handler(_req: Request) -> &'static str {
//!     "Hello, World!"
//! }
//!
//! let route = Route::new(
//!     "/users/{id}".to_string(),
//!     Method::GET,
//!     BoxHandler::new(handler),
//!     None,
//! );
//! assert_eq!(route.param_names, vec!["id".to_string()]);
//! ```

use std::{
  collections::{HashMap, VecDeque},
  sync::{Arc, RwLock},
};

use http::Method;

use crate::{
  handler::BoxHandler,
  middleware::Next,
  responder::Responder,
  types::{BoxMiddleware, Request},
};

/// HTTP route: a registered `(method, path_template)` pair bound to a handler.
pub struct Route {
  /// Original path template used to create this route (e.g. `/users/{id}`).
  pub path: String,
  /// HTTP method this route responds to.
  pub method: Method,
  /// Handler function to execute when the route is matched.
  pub handler: BoxHandler,
  /// Route-specific middleware chain, appended after group/router middleware.
  pub middlewares: RwLock<VecDeque<BoxMiddleware>>,
  /// Whether trailing slash redirection is enabled.
  pub tsr: bool,
  /// Ordered list of `{name}` placeholders appearing in `path`.
  pub param_names: Vec<String>,
  /// Free-form tags, e.g. for documentation grouping.
  pub tags: Vec<String>,
  /// Human-readable route description.
  pub description: Option<String>,
  /// Arbitrary string metadata, including the group-inclusion provenance fields
  /// `original_group_prefix` / `included_in_group` (see `router::group`).
  pub metadata: HashMap<String, String>,
}

/// Extracts the ordered list of `{name}` placeholders from a path template.
pub(crate) fn param_names_of(path: &str) -> Vec<String> {
  path
    .split('/')
    .filter_map(|seg| {
      if seg.len() > 2 && seg.starts_with('{') && seg.ends_with('}') {
        Some(seg[1..seg.len() - 1].to_string())
      } else {
        None
      }
    })
    .collect()
}

impl Route {
  /// Creates a new route with the specified path, method, and handler.
  pub fn new(path: String, method: Method, handler: BoxHandler, tsr: Option<bool>) -> Self {
    let param_names = param_names_of(&path);
    Self {
      path,
      method,
      handler,
      middlewares: RwLock::new(VecDeque::new()),
      tsr: tsr.unwrap_or(false),
      param_names,
      tags: Vec::new(),
      description: None,
      metadata: HashMap::new(),
    }
  }

  /// Attaches tags to this route, returning it for chained construction.
  pub fn with_tags(mut self, tags: Vec<String>) -> Self {
    self.tags = tags;
    self
  }

  /// Attaches a description to this route, returning it for chained construction.
  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Attaches metadata to this route, returning it for chained construction.
  pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
    self.metadata = metadata;
    self
  }

  /// Adds middleware to this route's execution chain.
  pub fn middleware<F, Fut, R>(&self, f: F) -> &Self
  where
    F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
    Fut: std::future::Future<Output = R> + Send + 'static,
    R: Responder + Send + 'static,
  {
    let mw: BoxMiddleware = Arc::new(move |req, next| {
      let fut = f(req, next);
      Box::pin(async move { fut.await.into_response() })
    });

    self.middlewares.write().unwrap().push_back(mw);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn param_names_extracts_ordered_placeholders() {
    assert_eq!(
      param_names_of("/api/v1/{user_id}/posts/{post_id}"),
      vec!["user_id".to_string(), "post_id".to_string()]
    );
    assert!(param_names_of("/health").is_empty());
  }
}
