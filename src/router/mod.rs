//! HTTP request routing and dispatch functionality.
//!
//! The router matches incoming requests against a radix trie of registered routes
//! (see [`trie`]), supports prefix-scoped route groups with nested inclusion (see
//! [`group`]), and executes matched handlers through a global + group + per-route
//! middleware chain. Matching yields one of three outcomes — matched,
//! method-not-allowed (carrying the full allowed-method set), or not-found — never a
//! fourth case and never a panic from a missing path.
//!
//! # Examples
//!
//! ```rust
//! use catzilla::{router::Router, Method, responder::Responder, types::Request};
//!
//! async fn hello(_req: Request) -> impl Responder {
//!     "Hello, World!"
//! }
//!
//! async fn user_handler(_req: Request) -> impl Responder {
//!     "User profile"
//! }
//!
//! let mut router = Router::new();
//! router.route(Method::GET, "/", hello);
//! router.route(Method::GET, "/users/{id}", user_handler);
//!
//! router.middleware(|req, next| async move {
//!     println!("Processing request to: {}", req.uri());
//!     next.run(req).await
//! });
//! ```

pub mod group;
pub mod route;
mod trie;

use std::{
  fmt,
  sync::{Arc, RwLock},
};

use dashmap::DashMap;
use http::StatusCode;
use hyper::Method;

use crate::{
  body::CatzillaBody,
  extractors::params::PathParams,
  handler::{BoxHandler, Handler},
  middleware::Next,
  responder::Responder,
  state::set_state,
  types::{BoxMiddleware, Request, Response},
};

pub use group::RouterGroup;
pub use route::Route;
use trie::{MatchOutcome, RouteNode, split_segments};

#[cfg(feature = "plugins")]
use crate::plugins::CatzillaPlugin;

#[cfg(feature = "plugins")]
use std::sync::atomic::AtomicBool;

/// The closed set of HTTP verbs `add_route` accepts, per §4.1's method normalization
/// rule. Anything else fails with [`RouterError::InvalidMethod`].
const ALLOWED_METHODS: [Method; 7] = [
  Method::GET,
  Method::POST,
  Method::PUT,
  Method::PATCH,
  Method::DELETE,
  Method::OPTIONS,
  Method::HEAD,
];

/// Failure modes for route registration and group inclusion (§4.1.3).
#[derive(Debug)]
pub enum RouterError {
  /// `add_route` was called with a verb outside the closed set.
  InvalidMethod(String),
}

impl fmt::Display for RouterError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RouterError::InvalidMethod(m) => write!(f, "invalid HTTP method: {m}"),
    }
  }
}

impl std::error::Error for RouterError {}

fn validate_method(method: &Method) -> Result<(), RouterError> {
  if ALLOWED_METHODS.contains(method) {
    Ok(())
  } else {
    Err(RouterError::InvalidMethod(method.to_string()))
  }
}

/// HTTP router for managing routes, route groups, middleware, and request dispatch.
///
/// Internally, routes live in two places: a `DashMap` registry (used for iteration —
/// `merge`, conflict checks) and a radix trie (used for dispatch). Both are kept in
/// sync by [`Router::insert_route`].
pub struct Router {
  /// Registry of all routes, keyed by `(method, path)`, for iteration and conflict
  /// detection.
  routes: DashMap<(Method, String), Arc<Route>>,
  /// Radix trie used for request matching.
  trie: RwLock<RouteNode>,
  /// Global middleware chain applied to all routes, before any group/route
  /// middleware.
  middlewares: RwLock<Vec<BoxMiddleware>>,
  /// Registered plugins for extending functionality.
  #[cfg(feature = "plugins")]
  plugins: Vec<Box<dyn CatzillaPlugin>>,
  /// Flag to ensure plugins are initialized only once.
  #[cfg(feature = "plugins")]
  plugins_initialized: AtomicBool,
}

impl Default for Router {
  fn default() -> Self {
    Self::new()
  }
}

impl Router {
  /// Creates a new, empty router.
  pub fn new() -> Self {
    Self {
      routes: DashMap::default(),
      trie: RwLock::new(RouteNode::default()),
      middlewares: RwLock::new(Vec::new()),
      #[cfg(feature = "plugins")]
      plugins: Vec::new(),
      #[cfg(feature = "plugins")]
      plugins_initialized: AtomicBool::new(false),
    }
  }

  /// Inserts an already-built route into both the registry and the trie. On a
  /// `(method, path)` conflict with `overwrite == false`, logs a warning and keeps
  /// the first registration, per §4.1.
  fn insert_route(&self, route: Arc<Route>, overwrite: bool) -> Arc<Route> {
    let key = (route.method.clone(), route.path.clone());
    if !overwrite {
      if let Some(existing) = self.routes.get(&key) {
        tracing::warn!(
          method = %route.method,
          path = %route.path,
          "route already registered; keeping first registration"
        );
        return existing.clone();
      }
    }
    self
      .trie
      .write()
      .unwrap()
      .insert(&split_segments(&route.path), route.method.clone(), route.clone());
    self.routes.insert(key, route.clone());
    route
  }

  /// Registers a new route, failing if `method` is outside the closed verb set.
  pub fn add_route<H>(
    &self,
    method: Method,
    path: &str,
    handler: H,
    overwrite: bool,
  ) -> Result<Arc<Route>, RouterError>
  where
    H: Handler + Clone + 'static,
  {
    validate_method(&method)?;
    let route = Arc::new(Route::new(
      path.to_string(),
      method,
      BoxHandler::new(handler),
      None,
    ));
    Ok(self.insert_route(route, overwrite))
  }

  /// Registers a new route with the router.
  ///
  /// Associates an HTTP method and path pattern with a handler function. The path
  /// can contain dynamic segments using curly braces (e.g., `/users/{id}`), which
  /// are extracted as parameters during request processing.
  ///
  /// # Panics
  ///
  /// Panics if `method` is outside the closed verb set `{GET, POST, PUT, PATCH,
  /// DELETE, OPTIONS, HEAD}` — use [`Router::add_route`] for a non-panicking
  /// variant.
  pub fn route<H>(&mut self, method: Method, path: &str, handler: H) -> Arc<Route>
  where
    H: Handler + Clone + 'static,
  {
    self
      .add_route(method, path, handler, false)
      .unwrap_or_else(|e| panic!("{e}"))
  }

  /// Registers a route with trailing slash redirection enabled.
  ///
  /// # Panics
  ///
  /// Panics if called with the root path (`/`), or if `method` is outside the
  /// closed verb set.
  pub fn route_with_tsr<H>(&mut self, method: Method, path: &str, handler: H) -> Arc<Route>
  where
    H: Handler + Clone + 'static,
  {
    if path == "/" {
      panic!("Cannot route with TSR for root path");
    }
    validate_method(&method).unwrap_or_else(|e| panic!("{e}"));
    let route = Arc::new(Route::new(
      path.to_string(),
      method,
      BoxHandler::new(handler),
      Some(true),
    ));
    self.insert_route(route, false)
  }

  /// Flattens a [`RouterGroup`] into this router, reconstructing each entry's full
  /// path and middleware chain. Returns the registered routes so callers may attach
  /// further per-route middleware.
  pub fn include_group(&mut self, group: RouterGroup) -> Vec<Arc<Route>> {
    group
      .into_entries()
      .into_iter()
      .filter_map(|entry| {
        if let Err(e) = validate_method(&entry.method) {
          tracing::warn!(error = %e, path = %entry.path, "skipping group route with invalid method");
          return None;
        }
        let mut route = Route::new(entry.path, entry.method, entry.handler, None);
        route.tags = entry.tags;
        route.description = entry.description;
        route.metadata = entry.metadata;
        {
          let mut chain = route.middlewares.write().unwrap();
          for layer in entry.middleware_layers {
            chain.extend(layer);
          }
        }
        Some(self.insert_route(Arc::new(route), false))
      })
      .collect()
  }

  /// Dispatches an incoming request to the appropriate route handler.
  ///
  /// Matching yields one of three outcomes: a matched route is run through the
  /// middleware chain; a method-not-allowed match produces a `405` carrying the
  /// full `Allow` set; no match falls back to a trailing-slash redirect (if a
  /// TSR-enabled route exists at the toggled path) or a `404`.
  pub async fn dispatch(&self, mut req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segment_strings = split_segments(&path);
    let segments: Vec<&str> = segment_strings.iter().map(String::as_str).collect();

    match self.trie.read().unwrap().matches(&segments, &method) {
      MatchOutcome::Matched { route, params } => {
        if !params.is_empty() {
          req.extensions_mut().insert(PathParams(params));
        }

        let g_mws = self.middlewares.read().unwrap().clone();
        let r_mws = route.middlewares.read().unwrap().clone();
        let mut chain = Vec::with_capacity(g_mws.len() + r_mws.len());
        chain.extend(g_mws);
        chain.extend(r_mws);

        let next = Next {
          middlewares: Arc::new(chain),
          endpoint: Arc::new(route.handler.clone()),
        };
        next.run(req).await
      }
      MatchOutcome::MethodNotAllowed { allowed } => {
        let allow_header = allowed
          .iter()
          .map(|m| m.as_str())
          .collect::<Vec<_>>()
          .join(", ");
        hyper::Response::builder()
          .status(StatusCode::METHOD_NOT_ALLOWED)
          .header("Allow", allow_header)
          .body(CatzillaBody::empty())
          .unwrap()
      }
      MatchOutcome::NotFound => self.dispatch_not_found(&path, &method).unwrap_or_else(|| {
        hyper::Response::builder()
          .status(StatusCode::NOT_FOUND)
          .body(CatzillaBody::empty())
          .unwrap()
      }),
    }
  }

  /// Attempts a trailing-slash redirect for a path that didn't match directly.
  fn dispatch_not_found(&self, path: &str, method: &Method) -> Option<Response> {
    let tsr_path = if path.ends_with('/') {
      path.trim_end_matches('/').to_string()
    } else {
      format!("{path}/")
    };
    let tsr_segments_owned = split_segments(&tsr_path);
    let tsr_segments: Vec<&str> = tsr_segments_owned.iter().map(String::as_str).collect();

    if let MatchOutcome::Matched { route, .. } =
      self.trie.read().unwrap().matches(&tsr_segments, method)
    {
      if route.tsr {
        return Some(
          hyper::Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header("Location", tsr_path)
            .body(CatzillaBody::empty())
            .unwrap(),
        );
      }
    }
    None
  }

  /// Adds a value to the global state accessible by all handlers.
  pub fn state<T: Clone + Send + Sync + 'static>(&mut self, key: &str, value: T) {
    set_state(key, value);
  }

  /// Adds global middleware to the router, executed before group and route
  /// middleware, in registration order.
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

    self.middlewares.write().unwrap().push(mw);
    self
  }

  /// Registers a plugin with the router.
  #[cfg(feature = "plugins")]
  pub fn plugin<P>(&mut self, plugin: P) -> &mut Self
  where
    P: CatzillaPlugin + Clone + Send + Sync + 'static,
  {
    self.plugins.push(Box::new(plugin));
    self
  }

  /// Returns references to all registered plugins.
  #[cfg(feature = "plugins")]
  pub(crate) fn plugins(&self) -> Vec<&dyn CatzillaPlugin> {
    self.plugins.iter().map(|plugin| plugin.as_ref()).collect()
  }

  /// Initializes all registered plugins exactly once.
  #[cfg(feature = "plugins")]
  pub(crate) fn setup_plugins_once(&self) {
    use std::sync::atomic::Ordering;

    if !self.plugins_initialized.swap(true, Ordering::SeqCst) {
      for plugin in self.plugins() {
        let _ = plugin.setup(self);
      }
    }
  }

  /// Merges another router into this router.
  ///
  /// Routes are copied over, and the other router's global middleware is
  /// prepended to each merged route's middleware chain.
  pub fn merge(&mut self, other: Router) {
    let other_mws: Vec<BoxMiddleware> = other.middlewares.read().unwrap().clone();
    other.routes.iter().for_each(|entry| {
      let route = entry.value();
      for mw in other_mws.iter().rev() {
        route.middlewares.write().unwrap().push_front(mw.clone());
      }
      self.insert_route(route.clone(), true);
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::body::CatzillaBody;

  async fn ok(_req: Request) -> &'static str {
    "ok"
  }

  fn get_request(path: &str) -> Request {
    hyper::Request::builder()
      .method(Method::GET)
      .uri(path)
      .body(CatzillaBody::empty())
      .unwrap()
  }

  #[tokio::test]
  async fn dispatch_matches_registered_route() {
    let mut router = Router::new();
    router.route(Method::GET, "/users/{id}", ok);

    let resp = router.dispatch(get_request("/users/42")).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn dispatch_returns_405_with_full_allowed_set() {
    let mut router = Router::new();
    router.route(Method::GET, "/items", ok);
    router.route(Method::POST, "/items", ok);

    let req = hyper::Request::builder()
      .method(Method::PUT)
      .uri("/items")
      .body(CatzillaBody::empty())
      .unwrap();
    let resp = router.dispatch(req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = resp.headers().get("Allow").unwrap().to_str().unwrap();
    assert!(allow.contains("GET"));
    assert!(allow.contains("POST"));
  }

  #[tokio::test]
  async fn dispatch_returns_404_for_unknown_path() {
    let router = Router::new();
    let resp = router.dispatch(get_request("/nope")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn nested_group_inclusion_dispatches_with_path_params() {
    let mut posts = RouterGroup::new("/posts");
    posts.route(Method::GET, "/{post_id}", ok);

    let mut api = RouterGroup::new("/api/v1");
    api.include_group(posts);

    let mut router = Router::new();
    router.include_group(api);

    let resp = router.dispatch(get_request("/api/v1/posts/45")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // the un-prefixed intermediate path must not exist.
    let resp = router.dispatch(get_request("/api/v1/45")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn add_route_rejects_unknown_method() {
    let router = Router::new();
    let result = router.add_route(Method::TRACE, "/x", ok, false);
    assert!(matches!(result, Err(RouterError::InvalidMethod(_))));
  }
}
