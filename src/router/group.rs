//! Route groups: prefix-scoped collections of routes that can be nested and merged
//! into a [`Router`](crate::router::Router).
//!
//! Prefixes are normalized once at construction and again whenever a path is combined
//! with a prefix (§4.1.1). Nested inclusion (§4.1.2) reconstructs the full prefix
//! chain rather than concatenating only the outermost prefix — this is the
//! regression-sensitive part the tests in `router::tests` exercise directly.

use std::{collections::HashMap, future::Future, sync::Arc};

use http::Method;

use crate::{
  handler::{BoxHandler, Handler},
  middleware::Next,
  responder::Responder,
  types::{BoxMiddleware, Request},
};

/// Collapses runs of `/` to a single `/`, ensuring a leading slash.
fn collapse_slashes(path: &str) -> String {
  let mut out = String::with_capacity(path.len());
  let mut last_slash = false;
  for c in path.chars() {
    if c == '/' {
      if last_slash {
        continue;
      }
      last_slash = true;
    } else {
      last_slash = false;
    }
    out.push(c);
  }
  if !out.starts_with('/') {
    out.insert(0, '/');
  }
  out
}

/// Normalizes a group prefix per §4.1.1: empty/`/` become `""`; otherwise ensure a
/// leading `/`, collapse duplicate `/`, and strip a trailing `/`.
pub(crate) fn normalize_prefix(raw: &str) -> String {
  if raw.is_empty() || raw == "/" {
    return String::new();
  }
  let leading = if raw.starts_with('/') {
    raw.to_string()
  } else {
    format!("/{raw}")
  };
  let collapsed = collapse_slashes(&leading);
  if collapsed == "/" {
    String::new()
  } else if collapsed.len() > 1 && collapsed.ends_with('/') {
    collapsed[..collapsed.len() - 1].to_string()
  } else {
    collapsed
  }
}

/// Combines a normalized group prefix with a route path, re-applying the collapse
/// and trailing-slash-strip rules — except for the documented edge case where the
/// route path is exactly `/` and the prefix is non-empty, which is stored literally
/// as `prefix + "/"` so it coexists with a same-prefix group root.
pub(crate) fn combine_path(prefix: &str, route_path: &str) -> String {
  let route_path = if route_path.starts_with('/') {
    route_path.to_string()
  } else {
    format!("/{route_path}")
  };
  if prefix.is_empty() {
    return collapse_slashes(&route_path);
  }
  if route_path == "/" {
    return format!("{prefix}/");
  }
  let joined = format!("{prefix}{route_path}");
  let collapsed = collapse_slashes(&joined);
  if collapsed.len() > 1 && collapsed.ends_with('/') {
    collapsed[..collapsed.len() - 1].to_string()
  } else {
    collapsed
  }
}

/// One route entry accumulated inside a [`RouterGroup`], not yet inserted into a
/// router's trie.
pub(crate) struct GroupRoute {
  pub method: Method,
  pub path: String,
  pub handler: BoxHandler,
  pub tags: Vec<String>,
  pub description: Option<String>,
  pub metadata: HashMap<String, String>,
  /// Middleware layers, outermost group first; flattened in this order at
  /// registration time, with route-specific middleware appended after.
  pub middleware_layers: Vec<Vec<BoxMiddleware>>,
}

/// A named, prefix-scoped collection of routes that can be nested and eventually
/// merged into a [`Router`](crate::router::Router) via
/// [`Router::include_group`](crate::router::Router::include_group).
///
/// # Examples
///
/// ```rust
/// use catzilla::router::{Router, group::RouterGroup};
/// use catzilla::{Method, responder::Responder, types::Request};
///
/// async fn get_post(_req: Request) -> impl Responder {
///     "a post"
/// }
///
/// let mut posts = RouterGroup::new("/posts");
/// posts.route(Method::GET, "/{post_id}", get_post);
///
/// let mut api = RouterGroup::new("/api/v1");
/// api.include_group(posts);
///
/// let mut router = Router::new();
/// router.include_group(api);
/// ```
pub struct RouterGroup {
  /// Normalized prefix for this group.
  pub prefix: String,
  /// Tags applied to every route registered directly in this group.
  pub tags: Vec<String>,
  /// Description applied to every route registered directly in this group.
  pub description: Option<String>,
  /// Metadata applied to every route registered directly in this group.
  pub metadata: HashMap<String, String>,
  entries: Vec<GroupRoute>,
  own_middleware: Vec<BoxMiddleware>,
}

impl RouterGroup {
  /// Creates a new group with the given (not-yet-normalized) prefix.
  pub fn new(prefix: impl AsRef<str>) -> Self {
    Self {
      prefix: normalize_prefix(prefix.as_ref()),
      tags: Vec::new(),
      description: None,
      metadata: HashMap::new(),
      entries: Vec::new(),
      own_middleware: Vec::new(),
    }
  }

  /// Attaches tags applied to every route subsequently registered directly in this
  /// group.
  pub fn with_tags(mut self, tags: Vec<String>) -> Self {
    self.tags = tags;
    self
  }

  /// Attaches a description applied to every route subsequently registered directly
  /// in this group.
  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Registers a route relative to this group's prefix.
  pub fn route<H>(&mut self, method: Method, path: &str, handler: H) -> &mut Self
  where
    H: Handler + Clone + 'static,
  {
    let combined = combine_path(&self.prefix, path);
    self.entries.push(GroupRoute {
      method,
      path: combined,
      handler: BoxHandler::new(handler),
      tags: self.tags.clone(),
      description: self.description.clone(),
      metadata: self.metadata.clone(),
      middleware_layers: vec![self.own_middleware.clone()],
    });
    self
  }

  /// Adds middleware applied to every route in this group (and, transitively, to
  /// groups that include this one).
  pub fn middleware<F, Fut, R>(&mut self, f: F) -> &mut Self
  where
    F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Responder + Send + 'static,
  {
    let mw: BoxMiddleware = Arc::new(move |req, next| {
      let fut = f(req, next);
      Box::pin(async move { fut.await.into_response() })
    });
    self.own_middleware.push(mw);
    self
  }

  /// Includes `other`'s routes into this group, reconstructing the full prefix
  /// chain (§4.1.2): every entry's path becomes
  /// `combine_path(self.prefix, entry.path)` — since `entry.path` already embeds
  /// every prefix up to and including `other`'s, this recovers
  /// `self.prefix + other.prefix + relative_path` without needing to separately
  /// strip and re-add `other.prefix`. Each entry gains `original_group_prefix`
  /// (the chain before this inclusion) and `included_in_group` (this group's own
  /// prefix) metadata.
  pub fn include_group(&mut self, mut other: RouterGroup) {
    for mut entry in other.entries.drain(..) {
      let original_group_prefix = entry.path.clone();
      entry.path = combine_path(&self.prefix, &entry.path);
      entry
        .metadata
        .insert("original_group_prefix".to_string(), original_group_prefix);
      entry
        .metadata
        .insert("included_in_group".to_string(), self.prefix.clone());
      entry.middleware_layers.insert(0, self.own_middleware.clone());
      self.entries.push(entry);
    }
  }

  /// Consumes the group, returning its accumulated entries for insertion into a
  /// router's trie.
  pub(crate) fn into_entries(self) -> Vec<GroupRoute> {
    self.entries
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalizes_empty_and_root_prefixes() {
    assert_eq!(normalize_prefix(""), "");
    assert_eq!(normalize_prefix("/"), "");
    assert_eq!(normalize_prefix("api"), "/api");
    assert_eq!(normalize_prefix("/api/"), "/api");
    assert_eq!(normalize_prefix("//api//v1//"), "/api/v1");
  }

  #[test]
  fn combines_prefix_and_path() {
    assert_eq!(combine_path("/api/v1", "/posts/{id}"), "/api/v1/posts/{id}");
    assert_eq!(combine_path("", "/posts"), "/posts");
    // group-root edge case: route "/" inside a non-root group keeps the slash.
    assert_eq!(combine_path("/api", "/"), "/api/");
  }

  #[test]
  fn nested_inclusion_preserves_full_prefix_chain() {
    let mut posts = RouterGroup::new("/posts");
    posts.route(Method::GET, "/{post_id}", |_req: crate::types::Request| async { "ok" });

    let mut api = RouterGroup::new("/api/v1");
    api.include_group(posts);

    let entries = api.into_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "/api/v1/posts/{post_id}");
    assert_eq!(
      entries[0].metadata.get("included_in_group"),
      Some(&"/api/v1".to_string())
    );
    assert_eq!(
      entries[0].metadata.get("original_group_prefix"),
      Some(&"/posts/{post_id}".to_string())
    );
  }
}
