//! Radix trie used to match incoming requests against registered routes.
//!
//! Each [`RouteNode`] holds static children (exact segment match), at most one
//! parameter child (captures a single segment), and at most one wildcard child
//! (captures the remaining path). Matching walks the segment list once, trying
//! static, then parameter, then wildcard at each node — no backtracking, so the
//! tie-break ("static beats parameter") falls directly out of the walk order rather
//! than a post-hoc comparison.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;

use crate::router::route::Route;

/// Splits a request path into segments, preserving a significant trailing slash as
/// an explicit empty final segment (so `/users` and `/users/` land on distinct
/// trie nodes, per the data model's path-template grammar).
pub(crate) fn split_segments(path: &str) -> Vec<String> {
  let trimmed = path.strip_prefix('/').unwrap_or(path);
  if trimmed.is_empty() {
    return Vec::new();
  }
  let trailing_slash = trimmed.ends_with('/');
  let mut segments: Vec<String> = trimmed
    .split('/')
    .filter(|s| !s.is_empty())
    .map(|s| s.to_string())
    .collect();
  if trailing_slash {
    segments.push(String::new());
  }
  segments
}

fn wildcard_name(segment: &str) -> Option<&str> {
  if segment.len() > 3 && segment.starts_with("{*") && segment.ends_with('}') {
    Some(&segment[2..segment.len() - 1])
  } else {
    None
  }
}

fn param_name(segment: &str) -> Option<&str> {
  if segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}') {
    Some(&segment[1..segment.len() - 1])
  } else {
    None
  }
}

/// Outcome of matching a `(method, path)` pair against the trie, per the router's
/// three-outcome contract: matched, method-not-allowed, or not-found.
pub(crate) enum MatchOutcome {
  Matched {
    route: Arc<Route>,
    params: HashMap<String, String>,
  },
  MethodNotAllowed {
    allowed: HashSet<Method>,
  },
  NotFound,
}

/// A single node of the routing trie.
#[derive(Default)]
pub(crate) struct RouteNode {
  static_children: HashMap<String, RouteNode>,
  param_child: Option<(String, Box<RouteNode>)>,
  wildcard_child: Option<(String, Box<RouteNode>)>,
  method_table: HashMap<Method, Arc<Route>>,
  allowed_methods: HashSet<Method>,
}

impl RouteNode {
  /// Inserts `route` at the path described by `segments` for `method`.
  pub(crate) fn insert(&mut self, segments: &[String], method: Method, route: Arc<Route>) {
    match segments.split_first() {
      None => {
        self.allowed_methods.insert(method.clone());
        self.method_table.insert(method, route);
      }
      Some((seg, rest)) => {
        if let Some(name) = wildcard_name(seg) {
          let entry = self
            .wildcard_child
            .get_or_insert_with(|| (name.to_string(), Box::default()));
          entry.1.insert(rest, method, route);
        } else if let Some(name) = param_name(seg) {
          let entry = self
            .param_child
            .get_or_insert_with(|| (name.to_string(), Box::default()));
          entry.1.insert(rest, method, route);
        } else {
          self
            .static_children
            .entry(seg.clone())
            .or_default()
            .insert(rest, method, route);
        }
      }
    }
  }

  /// Matches `segments` against this subtree for `method`. Single-pass, no
  /// backtracking: static child first, then parameter child, then wildcard child.
  pub(crate) fn matches(&self, segments: &[&str], method: &Method) -> MatchOutcome {
    match segments.split_first() {
      None => {
        if let Some(route) = self.method_table.get(method) {
          MatchOutcome::Matched {
            route: route.clone(),
            params: HashMap::new(),
          }
        } else if !self.allowed_methods.is_empty() {
          MatchOutcome::MethodNotAllowed {
            allowed: self.allowed_methods.clone(),
          }
        } else {
          MatchOutcome::NotFound
        }
      }
      Some((seg, rest)) => {
        if let Some(child) = self.static_children.get(*seg) {
          return child.matches(rest, method);
        }
        if let Some((name, child)) = &self.param_child {
          return match child.matches(rest, method) {
            MatchOutcome::Matched { route, mut params } => {
              params.insert(name.clone(), (*seg).to_string());
              MatchOutcome::Matched { route, params }
            }
            other => other,
          };
        }
        if let Some((name, child)) = &self.wildcard_child {
          let remainder = std::iter::once(*seg)
            .chain(rest.iter().copied())
            .collect::<Vec<_>>()
            .join("/");
          return match child.matches(&[], method) {
            MatchOutcome::Matched { route, mut params } => {
              params.insert(name.clone(), remainder);
              MatchOutcome::Matched { route, params }
            }
            other => other,
          };
        }
        MatchOutcome::NotFound
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::handler::BoxHandler;

  fn dummy_route(path: &str, method: Method) -> Arc<Route> {
    Arc::new(Route::new(
      path.to_string(),
      method,
      BoxHandler::new(|_req: crate::types::Request| async { "ok" }),
      None,
    ))
  }

  #[test]
  fn static_beats_param_at_same_depth() {
    let mut root = RouteNode::default();
    root.insert(
      &["users".to_string(), "me".to_string()],
      Method::GET,
      dummy_route("/users/me", Method::GET),
    );
    root.insert(
      &["users".to_string(), "{id}".to_string()],
      Method::GET,
      dummy_route("/users/{id}", Method::GET),
    );

    match root.matches(&["users", "me"], &Method::GET) {
      MatchOutcome::Matched { route, params } => {
        assert_eq!(route.path, "/users/me");
        assert!(params.is_empty());
      }
      _ => panic!("expected a static match"),
    }

    match root.matches(&["users", "42"], &Method::GET) {
      MatchOutcome::Matched { route, params } => {
        assert_eq!(route.path, "/users/{id}");
        assert_eq!(params.get("id"), Some(&"42".to_string()));
      }
      _ => panic!("expected a param match"),
    }
  }

  #[test]
  fn method_not_allowed_carries_full_allowed_set() {
    let mut root = RouteNode::default();
    root.insert(
      &["items".to_string()],
      Method::GET,
      dummy_route("/items", Method::GET),
    );
    root.insert(
      &["items".to_string()],
      Method::POST,
      dummy_route("/items", Method::POST),
    );

    match root.matches(&["items"], &Method::PUT) {
      MatchOutcome::MethodNotAllowed { allowed } => {
        assert!(allowed.contains(&Method::GET));
        assert!(allowed.contains(&Method::POST));
        assert_eq!(allowed.len(), 2);
      }
      _ => panic!("expected method-not-allowed"),
    }
  }

  #[test]
  fn unregistered_path_is_not_found() {
    let root = RouteNode::default();
    match root.matches(&["nope"], &Method::GET) {
      MatchOutcome::NotFound => {}
      _ => panic!("expected not-found"),
    }
  }
}
