//! Fingerprint key generation.
//!
//! Mirrors the handshake digest in [`crate::ws`] (`Sha1::new()` / `.update()` /
//! `.finalize()`) but over a documented delimiter-joined byte sequence instead of
//! the WebSocket accept-key recipe.

use std::collections::BTreeMap;

use sha1::{Digest, Sha1};

/// Produces a stable hex digest over `(method, path, query_string, headers)`.
///
/// The digest covers, in order: the upper-cased method, the exact path, the
/// caller-supplied (already canonicalized) query string, and the caller-supplied
/// header subset sorted by lower-cased name. Each component is newline-delimited
/// so that e.g. a path containing no query string can never collide with one
/// that does.
pub fn generate_key(
  method: &str,
  path: &str,
  query_string: Option<&str>,
  headers: &BTreeMap<String, String>,
) -> String {
  let mut hasher = Sha1::new();
  hasher.update(method.to_uppercase().as_bytes());
  hasher.update(b"\n");
  hasher.update(path.as_bytes());
  hasher.update(b"\n");
  hasher.update(query_string.unwrap_or("").as_bytes());
  hasher.update(b"\n");
  for (name, value) in headers {
    hasher.update(name.to_lowercase().as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    hasher.update(b"\n");
  }
  hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len() * 2);
  for byte in bytes {
    out.push_str(&format!("{byte:02x}"));
  }
  out
}

/// Canonicalizes a raw query string for inclusion in a cache key: parses
/// `k=v` pairs, drops any name present in `ignored_params`, sorts by key then
/// by value, and rejoins with `&`. Blank values are preserved (an explicit
/// `?flag=` is distinct from the parameter being absent).
pub fn canonicalize_query(query_string: &str, ignored_params: &std::collections::HashSet<String>) -> String {
  if query_string.is_empty() {
    return String::new();
  }

  let mut pairs: Vec<(String, String)> = query_string
    .split('&')
    .filter(|segment| !segment.is_empty())
    .map(|segment| match segment.split_once('=') {
      Some((k, v)) => (k.to_string(), v.to_string()),
      None => (segment.to_string(), String::new()),
    })
    .filter(|(name, _)| !ignored_params.contains(name))
    .collect();

  pairs.sort();
  pairs
    .into_iter()
    .map(|(k, v)| format!("{k}={v}"))
    .collect::<Vec<_>>()
    .join("&")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_is_stable_for_identical_inputs() {
    let headers = BTreeMap::new();
    let a = generate_key("GET", "/users", None, &headers);
    let b = generate_key("get", "/users", None, &headers);
    assert_eq!(a, b, "method casing must not affect the key");
  }

  #[test]
  fn key_differs_when_query_differs() {
    let headers = BTreeMap::new();
    let a = generate_key("GET", "/users", Some("page=1"), &headers);
    let b = generate_key("GET", "/users", Some("page=2"), &headers);
    assert_ne!(a, b);
  }

  #[test]
  fn canonicalize_drops_ignored_and_sorts() {
    let mut ignored = std::collections::HashSet::new();
    ignored.insert("cache_buster".to_string());
    let result = canonicalize_query("b=2&cache_buster=xyz&a=1", &ignored);
    assert_eq!(result, "a=1&b=2");
  }

  #[test]
  fn canonicalize_empty_string_is_empty() {
    let ignored = std::collections::HashSet::new();
    assert_eq!(canonicalize_query("", &ignored), "");
  }
}
