//! The cache's supported value type set.
//!
//! Serialization is opaque to callers: `set(k, v)` followed by `get(k)` must return
//! a value structurally equal to `v` for anything built from this type. The wire
//! format used to move a `CacheValue` between tiers (or to disk) is an internal
//! detail — it does not need to be human-readable JSON, only round-trip faithful.

use std::collections::BTreeMap;

/// A value the cache can store: strings, bytes, numbers, booleans, and nested
/// lists/maps of the same. Anything outside this set fails registration-time
/// conversion with [`super::error::CacheError::UnserializableValue`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CacheValue {
  String(String),
  Bytes(Vec<u8>),
  Integer(i64),
  Float(f64),
  Bool(bool),
  List(Vec<CacheValue>),
  Map(BTreeMap<String, CacheValue>),
}

impl From<String> for CacheValue {
  fn from(v: String) -> Self {
    CacheValue::String(v)
  }
}

impl From<&str> for CacheValue {
  fn from(v: &str) -> Self {
    CacheValue::String(v.to_string())
  }
}

impl From<Vec<u8>> for CacheValue {
  fn from(v: Vec<u8>) -> Self {
    CacheValue::Bytes(v)
  }
}

impl From<i64> for CacheValue {
  fn from(v: i64) -> Self {
    CacheValue::Integer(v)
  }
}

impl From<f64> for CacheValue {
  fn from(v: f64) -> Self {
    CacheValue::Float(v)
  }
}

impl From<bool> for CacheValue {
  fn from(v: bool) -> Self {
    CacheValue::Bool(v)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_through_the_wire_format() {
    let mut map = BTreeMap::new();
    map.insert("count".to_string(), CacheValue::Integer(3));
    map.insert(
      "tags".to_string(),
      CacheValue::List(vec!["a".into(), "b".into()]),
    );
    let value = CacheValue::Map(map);

    let bytes = serde_json::to_vec(&value).unwrap();
    let restored: CacheValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, restored);
  }
}
