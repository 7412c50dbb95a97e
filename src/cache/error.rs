//! Cache error taxonomy.
//!
//! Per the component's failure semantics, cache errors must never fail the request
//! path: a [`CacheError`] is something callers of the *cache itself* (the response-
//! cache middleware, or application code using the cache directly) may inspect and
//! log, but a lower-tier failure always degrades to a miss rather than surfacing here.

use http::StatusCode;

use crate::responder::Responder;

#[derive(Debug)]
pub enum CacheError {
  /// The value passed to `set` is outside the supported type set.
  UnserializableValue(String),
  /// A tier (remote or disk) is configured but currently unreachable.
  TierUnavailable(&'static str),
}

impl std::fmt::Display for CacheError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      CacheError::UnserializableValue(detail) => write!(f, "unserializable cache value: {detail}"),
      CacheError::TierUnavailable(tier) => write!(f, "cache tier '{tier}' is unavailable"),
    }
  }
}

impl std::error::Error for CacheError {}

impl Responder for CacheError {
  fn into_response(self) -> crate::types::Response {
    (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
  }
}
