//! Response-cache middleware: caches whole HTTP responses in a [`SmartCache`]
//! keyed by request fingerprint.
//!
//! Behavior:
//! - Only requests matching the configured method/path/header rules are even
//!   considered (see [`Config::is_request_cacheable`]).
//! - Only responses matching the configured status/header rules are stored
//!   (see [`Config::is_response_cacheable`]).
//! - TTL is derived from the response's own `Cache-Control: max-age`, falling
//!   back to `Expires`, falling back to the configured default.
//! - A per-path `rules` override (glob with `*` suffix) can replace the
//!   defaults for matching paths.
//! - Hits get `x-cache: HIT` and `x-cache-age`; cacheable misses get
//!   `x-cache: MISS` and `x-cache-ttl`.

use std::{
  collections::BTreeMap,
  sync::Arc,
  time::{Duration, SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use http::{
  HeaderValue, Method, StatusCode,
  header::{CACHE_CONTROL, CONTENT_LENGTH, EXPIRES, VARY},
};
use http_body_util::BodyExt;

use crate::{
  body::CatzillaBody,
  cache::{SmartCache, value::CacheValue},
  middleware::Next,
  responder::Responder,
  router::Router,
  types::{Request, Response},
};

/// Per-path override for [`Config`]'s defaults. Any field left `None` falls
/// back to the top-level configuration.
#[derive(Clone, Debug, Default)]
pub struct RuleOverride {
  pub ttl: Option<Duration>,
  pub methods: Option<Vec<Method>>,
  pub status_codes: Option<Vec<u16>>,
  pub vary_headers: Option<Vec<String>>,
}

/// Configuration for the response-cache middleware, per the configuration
/// enumeration's response-cache fields.
#[derive(Clone, Debug)]
pub struct Config {
  pub default_ttl: Duration,
  pub cache_methods: Vec<Method>,
  pub cache_status_codes: Vec<u16>,
  /// Query parameters dropped before key generation. Empty by default: unlike
  /// the reference implementation this does not silently drop `timestamp` or
  /// `cache_buster`-style params, since doing so is an application policy
  /// decision, not a framework default.
  pub ignore_query_params: Vec<String>,
  pub cache_headers: Vec<String>,
  pub cache_vary_headers: Vec<String>,
  pub cache_private: bool,
  pub cache_authenticated: bool,
  pub exclude_paths: Vec<String>,
  pub include_paths: Vec<String>,
  pub rules: Vec<(String, RuleOverride)>,
  pub max_cached_body_bytes: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      default_ttl: Duration::from_secs(300),
      cache_methods: vec![Method::GET, Method::HEAD],
      cache_status_codes: vec![200, 301, 302, 404],
      ignore_query_params: Vec::new(),
      cache_headers: vec![
        "accept".to_string(),
        "accept-encoding".to_string(),
        "accept-language".to_string(),
      ],
      cache_vary_headers: Vec::new(),
      cache_private: false,
      cache_authenticated: false,
      exclude_paths: Vec::new(),
      include_paths: Vec::new(),
      rules: Vec::new(),
      max_cached_body_bytes: 2 * 1024 * 1024,
    }
  }
}

impl Config {
  fn rule_for(&self, path: &str) -> Option<&RuleOverride> {
    self.rules.iter().find(|(glob, _)| glob_matches(glob, path)).map(|(_, rule)| rule)
  }

  fn methods_for(&self, path: &str) -> Vec<Method> {
    self
      .rule_for(path)
      .and_then(|r| r.methods.clone())
      .unwrap_or_else(|| self.cache_methods.clone())
  }

  fn status_codes_for(&self, path: &str) -> Vec<u16> {
    self
      .rule_for(path)
      .and_then(|r| r.status_codes.clone())
      .unwrap_or_else(|| self.cache_status_codes.clone())
  }

  fn ttl_for(&self, path: &str) -> Duration {
    self.rule_for(path).and_then(|r| r.ttl).unwrap_or(self.default_ttl)
  }

  fn path_included(&self, path: &str) -> bool {
    if !self.include_paths.is_empty() && !self.include_paths.iter().any(|g| glob_matches(g, path)) {
      return false;
    }
    !self.exclude_paths.iter().any(|g| glob_matches(g, path))
  }

  fn is_request_cacheable<B>(&self, req: &http::Request<B>) -> bool {
    let path = req.uri().path();
    if !self.methods_for(path).contains(req.method()) {
      return false;
    }
    if !self.path_included(path) {
      return false;
    }
    if !self.cache_authenticated && req.headers().contains_key(http::header::AUTHORIZATION) {
      return false;
    }
    if let Some(cc) = req.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
      if directive_present(cc, "no-cache") || directive_present(cc, "no-store") {
        return false;
      }
    }
    true
  }

  fn is_response_cacheable(&self, path: &str, status: StatusCode, headers: &http::HeaderMap) -> bool {
    if !self.status_codes_for(path).contains(&status.as_u16()) {
      return false;
    }
    if let Some(cc) = headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
      if directive_present(cc, "no-cache") || directive_present(cc, "no-store") {
        return false;
      }
      if !self.cache_private && directive_present(cc, "private") {
        return false;
      }
    }
    if headers.get(VARY).and_then(|v| v.to_str().ok()) == Some("*") {
      return false;
    }
    true
  }
}

fn directive_present(cache_control: &str, directive: &str) -> bool {
  cache_control.split(',').any(|part| part.trim().eq_ignore_ascii_case(directive))
}

/// `*`-suffix glob match: `glob` ending in `*` matches any path sharing its
/// prefix; otherwise it must match `path` exactly.
fn glob_matches(glob: &str, path: &str) -> bool {
  match glob.strip_suffix('*') {
    Some(prefix) => path.starts_with(prefix),
    None => glob == path,
  }
}

fn now_secs() -> u64 {
  SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// TTL in seconds: prefer `Cache-Control: max-age`, then `Expires`, then the
/// configured default.
fn derive_ttl(headers: &http::HeaderMap, default: Duration) -> Duration {
  if let Some(cc) = headers.get(CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
    for part in cc.split(',') {
      let part = part.trim();
      if let Some(value) = part.strip_prefix("max-age=") {
        if let Ok(secs) = value.parse::<u64>() {
          return Duration::from_secs(secs);
        }
      }
    }
  }
  if let Some(expires) = headers.get(EXPIRES).and_then(|v| v.to_str().ok()) {
    if let Some(at) = parse_http_date(expires) {
      if let Ok(remaining) = at.duration_since(SystemTime::now()) {
        return remaining;
      }
      return Duration::from_secs(0);
    }
  }
  default
}

/// Parses an RFC 7231 IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`), the only
/// `Expires` format modern HTTP servers emit. No date-handling crate is in the
/// teacher's dependency stack, so this is hand-rolled calendar math rather than
/// an added dependency.
fn parse_http_date(value: &str) -> Option<SystemTime> {
  let mut fields = value.split_whitespace();
  fields.next()?; // weekday, e.g. "Sun,"
  let day: u64 = fields.next()?.parse().ok()?;
  let month = month_index(fields.next()?)?;
  let year: i64 = fields.next()?.parse().ok()?;
  let time = fields.next()?;
  let mut time_fields = time.split(':');
  let hour: u64 = time_fields.next()?.parse().ok()?;
  let minute: u64 = time_fields.next()?.parse().ok()?;
  let second: u64 = time_fields.next()?.parse().ok()?;

  let days = days_from_civil(year, month, day as i64);
  let secs = days.checked_mul(86_400)? + (hour * 3600 + minute * 60 + second) as i64;
  if secs < 0 {
    return None;
  }
  Some(UNIX_EPOCH + Duration::from_secs(secs as u64))
}

fn month_index(name: &str) -> Option<i64> {
  const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
  ];
  MONTHS.iter().position(|m| *m == name).map(|i| i as i64 + 1)
}

/// Days since the Unix epoch for a civil (year, month, day) date. Howard
/// Hinnant's `days_from_civil` algorithm, valid for the proleptic Gregorian
/// calendar.
fn days_from_civil(y: i64, m: i64, d: i64) -> i64 {
  let y = if m <= 2 { y - 1 } else { y };
  let era = if y >= 0 { y } else { y - 399 } / 400;
  let yoe = (y - era * 400) as i64;
  let mp = (m + 9) % 12;
  let doy = (153 * mp + 2) / 5 + d - 1;
  let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
  era * 146_097 + doe - 719_468
}

/// Serialized form of a cached response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Envelope {
  status: u16,
  headers: Vec<(String, String)>,
  body: Vec<u8>,
  media_type: Option<String>,
  cached_at: u64,
}

/// Builds the cache key, folding in the configured `cache_headers` subset plus
/// any response `Vary` headers recorded for this path on a prior store.
fn build_key(cache: &SmartCache, config: &Config, req: &Request) -> String {
  let path = req.uri().path();
  let query = req.uri().query();
  let ignored: std::collections::HashSet<String> = config.ignore_query_params.iter().cloned().collect();
  let normalized_query = query.map(|q| crate::cache::key::canonicalize_query(q, &ignored));

  let mut headers = BTreeMap::new();
  let vary_headers = config.rule_for(path).and_then(|r| r.vary_headers.clone()).unwrap_or_default();
  for name in config.cache_headers.iter().chain(vary_headers.iter()).chain(config.cache_vary_headers.iter()) {
    if let Some(value) = req.headers().get(name.as_str()).and_then(|v| v.to_str().ok()) {
      headers.insert(name.to_ascii_lowercase(), value.to_string());
    }
  }

  cache.generate_key(req.method().as_str(), path, normalized_query.as_deref(), &headers)
}

/// The response-cache middleware. Install on a router with [`Self::install`].
#[derive(Clone)]
pub struct ResponseCachePlugin {
  cache: Arc<SmartCache>,
  config: Config,
}

impl ResponseCachePlugin {
  pub fn new(cache: Arc<SmartCache>, config: Config) -> Self {
    Self { cache, config }
  }

  /// Registers this middleware on `router`, ahead of route/group middleware,
  /// per the ordering guarantees' "middleware pre-handlers run in registration
  /// order" contract.
  pub fn install(&self, router: &Router) {
    let cache = self.cache.clone();
    let config = self.config.clone();
    router.middleware(move |req, next| {
      let cache = cache.clone();
      let config = config.clone();
      async move { process(req, next, cache, config).await }
    });
  }
}

async fn process(req: Request, next: Next, cache: Arc<SmartCache>, config: Config) -> impl Responder {
  if !config.is_request_cacheable(&req) {
    return next.run(req).await;
  }

  let path = req.uri().path().to_string();
  let key = build_key(&cache, &config, &req);

  let (value, found) = cache.get(&key).await;
  if found {
    if let Some(CacheValue::Bytes(bytes)) = value {
      if let Ok(envelope) = serde_json::from_slice::<Envelope>(&bytes) {
        return inflate(envelope);
      }
    }
  }

  let mut resp = next.run(req).await;

  let status = resp.status();
  if !config.is_response_cacheable(&path, status, resp.headers()) {
    return resp;
  }

  let collected = match resp.body_mut().collect().await {
    Ok(c) => c.to_bytes(),
    Err(_) => Bytes::new(),
  };
  if collected.len() > config.max_cached_body_bytes {
    *resp.body_mut() = CatzillaBody::from(collected);
    return resp;
  }

  let ttl = derive_ttl(resp.headers(), config.ttl_for(&path));
  let media_type = resp
    .headers()
    .get(http::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);
  let headers: Vec<(String, String)> = resp
    .headers()
    .iter()
    .filter(|(name, _)| *name != CONTENT_LENGTH)
    .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
    .collect();

  let envelope = Envelope {
    status: status.as_u16(),
    headers,
    body: collected.to_vec(),
    media_type,
    cached_at: now_secs(),
  };

  if let Ok(bytes) = serde_json::to_vec(&envelope) {
    let _ = cache.set(&key, CacheValue::Bytes(bytes), Some(ttl)).await;
  }

  resp.headers_mut().insert("x-cache", HeaderValue::from_static("MISS"));
  if let Ok(value) = HeaderValue::from_str(&ttl.as_secs().to_string()) {
    resp.headers_mut().insert("x-cache-ttl", value);
  }
  *resp.body_mut() = CatzillaBody::from(collected);
  resp
}

fn inflate(envelope: Envelope) -> Response {
  let mut builder = http::Response::builder().status(envelope.status);
  let headers = builder.headers_mut().expect("builder status always succeeds");
  for (name, value) in &envelope.headers {
    if let (Ok(name), Ok(value)) = (
      http::HeaderName::from_bytes(name.as_bytes()),
      HeaderValue::from_str(value),
    ) {
      headers.insert(name, value);
    }
  }
  headers.insert("x-cache", HeaderValue::from_static("HIT"));
  let age = now_secs().saturating_sub(envelope.cached_at);
  if let Ok(value) = HeaderValue::from_str(&age.to_string()) {
    headers.insert("x-cache-age", value);
  }
  builder.body(CatzillaBody::from(Bytes::from(envelope.body))).unwrap()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn glob_suffix_matches_prefix() {
    assert!(glob_matches("/api/*", "/api/users/1"));
    assert!(!glob_matches("/api/*", "/other"));
    assert!(glob_matches("/health", "/health"));
    assert!(!glob_matches("/health", "/health/live"));
  }

  #[test]
  fn no_store_request_is_not_cacheable() {
    let config = Config::default();
    let req = http::Request::builder()
      .method("GET")
      .uri("/x")
      .header(CACHE_CONTROL, "no-store")
      .body(CatzillaBody::empty())
      .unwrap();
    assert!(!config.is_request_cacheable(&req));
  }

  #[test]
  fn authorization_header_excludes_by_default() {
    let config = Config::default();
    let req = http::Request::builder()
      .method("GET")
      .uri("/x")
      .header(http::header::AUTHORIZATION, "Bearer abc")
      .body(CatzillaBody::empty())
      .unwrap();
    assert!(!config.is_request_cacheable(&req));
  }

  #[test]
  fn parses_an_imf_fixdate() {
    let at = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
    let secs = at.duration_since(UNIX_EPOCH).unwrap().as_secs();
    assert_eq!(secs, 784_111_777);
  }

  #[test]
  fn max_age_wins_over_default_ttl() {
    let mut headers = http::HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=42"));
    let ttl = derive_ttl(&headers, Duration::from_secs(300));
    assert_eq!(ttl, Duration::from_secs(42));
  }

  #[test]
  fn rule_override_replaces_default_status_codes() {
    let mut config = Config::default();
    config.rules.push((
      "/api/*".to_string(),
      RuleOverride {
        status_codes: Some(vec![200]),
        ..RuleOverride::default()
      },
    ));
    assert_eq!(config.status_codes_for("/api/things"), vec![200]);
    assert_eq!(config.status_codes_for("/other"), config.cache_status_codes);
  }
}
