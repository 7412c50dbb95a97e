//! Crate-wide error taxonomy.
//!
//! `CatzillaError` is the kind catalog handlers and middleware map their
//! failures onto; it is not meant to replace `anyhow::Error` for ad hoc
//! handler errors (see `Responder for anyhow::Error` in `responder.rs`) but to
//! give framework-level failures — dependency resolution, handler dispatch,
//! cache — a structured shape with a stable status-code mapping.

use http::StatusCode;
use serde::Serialize;

use crate::{
  body::CatzillaBody,
  cache::CacheError,
  classifier::ClassifierError,
  di::DiError,
  responder::Responder,
  types::Response,
};

/// Error kinds per the error-handling design's taxonomy. Client* variants map
/// to 4xx; Dependency/Handler/System map to 5xx.
#[derive(Debug, thiserror::Error)]
pub enum CatzillaError {
  #[error("{0}")]
  ClientRequest(String),
  #[error("{message}")]
  Validation { message: String, field: Option<String> },
  #[error("{0}")]
  Authorization(String),
  #[error(transparent)]
  Dependency(#[from] DiError),
  #[error(transparent)]
  Handler(#[from] ClassifierError),
  #[error(transparent)]
  Cache(#[from] CacheError),
  #[error("{0}")]
  System(String),
}

impl CatzillaError {
  fn kind_name(&self) -> &'static str {
    match self {
      Self::ClientRequest(_) => "client_request",
      Self::Validation { .. } => "validation",
      Self::Authorization(_) => "authorization",
      Self::Dependency(_) => "dependency",
      Self::Handler(_) => "handler",
      Self::Cache(_) => "cache",
      Self::System(_) => "system",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::ClientRequest(_) => StatusCode::BAD_REQUEST,
      Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      Self::Authorization(_) => StatusCode::UNAUTHORIZED,
      Self::Dependency(_) | Self::Handler(_) | Self::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn field(&self) -> Option<&str> {
    match self {
      Self::Validation { field, .. } => field.as_deref(),
      _ => None,
    }
  }
}

/// The structured body every `CatzillaError` response carries, per the
/// error-handling design's `{error, detail?, field?, code?}` contract.
#[derive(Serialize)]
struct ErrorBody<'a> {
  error: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  detail: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  field: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  code: Option<u16>,
}

impl Responder for CatzillaError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = ErrorBody {
      error: self.kind_name(),
      detail: Some(self.to_string()),
      field: self.field(),
      code: Some(status.as_u16()),
    };
    let json = serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec());

    http::Response::builder()
      .status(status)
      .header(http::header::CONTENT_TYPE, "application/json")
      .body(CatzillaBody::from(json))
      .expect("status and header are always valid")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_request_maps_to_400() {
    let err = CatzillaError::ClientRequest("bad path".to_string());
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn dependency_error_maps_to_500() {
    let err = CatzillaError::from(DiError::ServiceNotFound("db".to_string()));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn validation_error_carries_its_field_name() {
    let err = CatzillaError::Validation {
      message: "must be positive".to_string(),
      field: Some("age".to_string()),
    };
    assert_eq!(err.field(), Some("age"));
    assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
  }
}
