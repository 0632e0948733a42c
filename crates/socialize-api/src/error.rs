//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use socialize_core::ErrorKind;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Every error renders as `{"error": message, "kind": kind}`. Internal
/// failures are logged and rendered with a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] socialize_core::Error),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("{0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ApiError::Core(e) => e.kind(),
      ApiError::InvalidCredentials => ErrorKind::Unauthenticated,
      ApiError::BadRequest(_) => ErrorKind::Validation,
      ApiError::Internal(_) => ErrorKind::Internal,
    }
  }
}

// ─── Extractor rejections ────────────────────────────────────────────────────
//
// Parser details stay in the debug log; clients get a short message in the
// usual envelope.

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(error = %rejection.body_text(), "rejected request body");
    let message = match rejection {
      JsonRejection::MissingJsonContentType(_) => {
        "expected a JSON body with content-type application/json"
      }
      JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
      JsonRejection::JsonDataError(_) => {
        "request body is missing fields or has fields of the wrong type"
      }
      _ => "could not read the request body",
    };
    ApiError::BadRequest(message.into())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    tracing::debug!(error = %rejection.body_text(), "rejected path");
    ApiError::BadRequest("invalid path parameter".into())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    tracing::debug!(error = %rejection.body_text(), "rejected query string");
    ApiError::BadRequest("invalid query string".into())
  }
}

fn status(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let message = if kind == ErrorKind::Internal {
      tracing::error!(error = %self, "request failed");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };
    (status(kind), Json(json!({ "error": message, "kind": kind }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn core_errors_map_to_statuses() {
    use socialize_core::Error;

    let (status, json) = body(Error::NotFound("post".into()).into()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
    assert_eq!(json["error"], "post not found");

    let (status, _) = body(Error::Forbidden("no".into()).into()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = body(Error::DuplicateReaction.into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "conflict");
  }

  #[tokio::test]
  async fn rejections_become_bad_requests() {
    use axum::{extract::FromRequest, http::Request};

    let req = Request::builder()
      .header("content-type", "text/plain")
      .body(axum::body::Body::from("{}"))
      .unwrap();
    let rejection = Json::<serde_json::Value>::from_request(req, &())
      .await
      .unwrap_err();
    let (status, json) = body(rejection.into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
  }

  #[tokio::test]
  async fn internal_errors_do_not_leak() {
    let err = socialize_core::Error::store(std::io::Error::other("disk on fire"));
    let (status, json) = body(err.into()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "internal server error");
    assert_eq!(json["kind"], "internal");
  }
}
