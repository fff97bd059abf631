//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use haven_sos::{DispatchError, ValidationErrors};
use serde_json::json;
use thiserror::Error;

pub const USER_NOT_FOUND: &str = "User not found.";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Field-level problems; the body is the per-field message map.
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<DispatchError> for ApiError {
  fn from(e: DispatchError) -> Self {
    match e {
      DispatchError::Validation(errors) => Self::Validation(errors),
      DispatchError::UserNotFound(_) => Self::NotFound(USER_NOT_FOUND.to_string()),
      DispatchError::Store(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "detail": m }))).into_response()
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": m }))).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure while handling request");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "detail": e.to_string() })),
        )
          .into_response()
      }
    }
  }
}
