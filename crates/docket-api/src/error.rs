//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use docket_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Workflow(#[from] docket_core::Error),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    let ApiError::Workflow(e) = self;
    match e.kind() {
      ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::InvalidTransition => StatusCode::UNPROCESSABLE_ENTITY,
      ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let ApiError::Workflow(e) = &self;
    if status.is_server_error() {
      tracing::error!(error = %e, "request failed");
    }
    (status, Json(json!({ "error": e.to_string(), "kind": e.kind() }))).into_response()
  }
}
