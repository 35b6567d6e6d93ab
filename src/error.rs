//! Request-level error taxonomy and its HTTP mapping.

use axum::{
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
  /// Bad client input; the message is shown to the caller.
  #[error("{0}")]
  Validation(String),
  #[error("{0}")]
  NotFound(String),
  /// Details are logged, never returned.
  #[error("storage error: {0}")]
  Storage(#[from] sqlx::Error),
  #[error("no entries available to build a question")]
  EmptyPool,
}

impl AppError {
  pub fn validation(msg: impl Into<String>) -> Self {
    AppError::Validation(msg.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Storage(_) | AppError::EmptyPool => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
    AppError::Validation(rejection.body_text())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      AppError::Validation(m) | AppError::NotFound(m) => m.clone(),
      AppError::Storage(e) => {
        error!(target: "store", error = %e, "Storage operation failed");
        "internal error".to_string()
      }
      AppError::EmptyPool => {
        error!(target: "game", "Question requested from an empty pool");
        "internal error".to_string()
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
