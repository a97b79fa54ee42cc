//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as
//! `{"error": {"code": "...", "message": "...", "details": [...]}}` with a
//! status derived from the error's [`ErrorKind`], never from its text.

use std::fmt::Display;

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use campus_core::{Classify, ErrorKind, FieldError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing, malformed, unknown or expired bearer token.
  #[error("authentication required")]
  Unauthorized,

  #[error("{message}")]
  Rejected {
    kind:    ErrorKind,
    message: String,
    details: Vec<FieldError>,
  },
}

impl ApiError {
  /// Convert a store failure, hiding the details of internal ones.
  pub fn store<E>(err: E) -> Self
  where
    E: Classify + Display,
  {
    let kind = err.kind();
    if kind == ErrorKind::Internal {
      tracing::error!(error = %err, "store failure");
      return Self::Rejected { kind, message: "internal error".to_owned(), details: vec![] };
    }
    Self::Rejected { kind, message: err.to_string(), details: err.field_errors().to_vec() }
  }

  pub fn not_found(what: &'static str) -> Self { campus_core::Error::NotFound(what).into() }

  fn malformed(field: &str, message: String) -> Self {
    Self::Rejected {
      kind: ErrorKind::Validation,
      message,
      details: vec![FieldError::new(field, "MALFORMED")],
    }
  }
}

impl From<campus_core::Error> for ApiError {
  fn from(err: campus_core::Error) -> Self { Self::store(err) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::malformed("body", rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::malformed("query", rejection.body_text()) }
}

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        json!({ "code": "UNAUTHORIZED", "message": "authentication required" }),
      ),
      ApiError::Rejected { kind, message, details } => {
        if kind != ErrorKind::Internal {
          tracing::warn!(code = kind.code(), %message, "request rejected");
        }
        let mut body = json!({ "code": kind.code(), "message": message });
        if !details.is_empty() {
          body["details"] = json!(details);
        }
        (status_for(kind), body)
      }
    };
    (status, Json(json!({ "error": body }))).into_response()
  }
}
