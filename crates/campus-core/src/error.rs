//! Error types for `campus-core`.
//!
//! Every error maps onto a small, stable [`ErrorKind`] so callers branch on
//! the category rather than on message text.

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:  String,
  /// Upper-snake reason code, e.g. `REQUIRED` or `TOO_LONG`.
  pub reason: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self { field: field.into(), reason: reason.into() }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed ({} field error(s))", .0.len())]
  Validation(Vec<FieldError>),

  #[error("malformed identifier: {0:?}")]
  InvalidId(String),

  #[error("unknown identifier prefix: {0:?}")]
  InvalidPrefix(String),

  #[error("cursor could not be decoded: {0}")]
  CursorDecode(String),

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("forbidden: {0}")]
  Forbidden(&'static str),

  #[error("conflict: {0}")]
  Conflict(&'static str),

  #[error("could not allocate a unique {0} id")]
  IdCollision(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Shorthand for a validation error on a single field.
  pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, reason)])
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Stable error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Forbidden,
  Conflict,
  Internal,
}

impl ErrorKind {
  /// The wire code used in API error bodies.
  pub fn code(self) -> &'static str {
    match self {
      Self::Validation => "VALIDATION_ERROR",
      Self::NotFound => "NOT_FOUND",
      Self::Forbidden => "FORBIDDEN",
      Self::Conflict => "CONFLICT",
      Self::Internal => "INTERNAL",
    }
  }
}

/// Implemented by every error type that can cross the store boundary.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  /// Field-level details for [`ErrorKind::Validation`] errors.
  fn field_errors(&self) -> &[FieldError] { &[] }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_)
      | Self::InvalidId(_)
      | Self::InvalidPrefix(_)
      | Self::CursorDecode(_) => ErrorKind::Validation,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::IdCollision(_) | Self::Serialization(_) => ErrorKind::Internal,
    }
  }

  fn field_errors(&self) -> &[FieldError] {
    match self {
      Self::Validation(fields) => fields,
      _ => &[],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_are_stable() {
    assert_eq!(Error::invalid("title", "REQUIRED").kind(), ErrorKind::Validation);
    assert_eq!(Error::InvalidId("x".into()).kind(), ErrorKind::Validation);
    assert_eq!(Error::NotFound("thread").kind(), ErrorKind::NotFound);
    assert_eq!(Error::Forbidden("solve").kind(), ErrorKind::Forbidden);
    assert_eq!(Error::Conflict("reaction").kind(), ErrorKind::Conflict);
    assert_eq!(Error::IdCollision("thr").kind(), ErrorKind::Internal);
  }

  #[test]
  fn validation_exposes_fields() {
    let err = Error::invalid("body", "TOO_LONG");
    assert_eq!(err.field_errors(), &[FieldError::new("body", "TOO_LONG")]);
    assert!(Error::NotFound("comment").field_errors().is_empty());
  }
}
