//! Error type for `campus-store-sqlite`.

use campus_core::{Classify, ErrorKind, FieldError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain outcome (not found, forbidden, validation, ...).
  #[error(transparent)]
  Core(#[from] campus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored column could not be turned back into a domain value.
  #[error("corrupt row: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::Database(_) | Self::Json(_) | Self::Decode(_) => ErrorKind::Internal,
    }
  }

  fn field_errors(&self) -> &[FieldError] {
    match self {
      Self::Core(e) => e.field_errors(),
      _ => &[],
    }
  }
}
