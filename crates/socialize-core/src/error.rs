//! Error types for `socialize-core`.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("authentication required")]
  Unauthenticated,

  #[error("{0}")]
  Validation(String),

  #[error("{0} not found")]
  NotFound(String),

  #[error("{0}")]
  Forbidden(String),

  /// The reaction uniqueness constraint refused an insert, or an unlike
  /// found no row. Callers retry as a fresh toggle.
  #[error("reaction changed concurrently")]
  DuplicateReaction,

  #[error("{0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unauthenticated => ErrorKind::Unauthenticated,
      Self::Validation(_) => ErrorKind::Validation,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::DuplicateReaction | Self::Conflict(_) => ErrorKind::Conflict,
      Self::Store(_) => ErrorKind::Internal,
    }
  }
}

/// The machine-checkable failure taxonomy exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Unauthenticated,
  Validation,
  NotFound,
  Forbidden,
  Conflict,
  Internal,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
