//! Error types for `subspace-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("principal not found: {0}")]
  PrincipalNotFound(Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("record name must not be empty")]
  EmptyName,

  #[error("record price must be a non-negative finite amount, got {0}")]
  InvalidPrice(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
