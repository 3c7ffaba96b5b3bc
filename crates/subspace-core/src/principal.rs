//! Principal — the authenticated identity records are scoped to.
//!
//! A principal carries no attributes beyond identity and the email display
//! label. The ledger references it for scoping queries only; its lifecycle
//! is owned by the identity gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
  pub principal_id: Uuid,
  pub email:        String,
  pub created_at:   DateTime<Utc>,
}

/// The continuously-updated authentication state a client observes.
///
/// Starts as `Unknown` and resolves to `Anonymous` or `Authenticated`
/// asynchronously once the environment has initialised.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PrincipalState {
  #[default]
  Unknown,
  Anonymous,
  Authenticated(Principal),
}

impl PrincipalState {
  pub fn principal(&self) -> Option<&Principal> {
    match self {
      Self::Authenticated(p) => Some(p),
      _ => None,
    }
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self, Self::Authenticated(_))
  }
}
