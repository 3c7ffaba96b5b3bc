//! The identity gate — credential verification, session issuance, and the
//! bearer-token request extractor.
//!
//! Passwords are hashed with argon2 and only the PHC string reaches the
//! store. Session tokens are 32 random bytes, handed to the client
//! base64url-encoded and kept server-side only as SHA-256 digests.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use subspace_core::{principal::Principal, store::LedgerStore};

use crate::{AppState, error::ApiError};

/// The one credential-failure message, shared by unknown-email and
/// wrong-password paths so the two are indistinguishable to a caller.
const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Minimum password length accepted at sign-up.
const MIN_PASSWORD_LEN: usize = 6;

// ─── Identity gate ────────────────────────────────────────────────────────────

/// Verifies identities and owns the session lifecycle: issued on
/// sign-in/sign-up, revoked on sign-out. The gate holds no business data —
/// the ledger only ever receives a [`Principal`] id for scoping.
pub struct IdentityGate<S> {
  store:    Arc<S>,
  /// SHA-256 token digest → authenticated principal.
  sessions: Mutex<HashMap<String, Principal>>,
}

impl<S: LedgerStore> IdentityGate<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, sessions: Mutex::new(HashMap::new()) }
  }

  /// Create a new credential record and authenticate it.
  ///
  /// Validates the email shape and the provider's weak-password rule before
  /// touching the store; a taken email is a conflict.
  pub async fn sign_up(
    &self,
    email: &str,
    password: &str,
  ) -> Result<(Principal, String), ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
      return Err(ApiError::BadRequest("invalid email address".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
      return Err(ApiError::BadRequest(format!(
        "password must be at least {MIN_PASSWORD_LEN} characters"
      )));
    }
    if self
      .store
      .principal_by_email(email)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .is_some()
    {
      return Err(ApiError::Conflict("email already registered".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))?
      .to_string();

    let principal = self
      .store
      .add_principal(email, &hash)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

    tracing::info!(email, "principal registered");
    let token = self.issue(principal.clone());
    Ok((principal, token))
  }

  /// Authenticate against the credential store and issue a session.
  ///
  /// No retries; a failure leaves state unauthenticated and reports
  /// [`INVALID_CREDENTIALS`] regardless of which check failed.
  pub async fn sign_in(
    &self,
    email: &str,
    password: &str,
  ) -> Result<(Principal, String), ApiError> {
    let stored = self
      .store
      .principal_by_email(email.trim())
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let parsed = PasswordHash::new(&stored.password_hash)
      .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    tracing::info!(email, "principal signed in");
    let token = self.issue(stored.principal.clone());
    Ok((stored.principal, token))
  }

  /// Revoke the session behind `token`. Unknown tokens are a no-op.
  pub fn sign_out(&self, token: &str) {
    self
      .sessions
      .lock()
      .expect("session table poisoned")
      .remove(&digest(token));
  }

  /// Resolve a presented token to its principal, if the session is live.
  pub fn resolve(&self, token: &str) -> Option<Principal> {
    self
      .sessions
      .lock()
      .expect("session table poisoned")
      .get(&digest(token))
      .cloned()
  }

  fn issue(&self, principal: Principal) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = B64.encode(bytes);
    self
      .sessions
      .lock()
      .expect("session table poisoned")
      .insert(digest(&token), principal);
    token
  }
}

fn digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

// ─── Request extractor ────────────────────────────────────────────────────────

/// The authenticated request context: present in a handler's arguments
/// means the bearer token resolved to a live session. Handlers receive the
/// principal explicitly — there is no ambient global session state.
pub struct Session {
  pub principal: Principal,
  /// The presented token, kept so sign-out can revoke it.
  pub token:     String,
}

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::to_string)
    .ok_or_else(|| ApiError::Unauthorized("unauthorized".into()))
}

impl<S> FromRequestParts<AppState<S>> for Session
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let principal = state
      .gate
      .resolve(&token)
      .ok_or_else(|| ApiError::Unauthorized("unauthorized".into()))?;
    Ok(Session { principal, token })
  }
}
