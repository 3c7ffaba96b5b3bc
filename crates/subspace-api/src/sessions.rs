//! Handlers for authentication endpoints.
//!
//! | Method   | Path       | Notes |
//! |----------|------------|-------|
//! | `POST`   | `/signup`  | Body: `{"email":…,"password":…}`; 201 + session |
//! | `POST`   | `/signin`  | Same body; 200 + session; 401 on bad credentials |
//! | `GET`    | `/session` | Bearer auth; the current principal |
//! | `DELETE` | `/session` | Bearer auth; revokes the token, 204 |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use subspace_core::{principal::Principal, store::LedgerStore};

use crate::{AppState, auth::Session, error::ApiError};

// ─── Bodies ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
  pub email:    String,
  pub password: String,
}

/// Returned by both `/signup` and `/signin`: the authenticated principal
/// plus the bearer token for subsequent requests.
#[derive(Debug, Serialize)]
pub struct SessionBody {
  pub principal: Principal,
  pub token:     String,
}

// ─── Sign up ──────────────────────────────────────────────────────────────────

/// `POST /signup`
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let (principal, token) = state.gate.sign_up(&body.email, &body.password).await?;
  Ok((StatusCode::CREATED, Json(SessionBody { principal, token })))
}

// ─── Sign in ──────────────────────────────────────────────────────────────────

/// `POST /signin`
pub async fn sign_in<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CredentialsBody>,
) -> Result<Json<SessionBody>, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let (principal, token) = state.gate.sign_in(&body.email, &body.password).await?;
  Ok(Json(SessionBody { principal, token }))
}

// ─── Current principal ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct WhoamiBody {
  pub principal: Principal,
}

/// `GET /session`
pub async fn whoami<S>(session: Session) -> Json<WhoamiBody>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  Json(WhoamiBody { principal: session.principal })
}

// ─── Sign out ─────────────────────────────────────────────────────────────────

/// `DELETE /session`
pub async fn sign_out<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> StatusCode
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  state.gate.sign_out(&session.token);
  StatusCode::NO_CONTENT
}
