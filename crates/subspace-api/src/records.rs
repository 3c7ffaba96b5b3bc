//! Handlers for `/records` endpoints. All routes are scoped to the
//! authenticated principal; a record id belonging to someone else behaves
//! exactly like an unknown id.
//!
//! | Method   | Path            | Notes |
//! |----------|-----------------|-------|
//! | `GET`    | `/records`      | The principal's records, oldest first |
//! | `POST`   | `/records`      | Body: [`NewRecordBody`]; 201 + stored record |
//! | `DELETE` | `/records/{id}` | 204; 404 when absent or foreign |
//! | `GET`    | `/records/due`  | Optional `?on=YYYY-MM-DD`; due summary |
//! | `GET`    | `/records/feed` | Long-poll; optional `?after=<seq>` |

use std::time::Duration;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Datelike as _, NaiveDate, Utc};
use serde::Deserialize;
use subspace_core::{
  due::{DuePaymentSummary, evaluate_due_payments},
  feed::RecordSnapshot,
  record::{NewRecord, SubscriptionRecord},
  store::LedgerStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Session, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /records`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Json<Vec<SubscriptionRecord>>, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let records = state
    .store
    .records_for(session.principal.principal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /records`. The owner is always the
/// authenticated principal — it is never taken from the body.
#[derive(Debug, Deserialize)]
pub struct NewRecordBody {
  pub name:     String,
  pub price:    f64,
  pub due_date: NaiveDate,
}

/// `POST /records` — 201 + the stored record.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Json(body): Json<NewRecordBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let input = NewRecord::new(
    session.principal.principal_id,
    body.name,
    body.price,
    body.due_date,
  )
  .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let record = state
    .store
    .add_record(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /records/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let owner = session.principal.principal_id;
  let records = state
    .store
    .records_for(owner)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if !records.iter().any(|r| r.record_id == id) {
    return Err(ApiError::NotFound(format!("record {id} not found")));
  }

  state
    .store
    .remove_record(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Due summary ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DueParams {
  /// Evaluation date; defaults to today (UTC). Only the day-of-month
  /// matters to the evaluation.
  pub on: Option<NaiveDate>,
}

/// `GET /records/due[?on=YYYY-MM-DD]`
pub async fn due<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Query(params): Query<DueParams>,
) -> Result<Json<DuePaymentSummary>, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let today = params.on.unwrap_or_else(|| Utc::now().date_naive());
  let records = state
    .store
    .records_for(session.principal.principal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(evaluate_due_payments(&records, today.day())))
}

// ─── Live feed ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedParams {
  /// Last sequence number the caller has seen; `0` returns immediately.
  #[serde(default)]
  pub after: u64,
}

/// `GET /records/feed[?after=<seq>]` — long-poll.
///
/// Suspends until a snapshot newer than `after` is published, or until the
/// configured idle window elapses; either way the response carries the
/// latest full snapshot, never a delta.
pub async fn feed<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Query(params): Query<FeedParams>,
) -> Result<Json<RecordSnapshot>, ApiError>
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  let mut feed = state
    .store
    .watch_records(session.principal.principal_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let window = Duration::from_secs(state.config.feed_timeout_secs);
  let snapshot =
    match tokio::time::timeout(window, feed.wait_newer(params.after)).await {
      Ok(Some(snapshot)) => snapshot,
      // Idle window elapsed, or the publishing side went away.
      Ok(None) | Err(_) => feed.snapshot(),
    };

  Ok(Json(snapshot))
}
