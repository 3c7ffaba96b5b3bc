//! JSON HTTP API for the Subspace subscription ledger.
//!
//! Exposes an axum [`Router`] backed by any
//! [`subspace_core::store::LedgerStore`], plus the identity gate that owns
//! authentication and the session lifecycle. Transport concerns (TLS,
//! listeners) are the caller's responsibility; the `server` binary in this
//! crate wires everything together.

pub mod auth;
pub mod error;
pub mod records;
pub mod sessions;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use serde::Deserialize;
use subspace_core::store::LedgerStore;

use auth::IdentityGate;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Idle window for the `/records/feed` long-poll, in seconds.
  #[serde(default = "default_feed_timeout")]
  pub feed_timeout_secs: u64,
}

fn default_feed_timeout() -> u64 {
  25
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub gate:   Arc<IdentityGate<S>>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the Subspace API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LedgerStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Identity
    .route("/api/signup", post(sessions::sign_up::<S>))
    .route("/api/signin", post(sessions::sign_in::<S>))
    .route(
      "/api/session",
      get(sessions::whoami::<S>).delete(sessions::sign_out::<S>),
    )
    // Records
    .route(
      "/api/records",
      get(records::list::<S>).post(records::create::<S>),
    )
    .route("/api/records/due", get(records::due::<S>))
    .route("/api/records/feed", get(records::feed::<S>))
    .route("/api/records/{id}", delete(records::remove::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use subspace_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    AppState {
      gate:   Arc::new(IdentityGate::new(store.clone())),
      store,
      config: Arc::new(ServerConfig {
        host:              "127.0.0.1".to_string(),
        port:              7455,
        store_path:        PathBuf::from(":memory:"),
        feed_timeout_secs: 2,
      }),
    }
  }

  async fn oneshot(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Register `email` and return the session token.
  async fn signup(state: &AppState<SqliteStore>, email: &str) -> String {
    let resp = oneshot(
      state.clone(),
      "POST",
      "/api/signup",
      None,
      Some(json!({ "email": email, "password": "secret-password" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["token"].as_str().unwrap().to_string()
  }

  async fn add_record(
    state: &AppState<SqliteStore>,
    token: &str,
    name: &str,
    price: f64,
    due_date: &str,
  ) -> Value {
    let resp = oneshot(
      state.clone(),
      "POST",
      "/api/records",
      Some(token),
      Some(json!({ "name": name, "price": price, "due_date": due_date })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
  }

  // ── Identity ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn signup_returns_principal_and_token() {
    let state = make_state().await;
    let resp = oneshot(
      state,
      "POST",
      "/api/signup",
      None,
      Some(json!({ "email": "alice@example.com", "password": "secret-password" })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["principal"]["email"], "alice@example.com");
    assert!(!body["token"].as_str().unwrap().is_empty());
  }

  #[tokio::test]
  async fn signup_duplicate_email_is_a_conflict() {
    let state = make_state().await;
    signup(&state, "alice@example.com").await;

    let resp = oneshot(
      state,
      "POST",
      "/api/signup",
      None,
      Some(json!({ "email": "alice@example.com", "password": "secret-password" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["error"], "email already registered");
  }

  #[tokio::test]
  async fn signup_validates_email_and_password() {
    let state = make_state().await;

    let resp = oneshot(
      state.clone(),
      "POST",
      "/api/signup",
      None,
      Some(json!({ "email": "alice@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      body_json(resp).await["error"],
      "password must be at least 6 characters"
    );

    let resp = oneshot(
      state,
      "POST",
      "/api/signup",
      None,
      Some(json!({ "email": "not-an-email", "password": "secret-password" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn signin_roundtrip_and_whoami() {
    let state = make_state().await;
    signup(&state, "alice@example.com").await;

    let resp = oneshot(
      state.clone(),
      "POST",
      "/api/signin",
      None,
      Some(json!({ "email": "alice@example.com", "password": "secret-password" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["token"]
      .as_str()
      .unwrap()
      .to_string();

    let resp = oneshot(state, "GET", "/api/session", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      body_json(resp).await["principal"]["email"],
      "alice@example.com"
    );
  }

  #[tokio::test]
  async fn signin_failure_surfaces_the_provider_message() {
    let state = make_state().await;
    signup(&state, "alice@example.com").await;

    let resp = oneshot(
      state,
      "POST",
      "/api/signin",
      None,
      Some(json!({ "email": "alice@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "invalid email or password");
  }

  #[tokio::test]
  async fn record_routes_require_a_token() {
    let state = make_state().await;
    let resp = oneshot(state, "GET", "/api/records", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn sign_out_revokes_the_token() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;

    let resp =
      oneshot(state.clone(), "DELETE", "/api/session", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = oneshot(state, "GET", "/api/session", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Records ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn add_and_list_records() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;

    let created = add_record(&state, &token, "Music", 9.99, "2024-01-15").await;
    assert_eq!(created["name"], "Music");
    assert_eq!(created["due_date"], "2024-01-15");

    let resp =
      oneshot(state, "GET", "/api/records", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["record_id"], created["record_id"]);
  }

  #[tokio::test]
  async fn create_rejects_invalid_fields_without_persisting() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;

    for body in [
      json!({ "name": "  ", "price": 1.0, "due_date": "2024-01-15" }),
      json!({ "name": "Music", "price": -1.0, "due_date": "2024-01-15" }),
      json!({ "name": "Music", "price": 1.0, "due_date": "not-a-date" }),
      json!({ "price": 1.0, "due_date": "2024-01-15" }),
    ] {
      let resp = oneshot(
        state.clone(),
        "POST",
        "/api/records",
        Some(&token),
        Some(body.clone()),
      )
      .await;
      assert!(
        resp.status().is_client_error(),
        "accepted invalid body {body}"
      );
    }

    let resp = oneshot(state, "GET", "/api/records", Some(&token), None).await;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn remove_record_then_list_is_empty() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;
    let created = add_record(&state, &token, "Music", 9.99, "2024-01-15").await;
    let id = created["record_id"].as_str().unwrap();

    let resp = oneshot(
      state.clone(),
      "DELETE",
      &format!("/api/records/{id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = oneshot(state, "GET", "/api/records", Some(&token), None).await;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn remove_unknown_record_is_not_found() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;

    let resp = oneshot(
      state,
      "DELETE",
      &format!("/api/records/{}", uuid::Uuid::new_v4()),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn records_are_isolated_between_principals() {
    let state = make_state().await;
    let alice = signup(&state, "alice@example.com").await;
    let bob = signup(&state, "bob@example.com").await;

    let created = add_record(&state, &alice, "Music", 9.99, "2024-01-15").await;
    let id = created["record_id"].as_str().unwrap();

    // Bob sees an empty ledger.
    let resp =
      oneshot(state.clone(), "GET", "/api/records", Some(&bob), None).await;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());

    // Bob cannot remove Alice's record, and the failure looks like a
    // missing id.
    let resp = oneshot(
      state.clone(),
      "DELETE",
      &format!("/api/records/{id}"),
      Some(&bob),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = oneshot(state, "GET", "/api/records", Some(&alice), None).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
  }

  // ── Due summary ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn due_summary_counts_records_due_on_or_after_the_given_day() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;
    add_record(&state, &token, "A", 9.99, "2024-01-15").await;
    add_record(&state, &token, "B", 5.0, "2024-02-05").await;

    let resp = oneshot(
      state,
      "GET",
      "/api/records/due?on=2024-06-10",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"], 9.99);
    assert_eq!(body["due"].as_array().unwrap().len(), 1);
    assert_eq!(body["due"][0]["name"], "A");
  }

  // ── Live feed ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn feed_returns_the_seeded_snapshot_immediately() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;
    add_record(&state, &token, "Music", 9.99, "2024-01-15").await;

    let resp = oneshot(
      state,
      "GET",
      "/api/records/feed",
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["seq"].as_u64().unwrap() >= 1);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn feed_long_poll_wakes_on_a_new_record() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com").await;

    // Learn the current sequence number.
    let resp = oneshot(
      state.clone(),
      "GET",
      "/api/records/feed",
      Some(&token),
      None,
    )
    .await;
    let seq = body_json(resp).await["seq"].as_u64().unwrap();

    // Park a long-poll past that sequence number, then mutate.
    let parked = tokio::spawn({
      let state = state.clone();
      let token = token.clone();
      async move {
        oneshot(
          state,
          "GET",
          &format!("/api/records/feed?after={seq}"),
          Some(&token),
          None,
        )
        .await
      }
    });

    add_record(&state, &token, "Music", 9.99, "2024-01-15").await;

    let resp = parked.await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["seq"].as_u64().unwrap() > seq);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["records"][0]["name"], "Music");
  }
}
