//! Async HTTP client wrapping the Subspace JSON API.

use std::{sync::Mutex, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::Client;
use subspace_core::{
  feed::RecordSnapshot,
  principal::Principal,
  record::SubscriptionRecord,
};
use uuid::Uuid;

/// Connection settings for the Subspace API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the Subspace JSON API.
///
/// Holds the bearer token for the current session. The token lives only in
/// process memory and is dropped on sign-out.
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  Mutex<Option<String>>,
}

#[derive(serde::Deserialize)]
struct SessionBody {
  principal: Principal,
  token:     String,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    // The request timeout must outlast the server's feed long-poll window.
    let client = Client::builder()
      .timeout(Duration::from_secs(40))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, token: Mutex::new(None) })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match self.token.lock().expect("token poisoned").as_deref() {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Unwrap a response, turning a non-success status into the server's
  /// error message verbatim.
  async fn checked(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    match resp.json::<ErrorBody>().await {
      Ok(body) => Err(anyhow!(body.error)),
      Err(_) => Err(anyhow!("request failed: {status}")),
    }
  }

  // ── Identity ──────────────────────────────────────────────────────────────

  /// `POST /api/signin` — stores the session token on success.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
    let resp = self
      .client
      .post(self.url("/signin"))
      .json(&serde_json::json!({ "email": email, "password": password }))
      .send()
      .await
      .context("POST /signin failed")?;

    let session: SessionBody = Self::checked(resp)
      .await?
      .json()
      .await
      .context("deserialising session")?;
    *self.token.lock().expect("token poisoned") = Some(session.token);
    Ok(session.principal)
  }

  /// `POST /api/signup` — registers and stores the session token on success.
  pub async fn sign_up(&self, email: &str, password: &str) -> Result<Principal> {
    let resp = self
      .client
      .post(self.url("/signup"))
      .json(&serde_json::json!({ "email": email, "password": password }))
      .send()
      .await
      .context("POST /signup failed")?;

    let session: SessionBody = Self::checked(resp)
      .await?
      .json()
      .await
      .context("deserialising session")?;
    *self.token.lock().expect("token poisoned") = Some(session.token);
    Ok(session.principal)
  }

  /// `DELETE /api/session` — the local token is dropped whether or not the
  /// server-side revocation succeeds.
  pub async fn sign_out(&self) -> Result<()> {
    let req = self.auth(self.client.delete(self.url("/session")));
    *self.token.lock().expect("token poisoned") = None;

    let resp = req.send().await.context("DELETE /session failed")?;
    Self::checked(resp).await?;
    Ok(())
  }

  // ── Records ───────────────────────────────────────────────────────────────

  /// `GET /api/records`
  pub async fn list_records(&self) -> Result<Vec<SubscriptionRecord>> {
    let resp = self
      .auth(self.client.get(self.url("/records")))
      .send()
      .await
      .context("GET /records failed")?;
    Self::checked(resp)
      .await?
      .json()
      .await
      .context("deserialising records")
  }

  /// `POST /api/records`
  pub async fn add_record(
    &self,
    name: &str,
    price: f64,
    due_date: NaiveDate,
  ) -> Result<SubscriptionRecord> {
    let resp = self
      .auth(self.client.post(self.url("/records")))
      .json(&serde_json::json!({
        "name": name,
        "price": price,
        "due_date": due_date,
      }))
      .send()
      .await
      .context("POST /records failed")?;
    Self::checked(resp)
      .await?
      .json()
      .await
      .context("deserialising record")
  }

  /// `DELETE /api/records/{id}`
  pub async fn remove_record(&self, id: Uuid) -> Result<()> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/records/{id}"))))
      .send()
      .await
      .context("DELETE /records failed")?;
    Self::checked(resp).await?;
    Ok(())
  }

  /// `GET /api/records/feed?after=<seq>` — long-poll for the next snapshot.
  pub async fn poll_feed(&self, after: u64) -> Result<RecordSnapshot> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/records/feed?after={after}"))))
      .send()
      .await
      .context("GET /records/feed failed")?;
    Self::checked(resp)
      .await?
      .json()
      .await
      .context("deserialising snapshot")
  }
}
