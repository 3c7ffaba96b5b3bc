//! The `LedgerStore` trait — the narrow persistence contract.
//!
//! Implemented by storage backends (e.g. `subspace-store-sqlite`). Higher
//! layers depend on this abstraction, not on any concrete backend. It
//! covers both collaborator surfaces: the credential side the identity gate
//! authenticates against, and the record side the ledger reads and mutates.

use std::future::Future;

use uuid::Uuid;

use crate::{
  feed::RecordFeed,
  principal::Principal,
  record::{NewRecord, SubscriptionRecord},
};

/// A stored principal together with its credential hash, as needed by the
/// identity gate for verification. The hash never crosses the API surface.
#[derive(Debug, Clone)]
pub struct StoredPrincipal {
  pub principal:     Principal,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Abstraction over a Subspace storage backend.
///
/// Records are owner-scoped: every record returned by `records_for` or the
/// live feed satisfies `record.owner_id == owner`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Principals ────────────────────────────────────────────────────────

  /// Create and persist a principal. Errors if `email` is already taken.
  /// `principal_id` and `created_at` are assigned by the store.
  fn add_principal<'a>(
    &'a self,
    email: &'a str,
    password_hash: &'a str,
  ) -> impl Future<Output = Result<Principal, Self::Error>> + Send + 'a;

  /// Look up a principal and its credential hash by email.
  /// Returns `None` if no such principal exists.
  fn principal_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<StoredPrincipal>, Self::Error>> + Send + 'a;

  /// Retrieve a principal by id. Returns `None` if not found.
  fn principal_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Principal>, Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  /// Persist a new record and return it. `record_id` and `created_at` are
  /// assigned by the store.
  fn add_record(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<SubscriptionRecord, Self::Error>> + Send + '_;

  /// Delete a record by id. Errors if the id does not exist.
  fn remove_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All records owned by `owner`, oldest first.
  fn records_for(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<SubscriptionRecord>, Self::Error>> + Send + '_;

  // ── Live feed ─────────────────────────────────────────────────────────

  /// Subscribe to `owner`'s records. The returned feed is seeded with the
  /// current snapshot and receives a full replacement on every add or
  /// remove touching that owner. Dropping the feed unsubscribes.
  fn watch_records(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<RecordFeed, Self::Error>> + Send + '_;
}
