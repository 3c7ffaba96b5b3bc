//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use subspace_core::{
  principal::Principal,
  record::NewRecord,
  store::LedgerStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn principal(s: &SqliteStore, email: &str) -> Principal {
  s.add_principal(email, "$argon2id$v=19$test-hash")
    .await
    .unwrap()
}

fn record_input(owner: Uuid, name: &str, price: f64, due_date: &str) -> NewRecord {
  NewRecord::new(
    owner,
    name,
    price,
    NaiveDate::parse_from_str(due_date, "%Y-%m-%d").unwrap(),
  )
  .unwrap()
}

// ─── Principals ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_principal() {
  let s = store().await;

  let p = principal(&s, "alice@example.com").await;
  assert_eq!(p.email, "alice@example.com");

  let by_id = s.principal_by_id(p.principal_id).await.unwrap().unwrap();
  assert_eq!(by_id, p);

  let by_email = s
    .principal_by_email("alice@example.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_email.principal, p);
  assert_eq!(by_email.password_hash, "$argon2id$v=19$test-hash");
}

#[tokio::test]
async fn principal_lookups_return_none_when_missing() {
  let s = store().await;
  assert!(s.principal_by_id(Uuid::new_v4()).await.unwrap().is_none());
  assert!(
    s.principal_by_email("nobody@example.com")
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn duplicate_email_errors() {
  let s = store().await;
  principal(&s, "alice@example.com").await;

  let err = s
    .add_principal("alice@example.com", "another-hash")
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::EmailTaken(e) if e == "alice@example.com"));
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_record_and_list() {
  let s = store().await;
  let p = principal(&s, "alice@example.com").await;

  let record = s
    .add_record(record_input(p.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();
  assert_eq!(record.owner_id, p.principal_id);
  assert_eq!(record.due_day(), 15);

  let records = s.records_for(p.principal_id).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0], record);
}

#[tokio::test]
async fn records_are_scoped_to_their_owner() {
  let s = store().await;
  let alice = principal(&s, "alice@example.com").await;
  let bob = principal(&s, "bob@example.com").await;

  s.add_record(record_input(alice.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();
  s.add_record(record_input(bob.principal_id, "Cloud", 5.0, "2024-02-05"))
    .await
    .unwrap();

  let alices = s.records_for(alice.principal_id).await.unwrap();
  assert_eq!(alices.len(), 1);
  assert!(alices.iter().all(|r| r.owner_id == alice.principal_id));

  let bobs = s.records_for(bob.principal_id).await.unwrap();
  assert_eq!(bobs.len(), 1);
  assert!(bobs.iter().all(|r| r.owner_id == bob.principal_id));
}

#[tokio::test]
async fn remove_record_deletes_it() {
  let s = store().await;
  let p = principal(&s, "alice@example.com").await;

  let keep = s
    .add_record(record_input(p.principal_id, "Keep", 1.0, "2024-01-10"))
    .await
    .unwrap();
  let gone = s
    .add_record(record_input(p.principal_id, "Gone", 2.0, "2024-01-20"))
    .await
    .unwrap();

  s.remove_record(gone.record_id).await.unwrap();

  let records = s.records_for(p.principal_id).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].record_id, keep.record_id);
  assert!(records.iter().all(|r| r.record_id != gone.record_id));
}

#[tokio::test]
async fn remove_nonexistent_record_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.remove_record(id).await.unwrap_err();
  assert!(matches!(err, crate::Error::RecordNotFound(got) if got == id));
}

// ─── Live feed ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn watch_seeds_with_current_snapshot() {
  let s = store().await;
  let p = principal(&s, "alice@example.com").await;

  s.add_record(record_input(p.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();

  let feed = s.watch_records(p.principal_id).await.unwrap();
  let snap = feed.snapshot();
  assert_eq!(snap.records.len(), 1);
  assert_eq!(snap.records[0].name, "Music");
}

#[tokio::test]
async fn watch_pushes_full_snapshot_on_add() {
  let s = store().await;
  let p = principal(&s, "alice@example.com").await;

  let mut feed = s.watch_records(p.principal_id).await.unwrap();
  let seed = feed.snapshot();
  assert!(seed.records.is_empty());

  s.add_record(record_input(p.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();

  let snap = feed.wait_newer(seed.seq).await.unwrap();
  assert_eq!(snap.records.len(), 1);
  assert_eq!(snap.records[0].name, "Music");
  assert!(snap.seq > seed.seq);
}

#[tokio::test]
async fn watch_pushes_full_snapshot_on_remove() {
  let s = store().await;
  let p = principal(&s, "alice@example.com").await;

  let record = s
    .add_record(record_input(p.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();

  let mut feed = s.watch_records(p.principal_id).await.unwrap();
  let seed = feed.snapshot();
  assert_eq!(seed.records.len(), 1);

  s.remove_record(record.record_id).await.unwrap();

  let snap = feed.wait_newer(seed.seq).await.unwrap();
  assert!(snap.records.is_empty());
}

#[tokio::test]
async fn feeds_are_independent_per_owner() {
  let s = store().await;
  let alice = principal(&s, "alice@example.com").await;
  let bob = principal(&s, "bob@example.com").await;

  let alice_feed = s.watch_records(alice.principal_id).await.unwrap();
  let mut bob_feed = s.watch_records(bob.principal_id).await.unwrap();
  let bob_seed = bob_feed.snapshot();

  // A mutation on Alice's ledger must not show up in Bob's feed.
  s.add_record(record_input(alice.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();

  assert_eq!(bob_feed.snapshot(), bob_seed);
  assert_eq!(alice_feed.snapshot().records.len(), 1);

  s.add_record(record_input(bob.principal_id, "Cloud", 5.0, "2024-02-05"))
    .await
    .unwrap();

  let bob_snap = bob_feed.wait_newer(bob_seed.seq).await.unwrap();
  assert_eq!(bob_snap.records.len(), 1);
  assert_eq!(bob_snap.records[0].name, "Cloud");
}

#[tokio::test]
async fn multiple_subscribers_see_the_same_pushes() {
  let s = store().await;
  let p = principal(&s, "alice@example.com").await;

  let mut first = s.watch_records(p.principal_id).await.unwrap();
  let mut second = s.watch_records(p.principal_id).await.unwrap();
  let seed = second.snapshot();

  s.add_record(record_input(p.principal_id, "Music", 9.99, "2024-01-15"))
    .await
    .unwrap();

  let a = first.wait_newer(seed.seq).await.unwrap();
  let b = second.wait_newer(seed.seq).await.unwrap();
  assert_eq!(a, b);
  assert_eq!(a.records.len(), 1);
}
