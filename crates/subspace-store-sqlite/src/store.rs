//! [`SqliteStore`] — the SQLite implementation of [`LedgerStore`].

use std::{
  collections::HashMap,
  path::Path,
  sync::{Arc, Mutex},
};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::watch;
use uuid::Uuid;

use subspace_core::{
  feed::{RecordFeed, RecordSnapshot},
  principal::Principal,
  record::{NewRecord, SubscriptionRecord},
  store::{LedgerStore, StoredPrincipal},
};

use crate::{
  Error, Result,
  encode::{
    RawPrincipal, RawRecord, decode_uuid, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Feed registry ───────────────────────────────────────────────────────────

/// Publishing side of one owner's live feed.
///
/// `seq` counts the owner's mutations since the first subscription and
/// advances even while no subscriber is connected, so a reconnecting
/// consumer can tell whether anything changed while it was away. The
/// channel itself is replaced once all receivers have been dropped.
struct OwnerFeed {
  tx:  watch::Sender<RecordSnapshot>,
  seq: u64,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Subspace ledger store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection and the feed registry are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  feeds: Arc<Mutex<HashMap<Uuid, OwnerFeed>>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, feeds: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, feeds: Arc::default() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Query `owner`'s records, oldest first.
  async fn query_records(&self, owner: Uuid) -> Result<Vec<SubscriptionRecord>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, owner_id, name, price, due_date, created_at
           FROM records WHERE owner_id = ?1
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], |row| {
            Ok(RawRecord {
              record_id:  row.get(0)?,
              owner_id:   row.get(1)?,
              name:       row.get(2)?,
              price:      row.get(3)?,
              due_date:   row.get(4)?,
              created_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  /// Publish a fresh snapshot to `owner`'s feed, if anyone is listening.
  ///
  /// The snapshot is re-queried after the mutation so every emission is the
  /// store's latest consistent state. The sequence number advances for
  /// every mutation, listeners or not.
  async fn publish(&self, owner: Uuid) -> Result<()> {
    let my_seq = {
      let mut feeds = self.feeds.lock().expect("feed registry poisoned");
      match feeds.get_mut(&owner) {
        // The owner has never been watched; nothing to maintain.
        None => return Ok(()),
        Some(feed) => {
          feed.seq += 1;
          if feed.tx.is_closed() {
            return Ok(());
          }
          feed.seq
        }
      }
    };

    let records = self.query_records(owner).await?;

    let mut feeds = self.feeds.lock().expect("feed registry poisoned");
    if let Some(feed) = feeds.get(&owner) {
      // A racing publish with a newer sequence number supersedes this one.
      if feed.seq == my_seq {
        let _ = feed.tx.send(RecordSnapshot { seq: my_seq, records });
      }
    }
    Ok(())
  }
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  // ── Principals ────────────────────────────────────────────────────────────

  async fn add_principal(
    &self,
    email: &str,
    password_hash: &str,
  ) -> Result<Principal> {
    // The UNIQUE constraint backs this check; overlapping submissions race
    // and the loser surfaces a database error.
    if self.principal_by_email(email).await?.is_some() {
      return Err(Error::EmailTaken(email.to_string()));
    }

    let principal = Principal {
      principal_id: Uuid::new_v4(),
      email:        email.to_string(),
      created_at:   Utc::now(),
    };

    let id_str    = encode_uuid(principal.principal_id);
    let email_str = principal.email.clone();
    let hash_str  = password_hash.to_string();
    let at_str    = encode_dt(principal.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO principals (principal_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_str, hash_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(principal)
  }

  async fn principal_by_email(&self, email: &str) -> Result<Option<StoredPrincipal>> {
    let email_str = email.to_string();

    let raw: Option<RawPrincipal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT principal_id, email, password_hash, created_at
               FROM principals WHERE email = ?1",
              rusqlite::params![email_str],
              |row| {
                Ok(RawPrincipal {
                  principal_id:  row.get(0)?,
                  email:         row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPrincipal::into_stored).transpose()
  }

  async fn principal_by_id(&self, id: Uuid) -> Result<Option<Principal>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPrincipal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT principal_id, email, password_hash, created_at
               FROM principals WHERE principal_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPrincipal {
                  principal_id:  row.get(0)?,
                  email:         row.get(1)?,
                  password_hash: row.get(2)?,
                  created_at:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawPrincipal::into_stored).transpose()?.map(|s| s.principal))
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn add_record(&self, input: NewRecord) -> Result<SubscriptionRecord> {
    let record = SubscriptionRecord {
      record_id:  Uuid::new_v4(),
      owner_id:   input.owner_id,
      name:       input.name,
      price:      input.price,
      due_date:   input.due_date,
      created_at: Utc::now(),
    };

    let record_id_str  = encode_uuid(record.record_id);
    let owner_id_str   = encode_uuid(record.owner_id);
    let name           = record.name.clone();
    let price          = record.price;
    let due_date_str   = encode_date(record.due_date);
    let created_at_str = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO records (record_id, owner_id, name, price, due_date, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            record_id_str,
            owner_id_str,
            name,
            price,
            due_date_str,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.publish(record.owner_id).await?;
    Ok(record)
  }

  async fn remove_record(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let owner_str: Option<String> = self
      .conn
      .call(move |conn| {
        let owner: Option<String> = conn
          .query_row(
            "SELECT owner_id FROM records WHERE record_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        if owner.is_some() {
          conn.execute(
            "DELETE FROM records WHERE record_id = ?1",
            rusqlite::params![id_str],
          )?;
        }

        Ok(owner)
      })
      .await?;

    let owner_str = owner_str.ok_or(Error::RecordNotFound(id))?;
    let owner = decode_uuid(&owner_str)?;

    self.publish(owner).await?;
    Ok(())
  }

  async fn records_for(&self, owner: Uuid) -> Result<Vec<SubscriptionRecord>> {
    self.query_records(owner).await
  }

  // ── Live feed ─────────────────────────────────────────────────────────────

  async fn watch_records(&self, owner: Uuid) -> Result<RecordFeed> {
    loop {
      let expected_seq = {
        let feeds = self.feeds.lock().expect("feed registry poisoned");
        match feeds.get(&owner) {
          // An open channel is kept current by `publish`.
          Some(feed) if !feed.tx.is_closed() => {
            return Ok(RecordFeed::new(feed.tx.subscribe()));
          }
          Some(feed) => feed.seq,
          None => 0,
        }
      };

      let records = self.query_records(owner).await?;

      let mut feeds = self.feeds.lock().expect("feed registry poisoned");
      match feeds.get_mut(&owner) {
        // Another first subscriber raced us while we were querying.
        Some(feed) if !feed.tx.is_closed() => {
          return Ok(RecordFeed::new(feed.tx.subscribe()));
        }
        Some(feed) => {
          if feed.seq != expected_seq {
            // A mutation landed while we were querying; our snapshot may
            // be stale, so start over.
            continue;
          }
          let (tx, rx) = watch::channel(RecordSnapshot { seq: feed.seq, records });
          feed.tx = tx;
          return Ok(RecordFeed::new(rx));
        }
        None => {
          let (tx, rx) = watch::channel(RecordSnapshot { seq: 1, records });
          feeds.insert(owner, OwnerFeed { tx, seq: 1 });
          return Ok(RecordFeed::new(rx));
        }
      }
    }
  }
}
