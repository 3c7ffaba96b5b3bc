//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Due dates are stored as
//! `YYYY-MM-DD`. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use subspace_core::{
  principal::Principal,
  record::SubscriptionRecord,
  store::StoredPrincipal,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.hyphenated().to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String {
  d.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub record_id:  String,
  pub owner_id:   String,
  pub name:       String,
  pub price:      f64,
  pub due_date:   String,
  pub created_at: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
      record_id:  decode_uuid(&self.record_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      name:       self.name,
      price:      self.price,
      due_date:   decode_date(&self.due_date)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `principals` row.
pub struct RawPrincipal {
  pub principal_id:  String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawPrincipal {
  pub fn into_stored(self) -> Result<StoredPrincipal> {
    Ok(StoredPrincipal {
      principal:     Principal {
        principal_id: decode_uuid(&self.principal_id)?,
        email:        self.email,
        created_at:   decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}
