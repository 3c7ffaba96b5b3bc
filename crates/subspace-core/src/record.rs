//! Subscription records — the documents of the ledger.
//!
//! A record is created when the user submits the entry form and destroyed
//! by an explicit remove; there is no edit operation. The store is
//! authoritative; any in-memory list is a read-only projection kept in sync
//! through the live feed.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A recurring subscription charge owned by a principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
  pub record_id:  Uuid,
  pub owner_id:   Uuid,
  pub name:       String,
  pub price:      f64,
  /// The calendar date the user supplied. Due evaluation reads only the
  /// day-of-month component.
  pub due_date:   NaiveDate,
  /// Store-assigned creation timestamp; bookkeeping only, never used for
  /// due-date logic.
  pub created_at: DateTime<Utc>,
}

impl SubscriptionRecord {
  /// Day-of-month on which this subscription charges, in `[1, 31]`.
  pub fn due_day(&self) -> u32 {
    self.due_date.day()
  }
}

/// Input to [`LedgerStore::add_record`](crate::store::LedgerStore::add_record).
/// `record_id` and `created_at` are always assigned by the store; they are
/// not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub owner_id: Uuid,
  pub name:     String,
  pub price:    f64,
  pub due_date: NaiveDate,
}

impl NewRecord {
  /// Validated constructor: `name` must be non-empty after trimming and
  /// `price` non-negative and finite.
  pub fn new(
    owner_id: Uuid,
    name: impl Into<String>,
    price: f64,
    due_date: NaiveDate,
  ) -> Result<Self> {
    let name = name.into();
    if name.trim().is_empty() {
      return Err(Error::EmptyName);
    }
    if !price.is_finite() || price < 0.0 {
      return Err(Error::InvalidPrice(price));
    }
    Ok(Self { owner_id, name, price, due_date })
  }
}

/// The raw record-entry form fields, exactly as typed.
///
/// [`parse`](Self::parse) is the submission boundary: it yields a
/// [`NewRecord`] only when every field is present and valid. An invalid
/// draft never reaches the store — submission is a silent no-op.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
  pub name:     String,
  pub price:    String,
  pub due_date: String,
}

impl RecordDraft {
  pub fn parse(&self, owner_id: Uuid) -> Option<NewRecord> {
    let price: f64 = self.price.trim().parse().ok()?;
    let due_date =
      NaiveDate::parse_from_str(self.due_date.trim(), "%Y-%m-%d").ok()?;
    NewRecord::new(owner_id, self.name.trim(), price, due_date).ok()
  }

  pub fn clear(&mut self) {
    self.name.clear();
    self.price.clear();
    self.due_date.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn new_record_rejects_empty_name() {
    let err =
      NewRecord::new(Uuid::new_v4(), "   ", 4.99, date("2024-01-15")).unwrap_err();
    assert!(matches!(err, Error::EmptyName));
  }

  #[test]
  fn new_record_rejects_negative_and_non_finite_price() {
    let owner = Uuid::new_v4();
    assert!(matches!(
      NewRecord::new(owner, "Music", -1.0, date("2024-01-15")),
      Err(Error::InvalidPrice(_))
    ));
    assert!(matches!(
      NewRecord::new(owner, "Music", f64::NAN, date("2024-01-15")),
      Err(Error::InvalidPrice(_))
    ));
  }

  #[test]
  fn draft_parses_only_when_complete() {
    let owner = Uuid::new_v4();

    let complete = RecordDraft {
      name:     "Streaming".into(),
      price:    "12.50".into(),
      due_date: "2024-03-07".into(),
    };
    let record = complete.parse(owner).unwrap();
    assert_eq!(record.name, "Streaming");
    assert_eq!(record.price, 12.50);
    assert_eq!(record.due_date, date("2024-03-07"));

    for broken in [
      RecordDraft { name: String::new(), ..complete.clone() },
      RecordDraft { price: "abc".into(), ..complete.clone() },
      RecordDraft { price: "-3".into(), ..complete.clone() },
      RecordDraft { due_date: "soon".into(), ..complete.clone() },
      RecordDraft::default(),
    ] {
      assert!(broken.parse(owner).is_none(), "accepted {broken:?}");
    }
  }

  #[test]
  fn due_day_reads_day_component_only() {
    let record = SubscriptionRecord {
      record_id:  Uuid::new_v4(),
      owner_id:   Uuid::new_v4(),
      name:       "Cloud".into(),
      price:      3.0,
      due_date:   date("2019-11-28"),
      created_at: chrono::Utc::now(),
    };
    assert_eq!(record.due_day(), 28);
  }
}
