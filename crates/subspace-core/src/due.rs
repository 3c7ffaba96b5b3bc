//! Due-payment evaluation — the computed read model of the ledger.
//!
//! Evaluation compares day-of-month only: a record counts as due while its
//! stored day-of-month has not yet passed in the current month. Month and
//! year are ignored on both sides of the comparison, and the rendered due
//! date is rebuilt from the current month. Not timezone-aware.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::SubscriptionRecord;

/// Aggregate of the records still due this month — derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuePaymentSummary {
  pub count: usize,
  pub total: f64,
  /// The due records themselves, in input order, for display.
  pub due:   Vec<SubscriptionRecord>,
}

/// Evaluate which records are still due given today's day-of-month.
///
/// A record is due iff `due_day >= today_day` (inclusive). Pure: identical
/// inputs yield identical output.
pub fn evaluate_due_payments(
  records: &[SubscriptionRecord],
  today_day: u32,
) -> DuePaymentSummary {
  let due: Vec<SubscriptionRecord> = records
    .iter()
    .filter(|r| r.due_day() >= today_day)
    .cloned()
    .collect();

  DuePaymentSummary {
    count: due.len(),
    total: due.iter().map(|r| r.price).sum(),
    due,
  }
}

/// Render the date a record next charges, reconstructed from *today's* year
/// and month plus the record's stored day-of-month, e.g. "January 15, 2024".
///
/// A stored day past the end of the current month rolls into the following
/// month (day 31 in April renders as May 1).
pub fn format_due_date(record: &SubscriptionRecord, today: NaiveDate) -> String {
  let day = record.due_day();
  let date = NaiveDate::from_ymd_opt(today.year(), today.month(), day)
    .unwrap_or_else(|| month_rollover(today, day));
  date.format("%B %-d, %Y").to_string()
}

/// Land `day` past the end of `today`'s month on the corresponding day of
/// the following month.
fn month_rollover(today: NaiveDate, day: u32) -> NaiveDate {
  let (year, month) = if today.month() == 12 {
    (today.year() + 1, 1)
  } else {
    (today.year(), today.month() + 1)
  };
  let first_next = NaiveDate::from_ymd_opt(year, month, 1)
    .expect("first of month is always valid");
  let first_this = today.with_day(1).expect("day 1 is always valid");
  let days_in_month = (first_next - first_this).num_days() as u32;

  first_next + Days::new(u64::from(day - days_in_month - 1))
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn record(name: &str, price: f64, due_date: &str) -> SubscriptionRecord {
    SubscriptionRecord {
      record_id:  Uuid::new_v4(),
      owner_id:   Uuid::new_v4(),
      name:       name.into(),
      price,
      due_date:   date(due_date),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn counts_and_totals_records_due_on_or_after_today() {
    let records = vec![
      record("A", 9.99, "2024-01-15"),
      record("B", 5.0, "2024-02-05"),
    ];

    let summary = evaluate_due_payments(&records, 10);
    assert_eq!(summary.count, 1);
    assert_eq!(summary.total, 9.99);
    assert_eq!(summary.due.len(), 1);
    assert_eq!(summary.due[0].name, "A");
  }

  #[test]
  fn empty_record_set_yields_zero_summary() {
    let summary = evaluate_due_payments(&[], 17);
    assert_eq!(summary.count, 0);
    assert_eq!(summary.total, 0.0);
    assert!(summary.due.is_empty());
  }

  #[test]
  fn due_day_boundary_is_inclusive() {
    let records = vec![
      record("today", 1.0, "2024-06-10"),
      record("yesterday", 1.0, "2024-06-09"),
    ];

    let summary = evaluate_due_payments(&records, 10);
    assert_eq!(summary.count, 1);
    assert_eq!(summary.due[0].name, "today");
  }

  #[test]
  fn ignores_month_and_year_of_the_stored_date() {
    // A record dated years ago in another month is still due when its
    // day-of-month has not yet passed.
    let records = vec![record("old", 2.5, "2019-12-20")];
    let summary = evaluate_due_payments(&records, 10);
    assert_eq!(summary.count, 1);
  }

  #[test]
  fn evaluation_is_pure() {
    let records = vec![
      record("A", 9.99, "2024-01-15"),
      record("B", 5.0, "2024-02-05"),
    ];

    let first = evaluate_due_payments(&records, 3);
    let second = evaluate_due_payments(&records, 3);
    assert_eq!(first, second);
  }

  #[test]
  fn sums_prices_of_all_due_records() {
    let records = vec![
      record("A", 10.0, "2024-01-20"),
      record("B", 2.5, "2024-05-25"),
      record("C", 7.0, "2024-09-02"),
    ];

    let summary = evaluate_due_payments(&records, 15);
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total, 12.5);
  }

  #[test]
  fn formats_due_date_in_the_current_month() {
    let r = record("A", 9.99, "2024-01-15");
    assert_eq!(format_due_date(&r, date("2024-03-10")), "March 15, 2024");
  }

  #[test]
  fn format_uses_current_year_and_month_not_the_stored_ones() {
    let r = record("B", 5.0, "2022-02-05");
    assert_eq!(format_due_date(&r, date("2024-11-28")), "November 5, 2024");
  }

  #[test]
  fn format_rolls_overflowing_days_into_the_next_month() {
    let r = record("C", 3.0, "2024-01-31");
    // April has 30 days: day 31 lands on May 1.
    assert_eq!(format_due_date(&r, date("2024-04-10")), "May 1, 2024");
    // February 2023 has 28 days: day 31 lands on March 3.
    assert_eq!(format_due_date(&r, date("2023-02-14")), "March 3, 2023");
  }

  #[test]
  fn format_rolls_november_overflow_into_december() {
    let r = record("D", 3.0, "2024-01-31");
    // November has 30 days: day 31 lands on December 1.
    assert_eq!(format_due_date(&r, date("2024-11-11")), "December 1, 2024");
  }
}
