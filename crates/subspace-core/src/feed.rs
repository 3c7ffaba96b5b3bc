//! Live record feed — cancellable full-snapshot subscription.
//!
//! Every emission is a full replacement of the owner's record list, never a
//! delta, matching the store's latest consistent state at publish time.
//! Dropping a [`RecordFeed`] unsubscribes; once every feed for an owner is
//! dropped the publishing side may discard the channel.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::record::SubscriptionRecord;

/// One emission of the live feed: the owner's complete record list as of a
/// store-side sequence number. `seq` strictly increases per owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
  pub seq:     u64,
  pub records: Vec<SubscriptionRecord>,
}

/// Consumer handle on an owner's live record feed.
///
/// The feed is seeded with the snapshot current at subscription time, so
/// [`snapshot`](Self::snapshot) never observes an uninitialised state.
pub struct RecordFeed {
  rx: watch::Receiver<RecordSnapshot>,
}

impl RecordFeed {
  pub fn new(rx: watch::Receiver<RecordSnapshot>) -> Self {
    Self { rx }
  }

  /// The latest published snapshot.
  pub fn snapshot(&self) -> RecordSnapshot {
    self.rx.borrow().clone()
  }

  /// Suspend until a snapshot with a sequence number greater than `seq` is
  /// published, then return it. Returns `None` once the publishing side has
  /// gone away.
  pub async fn wait_newer(&mut self, seq: u64) -> Option<RecordSnapshot> {
    self
      .rx
      .wait_for(|snap| snap.seq > seq)
      .await
      .ok()
      .map(|snap| snap.clone())
  }
}
