//! SQLite backend for the Subspace ledger store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread pool without blocking the async runtime. Live record feeds are
//! served from an in-process watch-channel registry that republishes the
//! owner's full record list after every mutation.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
