//! Core types and trait definitions for the Subspace subscription ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod due;
pub mod error;
pub mod feed;
pub mod principal;
pub mod record;
pub mod store;

pub use error::{Error, Result};
