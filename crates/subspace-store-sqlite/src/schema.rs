//! SQL schema for the Subspace SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS principals (
    principal_id  TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL    -- ISO 8601 UTC; store-assigned
);

-- Records are created and removed, never updated in place.
CREATE TABLE IF NOT EXISTS records (
    record_id   TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES principals(principal_id),
    name        TEXT NOT NULL,
    price       REAL NOT NULL,
    due_date    TEXT NOT NULL,   -- YYYY-MM-DD as supplied by the owner
    created_at  TEXT NOT NULL    -- ISO 8601 UTC; store-assigned
);

CREATE INDEX IF NOT EXISTS records_owner_idx ON records(owner_id);

PRAGMA user_version = 1;
";
