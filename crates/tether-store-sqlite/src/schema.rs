//! SQL schema for the Tether SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- AUTOINCREMENT keeps ids monotonic even after rows are removed by hand.
CREATE TABLE IF NOT EXISTS contacts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    phone_number    TEXT,
    email           TEXT,
    linked_id       INTEGER,         -- may name a deleted or missing row
    link_precedence TEXT NOT NULL
                    CHECK (link_precedence IN ('primary', 'secondary')),
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    updated_at      TEXT NOT NULL,
    deleted_at      TEXT,            -- soft delete; NULL while live
    CHECK (link_precedence = 'secondary' OR linked_id IS NULL)
);

CREATE INDEX IF NOT EXISTS contacts_email_idx   ON contacts(email);
CREATE INDEX IF NOT EXISTS contacts_phone_idx   ON contacts(phone_number);
CREATE INDEX IF NOT EXISTS contacts_linked_idx  ON contacts(linked_id);
CREATE INDEX IF NOT EXISTS contacts_created_idx ON contacts(created_at, id);

PRAGMA user_version = 1;
";
