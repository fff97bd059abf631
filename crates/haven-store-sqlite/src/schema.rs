//! SQL schema for the Haven SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- NULL emails never collide, so the pair is only unique when email is set.
CREATE TABLE IF NOT EXISTS trusted_contacts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name          TEXT    NOT NULL,
    email         TEXT,
    phone_number  TEXT,
    priority      INTEGER NOT NULL DEFAULT 1,   -- lower is higher priority
    sos_enabled   INTEGER NOT NULL DEFAULT 1,
    UNIQUE (user_id, email)
);

-- Alerts are insert-only apart from the resolved flag.
CREATE TABLE IF NOT EXISTS safety_alerts (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id              INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    chat_session_id      INTEGER,
    alert_level          TEXT    NOT NULL DEFAULT 'low',
    trigger_description  TEXT    NOT NULL DEFAULT '',
    risk_score           REAL    NOT NULL DEFAULT 0.0,
    resolved             INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT    NOT NULL,   -- ISO 8601 UTC; server-assigned
    CHECK (risk_score >= 0.0 AND risk_score <= 1.0)
);

CREATE INDEX IF NOT EXISTS contacts_user_idx ON trusted_contacts(user_id, priority);
CREATE INDEX IF NOT EXISTS alerts_user_idx   ON safety_alerts(user_id, created_at);

PRAGMA user_version = 1;
";
