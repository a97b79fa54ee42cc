//! SQL schema for the campus SQLite store.
//!
//! Executed once at connection startup. The schema version is recorded in
//! `PRAGMA user_version`; future migrations will be gated on it.
//!
//! Timestamps are fixed-width RFC 3339 UTC strings with second precision, so
//! text comparison on them is chronological comparison.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id             TEXT PRIMARY KEY,
    role           TEXT NOT NULL DEFAULT 'student',
    faculty        TEXT,
    year           INTEGER CHECK (year BETWEEN 1 AND 10),
    faculty_public INTEGER NOT NULL DEFAULT 0,
    year_public    INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

-- Only the SHA-256 of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    token_hash TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS threads (
    id                TEXT PRIMARY KEY,
    author_id         TEXT NOT NULL,
    title             TEXT NOT NULL,
    body              TEXT NOT NULL DEFAULT '',
    tags              TEXT NOT NULL DEFAULT '[]',   -- JSON array of {key, value}
    up_count          INTEGER NOT NULL DEFAULT 0 CHECK (up_count >= 0),
    save_count        INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    solved_comment_id TEXT,
    created_at        TEXT NOT NULL,
    last_activity_at  TEXT NOT NULL,
    deleted_at        TEXT
);

CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY,
    thread_id  TEXT NOT NULL REFERENCES threads(id),
    author_id  TEXT NOT NULL,
    body       TEXT NOT NULL,
    up_count   INTEGER NOT NULL DEFAULT 0 CHECK (up_count >= 0),
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

-- One row per (user, target, kind); counters on the target mirror the rows.
CREATE TABLE IF NOT EXISTS reactions (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    target_type TEXT NOT NULL CHECK (target_type IN ('thread', 'comment')),
    target_id   TEXT NOT NULL,
    kind        TEXT NOT NULL CHECK (kind IN ('up', 'save')),
    created_at  TEXT NOT NULL,
    UNIQUE (user_id, target_type, target_id, kind),
    CHECK  (kind = 'up' OR target_type = 'thread')
);

CREATE INDEX IF NOT EXISTS threads_newest_idx
    ON threads(created_at DESC, id DESC) WHERE deleted_at IS NULL;
CREATE INDEX IF NOT EXISTS comments_thread_idx
    ON comments(thread_id, created_at, id);
CREATE INDEX IF NOT EXISTS reactions_target_idx
    ON reactions(target_type, target_id, kind);
CREATE INDEX IF NOT EXISTS sessions_user_idx ON sessions(user_id);

PRAGMA user_version = 1;
";
