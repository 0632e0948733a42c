//! SQL schema for the Socialize SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id         TEXT PRIMARY KEY,
    handle          TEXT NOT NULL COLLATE NOCASE UNIQUE,
    display_name    TEXT NOT NULL,
    email           TEXT NOT NULL COLLATE NOCASE UNIQUE,
    password_hash   TEXT NOT NULL,
    avatar          TEXT,
    bio             TEXT NOT NULL DEFAULT '',
    follower_count  INTEGER NOT NULL DEFAULT 0 CHECK (follower_count >= 0),
    following_count INTEGER NOT NULL DEFAULT 0 CHECK (following_count >= 0),
    created_at      TEXT NOT NULL    -- RFC 3339 UTC, microseconds
);

-- like_count and comment_count cache the reactions and comments tables.
CREATE TABLE IF NOT EXISTS posts (
    post_id       TEXT PRIMARY KEY,
    author_id     TEXT NOT NULL REFERENCES users(user_id),
    content       TEXT NOT NULL,
    image_ref     TEXT,
    like_count    INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    comment_count INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    post_id    TEXT NOT NULL REFERENCES posts(post_id),
    author_id  TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT NOT NULL,
    like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    created_at TEXT NOT NULL
);

-- The reaction ledger. A row means liked; unlike deletes it.
CREATE TABLE IF NOT EXISTS reactions (
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    target_type TEXT NOT NULL CHECK (target_type IN ('post', 'comment')),
    target_id   TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (user_id, target_type, target_id)
);

-- dedup_key is set only for like kinds; NULLs never collide.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    recipient_id    TEXT NOT NULL REFERENCES users(user_id),
    sender_id       TEXT NOT NULL REFERENCES users(user_id),
    kind            TEXT NOT NULL,
    post_id         TEXT,
    comment_id      TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    dedup_key       TEXT UNIQUE
);

CREATE INDEX IF NOT EXISTS posts_feed_idx          ON posts(created_at, post_id);
CREATE INDEX IF NOT EXISTS posts_author_idx        ON posts(author_id, created_at);
CREATE INDEX IF NOT EXISTS comments_post_idx       ON comments(post_id, created_at);
CREATE INDEX IF NOT EXISTS reactions_target_idx    ON reactions(target_type, target_id);
CREATE INDEX IF NOT EXISTS notifications_inbox_idx ON notifications(recipient_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_post_idx  ON notifications(post_id);
CREATE INDEX IF NOT EXISTS notifications_cmt_idx   ON notifications(comment_id);

PRAGMA user_version = 1;
";
