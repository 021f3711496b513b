//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `quotes` table (one submitted quote per row, with its vote tallies)
///
/// `AUTOINCREMENT` keeps ids from being reused after the highest row is removed by hand.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    text TEXT NOT NULL,
    comment TEXT NULL,
    submitted_at TEXT NOT NULL, -- YYYY-MM-DD HH:MM:SS, UTC
    source_address TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    vote_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_quotes_submitted_at ON quotes(submitted_at);

CREATE INDEX IF NOT EXISTS idx_quotes_score ON quotes(score);
"#;
