use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Applied in order; progress is tracked in the user_version pragma.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: Pastes and their version history

CREATE TABLE pastes (
    key TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

-- Versions are append-only; id order is version order (oldest first).
CREATE TABLE paste_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    paste_key TEXT NOT NULL,
    token TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (paste_key) REFERENCES pastes(key)
);

CREATE INDEX idx_paste_versions_key ON paste_versions(paste_key, id);
",
    )])
}
