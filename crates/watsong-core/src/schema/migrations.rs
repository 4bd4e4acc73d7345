/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Lookup memo: one row per (kind, key). Values are JSON.
CREATE TABLE IF NOT EXISTS memo_entries (
    kind TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (kind, key)
);

CREATE INDEX IF NOT EXISTS idx_memo_entries_kind ON memo_entries(kind);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "memo_entries",
    sql: MIGRATION_001,
}];
