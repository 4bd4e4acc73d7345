use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::storage::{MemoKind, MemoStorage};

use super::migrations::MIGRATIONS;

/// A database connection holding the durable lookup memo.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        // Create migrations table if it doesn't exist
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Memo entries
impl Database {
    /// Count stored entries of one kind.
    pub fn count_memo_entries(&self, kind: MemoKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memo_entries WHERE kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl MemoStorage for Database {
    fn load(&self, kind: MemoKind) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM memo_entries WHERE kind = ?1")?;
        let entries = stmt
            .query_map([kind.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<HashMap<String, String>>>()?;
        Ok(entries)
    }

    fn save(&self, kind: MemoKind, entries: &HashMap<String, String>) -> Result<()> {
        // Whole-mapping replace; a failure part way leaves the previous
        // mapping in place.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM memo_entries WHERE kind = ?1", [kind.as_str()])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO memo_entries (kind, key, value) VALUES (?1, ?2, ?3)",
            )?;
            for (key, value) in entries {
                insert.execute(rusqlite::params![kind.as_str(), key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_load_missing_kind_is_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load(MemoKind::Features).unwrap().is_empty());
        assert_eq!(db.count_memo_entries(MemoKind::Features).unwrap(), 0);
    }

    #[test]
    fn test_memo_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let saved = entries(&[
            ("spotify:track:1", r#"{"energy":0.1}"#),
            ("spotify:track:2", "{}"),
        ]);
        db.save(MemoKind::Features, &saved).unwrap();

        assert_eq!(db.load(MemoKind::Features).unwrap(), saved);
        assert_eq!(db.count_memo_entries(MemoKind::Features).unwrap(), 2);
    }

    #[test]
    fn test_save_replaces_only_its_kind() {
        let db = Database::open_in_memory().unwrap();
        db.save(MemoKind::Search, &entries(&[("q1", "[]"), ("q2", "[]")]))
            .unwrap();
        db.save(MemoKind::Tracks, &entries(&[("album", "[]")])).unwrap();
        db.save(MemoKind::Search, &entries(&[("q3", "[]")])).unwrap();

        let search = db.load(MemoKind::Search).unwrap();
        assert_eq!(search.len(), 1);
        assert!(search.contains_key("q3"));
        assert_eq!(db.count_memo_entries(MemoKind::Tracks).unwrap(), 1);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("memo.db");

        {
            let db = Database::open(&path).unwrap();
            db.save(MemoKind::Tracks, &entries(&[("album-1", "[]")])).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load(MemoKind::Tracks).unwrap(), entries(&[("album-1", "[]")]));
    }
}
