//! Versioned paste records backed by SQLite.
//!
//! Each paste is a row in `pastes` plus one or more rows in `paste_versions`.
//! Versions are only ever appended; the highest `id` for a key is the latest.
//! Every write runs in a single transaction, so it either lands completely
//! or not at all. Reads go through the reader connection and writes through
//! the writer, so a read in progress never holds up a write.

use std::sync::{Arc, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::db::{Db, DbPool};
use crate::error::PasteError;
use crate::paste::codec::PasteCodec;
use crate::paste::keys;

/// Latest decoded content of a paste together with its history length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestVersion {
    pub content: String,
    pub versions: usize,
}

pub struct PasteStore {
    db: Db,
    codec: Arc<PasteCodec>,
}

impl PasteStore {
    pub fn new(db: Db, codec: Arc<PasteCodec>) -> Self {
        Self { db, codec }
    }

    /// Store `content` under a freshly generated key and return the key.
    ///
    /// Key collisions are not checked: a colliding key appends to the
    /// existing record.
    pub fn create_with_generated_key(&self, content: &str) -> Result<String, PasteError> {
        ensure_content(content)?;
        let key = keys::generate_key();
        self.push_version(&key, content)?;
        Ok(key)
    }

    /// Create the record for `key` on first write, append a version otherwise.
    pub fn create_or_append(&self, key: &str, content: &str) -> Result<(), PasteError> {
        ensure_content(content)?;
        self.push_version(key, content)?;
        Ok(())
    }

    /// Decoded content of the most recent version.
    pub fn get_latest(&self, key: &str) -> Result<String, PasteError> {
        self.latest(key).map(|latest| latest.content)
    }

    /// Latest content plus the number of stored versions, read together.
    pub fn latest(&self, key: &str) -> Result<LatestVersion, PasteError> {
        let row: Option<(String, i64)> = {
            let conn = lock(&self.db.reader)?;
            conn.query_row(
                "SELECT token, (SELECT COUNT(*) FROM paste_versions WHERE paste_key = ?1)
                 FROM paste_versions WHERE paste_key = ?1
                 ORDER BY id DESC LIMIT 1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
        };

        // A record is never created without a version, so no version means no record
        let (token, versions) = row.ok_or_else(|| PasteError::NotFound {
            key: key.to_string(),
        })?;

        let content = self.codec.decode(&token).map_err(|e| {
            tracing::warn!("Failed to decode latest version of paste {}: {}", key, e);
            PasteError::from(e)
        })?;

        Ok(LatestVersion {
            content,
            versions: versions as usize,
        })
    }

    /// Number of versions stored for `key`.
    pub fn version_count(&self, key: &str) -> Result<usize, PasteError> {
        let conn = lock(&self.db.reader)?;
        let count = count_versions(&conn, key)?;
        if count == 0 {
            return Err(PasteError::NotFound {
                key: key.to_string(),
            });
        }
        Ok(count)
    }

    fn push_version(&self, key: &str, content: &str) -> Result<usize, PasteError> {
        let token = self.codec.encode(content);
        let now = Utc::now().to_rfc3339();

        let mut conn = lock(&self.db.writer)?;
        let tx = conn.transaction()?;
        let created = tx.execute(
            "INSERT OR IGNORE INTO pastes (key, created_at) VALUES (?1, ?2)",
            rusqlite::params![key, now],
        )? == 1;
        tx.execute(
            "INSERT INTO paste_versions (paste_key, token, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, token, now],
        )?;
        let count = count_versions(&tx, key)?;
        tx.commit()?;

        if created {
            tracing::debug!("Created paste {}", key);
        } else {
            tracing::debug!("Appended version {} to paste {}", count, key);
        }

        Ok(count)
    }
}

fn lock(pool: &DbPool) -> Result<MutexGuard<'_, Connection>, PasteError> {
    pool.lock()
        .map_err(|e| PasteError::StorageUnavailable(format!("DB lock error: {}", e)))
}

fn ensure_content(content: &str) -> Result<(), PasteError> {
    if content.trim().is_empty() {
        return Err(PasteError::EmptyContent);
    }
    Ok(())
}

fn count_versions(conn: &Connection, key: &str) -> Result<usize, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM paste_versions WHERE paste_key = ?1",
        [key],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::DecodeError;
    use crate::paste::codec::CodecKey;

    fn new_store() -> PasteStore {
        let db = db::open_in_memory().unwrap();
        PasteStore::new(db, Arc::new(PasteCodec::new(&CodecKey::generate())))
    }

    fn raw_tokens(store: &PasteStore, key: &str) -> Vec<String> {
        let conn = store.db.reader.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT token FROM paste_versions WHERE paste_key = ?1 ORDER BY id")
            .unwrap();
        let tokens: Vec<String> = stmt
            .query_map([key], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        tokens
    }

    fn record_count(store: &PasteStore) -> i64 {
        let conn = store.db.reader.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM pastes", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_generated_key_roundtrip() {
        let store = new_store();
        let key = store.create_with_generated_key("hello").unwrap();
        assert_eq!(key.len(), 8);
        assert_eq!(store.get_latest(&key).unwrap(), "hello");
        assert_eq!(store.version_count(&key).unwrap(), 1);
    }

    #[test]
    fn test_append_to_generated_key() {
        let store = new_store();
        let key = store.create_with_generated_key("hello").unwrap();
        store.create_or_append(&key, "hello v2").unwrap();
        assert_eq!(store.get_latest(&key).unwrap(), "hello v2");
        assert_eq!(store.version_count(&key).unwrap(), 2);
    }

    #[test]
    fn test_custom_key_first_write_creates() {
        let store = new_store();
        assert!(matches!(
            store.get_latest("my-custom-id"),
            Err(PasteError::NotFound { .. })
        ));
        store.create_or_append("my-custom-id", "first").unwrap();
        assert_eq!(store.get_latest("my-custom-id").unwrap(), "first");
        assert_eq!(store.version_count("my-custom-id").unwrap(), 1);
    }

    #[test]
    fn test_history_grows_by_two() {
        let store = new_store();
        store.create_or_append("notes", "v1").unwrap();
        let before = store.version_count("notes").unwrap();

        store.create_or_append("notes", "v2").unwrap();
        store.create_or_append("notes", "v3").unwrap();

        assert_eq!(store.version_count("notes").unwrap(), before + 2);
        assert_eq!(store.get_latest("notes").unwrap(), "v3");
    }

    #[test]
    fn test_identical_content_not_deduplicated() {
        let store = new_store();
        store.create_or_append("same", "repeat").unwrap();
        store.create_or_append("same", "repeat").unwrap();
        assert_eq!(store.version_count("same").unwrap(), 2);
    }

    #[test]
    fn test_history_is_preserved_in_order() {
        let store = new_store();
        for content in ["one", "two", "three"] {
            store.create_or_append("ordered", content).unwrap();
        }
        let decoded: Vec<String> = raw_tokens(&store, "ordered")
            .iter()
            .map(|t| store.codec.decode(t).unwrap())
            .collect();
        assert_eq!(decoded, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_content_is_never_stored_in_plaintext() {
        let store = new_store();
        store
            .create_or_append("secret", "correct horse battery staple")
            .unwrap();
        for token in raw_tokens(&store, "secret") {
            assert!(!token.contains("correct horse"));
        }
    }

    #[test]
    fn test_empty_content_rejected_without_write() {
        let store = new_store();
        for empty in ["", "   ", "\n\t  \r\n"] {
            assert!(matches!(
                store.create_with_generated_key(empty),
                Err(PasteError::EmptyContent)
            ));
            assert!(matches!(
                store.create_or_append("blank", empty),
                Err(PasteError::EmptyContent)
            ));
        }
        assert_eq!(record_count(&store), 0);
    }

    #[test]
    fn test_empty_append_leaves_existing_record_untouched() {
        let store = new_store();
        store.create_or_append("keep", "original").unwrap();
        assert!(store.create_or_append("keep", "  ").is_err());
        assert_eq!(store.version_count("keep").unwrap(), 1);
        assert_eq!(store.get_latest("keep").unwrap(), "original");
    }

    #[test]
    fn test_surrounding_whitespace_is_kept() {
        let store = new_store();
        store.create_or_append("ws", "  indented\n").unwrap();
        assert_eq!(store.get_latest("ws").unwrap(), "  indented\n");
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let store = new_store();
        assert!(matches!(
            store.get_latest("never-written"),
            Err(PasteError::NotFound { key }) if key == "never-written"
        ));
        assert!(matches!(
            store.version_count("never-written"),
            Err(PasteError::NotFound { .. })
        ));
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let store = new_store();
        store.create_or_append("Case", "upper").unwrap();
        assert!(store.get_latest("case").is_err());
        assert!(store.get_latest("Cas").is_err());
        assert_eq!(store.get_latest("Case").unwrap(), "upper");
    }

    #[test]
    fn test_wrong_key_surfaces_decode_error() {
        let db = db::open_in_memory().unwrap();
        let writer = PasteStore::new(
            db.clone(),
            Arc::new(PasteCodec::new(&CodecKey::generate())),
        );
        let reader = PasteStore::new(db, Arc::new(PasteCodec::new(&CodecKey::generate())));

        writer.create_or_append("rotated", "written under key A").unwrap();

        assert!(matches!(
            reader.get_latest("rotated"),
            Err(PasteError::Decode(DecodeError::Authentication))
        ));
        // The record is still there; only decoding fails
        assert_eq!(reader.version_count("rotated").unwrap(), 1);
        assert_eq!(
            writer.get_latest("rotated").unwrap(),
            "written under key A"
        );
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let store = new_store();
        store.create_or_append("stable", "same answer").unwrap();
        let first = store.latest("stable").unwrap();
        let second = store.latest("stable").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            LatestVersion {
                content: "same answer".to_string(),
                versions: 1
            }
        );
    }

    #[test]
    fn test_concurrent_appends_all_land() {
        let store = Arc::new(new_store());
        store.create_or_append("busy", "seed").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..5 {
                        store
                            .create_or_append("busy", &format!("writer {} edit {}", i, j))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.version_count("busy").unwrap(), 1 + 8 * 5);
        assert!(store.get_latest("busy").unwrap().starts_with("writer "));
    }

    #[test]
    fn test_poisoned_lock_is_storage_unavailable() {
        let store = Arc::new(new_store());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.db.writer.lock().unwrap();
            panic!("poison the connection lock");
        })
        .join();

        assert!(matches!(
            store.get_latest("anything"),
            Err(PasteError::StorageUnavailable(_))
        ));
        assert!(matches!(
            store.create_or_append("anything", "content"),
            Err(PasteError::StorageUnavailable(_))
        ));
    }

    #[test]
    fn test_write_completes_while_read_is_open() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let db = db::init_db(
            tmp_dir.path().to_str().unwrap(),
            "paste.db",
            std::time::Duration::from_millis(200),
        )
        .unwrap();
        let store = PasteStore::new(db, Arc::new(PasteCodec::new(&CodecKey::generate())));
        store.create_or_append("live", "v1").unwrap();

        let count_sql = "SELECT COUNT(*) FROM paste_versions WHERE paste_key = 'live'";
        {
            let reader = store.db.reader.lock().unwrap();
            reader.execute_batch("BEGIN").unwrap();
            let seen: i64 = reader.query_row(count_sql, [], |row| row.get(0)).unwrap();
            assert_eq!(seen, 1);

            // Reader guard and read snapshot are both still held here
            store.create_or_append("live", "v2").unwrap();

            let snapshot: i64 = reader.query_row(count_sql, [], |row| row.get(0)).unwrap();
            assert_eq!(snapshot, 1);
            reader.execute_batch("COMMIT").unwrap();
        }

        assert_eq!(store.get_latest("live").unwrap(), "v2");
        assert_eq!(store.version_count("live").unwrap(), 2);
    }
}
