//! Write-once lookup memo.
//!
//! The memo keeps three independent mappings (search results, album track
//! listings, track features) in memory, loaded once from a
//! [`MemoStorage`] when the store is opened. Every miss adds an entry and
//! marks its kind dirty; [`MemoStore::flush`] writes a kind back only if
//! it is dirty. Entries never expire and are never evicted.
//!
//! Storage trouble never reaches the caller: a kind that fails to load
//! starts empty, and a failed write is logged and the kind stays dirty.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use watsong_core::{Feel, InMemoryStorage, MemoKind, MemoStorage};

use crate::provider::{AlbumCandidate, TrackStub};

/// One typed mapping plus its dirty flag.
#[derive(Debug)]
pub struct MemoTable<V> {
    kind: MemoKind,
    entries: HashMap<String, V>,
    dirty: bool,
}

impl<V> MemoTable<V>
where
    V: Serialize + DeserializeOwned,
{
    fn empty(kind: MemoKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            dirty: false,
        }
    }

    fn load(kind: MemoKind, storage: &dyn MemoStorage) -> Self {
        let raw = match storage.load(kind) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Could not load {} memo, starting empty: {}", kind, e);
                return Self::empty(kind);
            }
        };

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_str(&value) {
                Ok(decoded) => {
                    entries.insert(key, decoded);
                }
                Err(e) => {
                    log::warn!("Skipping undecodable {} memo entry {}: {}", kind, key, e);
                }
            }
        }
        log::debug!("Loaded {} {} memo entries", entries.len(), kind);

        Self {
            kind,
            entries,
            dirty: false,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Record a fetched value and mark the kind dirty.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
        self.dirty = true;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn flush(&mut self, storage: &dyn MemoStorage) -> bool {
        if !self.dirty {
            return false;
        }

        let mut encoded = HashMap::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match serde_json::to_string(value) {
                Ok(json) => {
                    encoded.insert(key.clone(), json);
                }
                Err(e) => {
                    log::error!("Could not encode {} memo entry {}: {}", self.kind, key, e);
                    return false;
                }
            }
        }

        match storage.save(self.kind, &encoded) {
            Ok(()) => {
                log::info!("Saved {} {} memo entries", encoded.len(), self.kind);
                self.dirty = false;
                true
            }
            Err(e) => {
                log::error!(
                    "Error saving {} memo ({} entries): {}",
                    self.kind,
                    encoded.len(),
                    e
                );
                false
            }
        }
    }
}

/// Handle to the lookup memo. Open one per process and pass it to every
/// resolver and annotator call.
pub struct MemoStore {
    storage: Box<dyn MemoStorage + Send>,
    pub search: MemoTable<Vec<AlbumCandidate>>,
    pub tracks: MemoTable<Vec<TrackStub>>,
    pub features: MemoTable<Feel>,
}

impl fmt::Debug for MemoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoStore")
            .field("search", &self.search.len())
            .field("tracks", &self.tracks.len())
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}

impl MemoStore {
    /// Load every kind from `storage`.
    pub fn open(storage: impl MemoStorage + Send + 'static) -> Self {
        let storage: Box<dyn MemoStorage + Send> = Box::new(storage);
        let search = MemoTable::load(MemoKind::Search, storage.as_ref());
        let tracks = MemoTable::load(MemoKind::Tracks, storage.as_ref());
        let features = MemoTable::load(MemoKind::Features, storage.as_ref());
        Self {
            storage,
            search,
            tracks,
            features,
        }
    }

    /// A memo backed by fresh in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(InMemoryStorage::new())
    }

    #[must_use]
    pub const fn is_dirty(&self, kind: MemoKind) -> bool {
        match kind {
            MemoKind::Search => self.search.is_dirty(),
            MemoKind::Tracks => self.tracks.is_dirty(),
            MemoKind::Features => self.features.is_dirty(),
        }
    }

    #[must_use]
    pub fn len(&self, kind: MemoKind) -> usize {
        match kind {
            MemoKind::Search => self.search.len(),
            MemoKind::Tracks => self.tracks.len(),
            MemoKind::Features => self.features.len(),
        }
    }

    /// Persist the full mapping of `kind` if it changed since the last
    /// successful flush. Returns whether anything was written.
    pub fn flush(&mut self, kind: MemoKind) -> bool {
        let storage = self.storage.as_ref();
        match kind {
            MemoKind::Search => self.search.flush(storage),
            MemoKind::Tracks => self.tracks.flush(storage),
            MemoKind::Features => self.features.flush(storage),
        }
    }

    /// Flush every kind; `true` if any kind was written.
    pub fn flush_all(&mut self) -> bool {
        MemoKind::ALL
            .iter()
            .fold(false, |written, &kind| self.flush(kind) || written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> AlbumCandidate {
        AlbumCandidate {
            id: id.to_string(),
            name: format!("Album {id}"),
            primary_artist: None,
        }
    }

    #[test]
    fn test_open_on_empty_storage() {
        let memo = MemoStore::in_memory();
        for kind in MemoKind::ALL {
            assert_eq!(memo.len(kind), 0);
            assert!(!memo.is_dirty(kind));
        }
    }

    #[test]
    fn test_insert_marks_only_its_kind_dirty() {
        let mut memo = MemoStore::in_memory();
        memo.search.insert("abbey road", vec![candidate("a1")]);

        assert!(memo.is_dirty(MemoKind::Search));
        assert!(!memo.is_dirty(MemoKind::Tracks));
        assert!(!memo.is_dirty(MemoKind::Features));
        assert_eq!(memo.search.get("abbey road").unwrap()[0].id, "a1");
        assert!(memo.search.contains("abbey road"));
    }

    #[test]
    fn test_flush_writes_only_dirty_kinds() {
        let storage = InMemoryStorage::new();
        let mut memo = MemoStore::open(storage.clone());
        memo.features.insert("spotify:track:1", Feel::default());

        assert!(memo.flush_all());
        assert_eq!(storage.save_count(MemoKind::Features), 1);
        assert_eq!(storage.save_count(MemoKind::Search), 0);
        assert_eq!(storage.save_count(MemoKind::Tracks), 0);
        assert!(!memo.is_dirty(MemoKind::Features));

        // Nothing changed, so nothing is written.
        assert!(!memo.flush(MemoKind::Features));
        assert_eq!(storage.save_count(MemoKind::Features), 1);
    }

    #[test]
    fn test_reopen_sees_flushed_entries() {
        let storage = InMemoryStorage::new();
        {
            let mut memo = MemoStore::open(storage.clone());
            memo.tracks.insert(
                "album-1",
                vec![TrackStub {
                    title: "Come Together".to_string(),
                    uri: "spotify:track:ct".to_string(),
                    artists: vec!["The Beatles".to_string()],
                }],
            );
            memo.flush(MemoKind::Tracks);
        }

        let memo = MemoStore::open(storage);
        assert_eq!(memo.tracks.get("album-1").unwrap()[0].title, "Come Together");
        assert!(!memo.is_dirty(MemoKind::Tracks));
    }

    #[test]
    fn test_load_failure_starts_empty() {
        let storage = InMemoryStorage::new();
        storage
            .save(
                MemoKind::Search,
                &HashMap::from([("q".to_string(), "[]".to_string())]),
            )
            .unwrap();
        storage.fail_loads(true);

        let memo = MemoStore::open(storage);
        assert_eq!(memo.len(MemoKind::Search), 0);
    }

    #[test]
    fn test_save_failure_is_swallowed_and_stays_dirty() {
        let storage = InMemoryStorage::new();
        let mut memo = MemoStore::open(storage.clone());
        memo.search.insert("q", vec![candidate("a")]);
        storage.fail_saves(true);

        assert!(!memo.flush(MemoKind::Search));
        assert!(memo.is_dirty(MemoKind::Search));
        // In-memory contents are untouched.
        assert_eq!(memo.search.get("q").unwrap().len(), 1);

        storage.fail_saves(false);
        assert!(memo.flush(MemoKind::Search));
        assert_eq!(storage.save_count(MemoKind::Search), 1);
    }

    #[test]
    fn test_undecodable_entries_are_skipped() {
        let storage = InMemoryStorage::new();
        storage
            .save(
                MemoKind::Features,
                &HashMap::from([
                    (
                        "good".to_string(),
                        r#"{"energy":0.1,"lyrics":0.1,"dance":0.1,"valence":0.1}"#.to_string(),
                    ),
                    (
                        "negative".to_string(),
                        r#"{"energy":-1.0,"lyrics":0.1,"dance":0.1,"valence":0.1}"#.to_string(),
                    ),
                    ("garbage".to_string(), "not json".to_string()),
                ]),
            )
            .unwrap();

        let memo = MemoStore::open(storage);
        assert_eq!(memo.features.len(), 1);
        assert!(memo.features.contains("good"));
    }
}
