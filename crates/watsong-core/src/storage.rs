//! Durable storage for the lookup memo.
//!
//! Storage works on whole mappings: a kind is loaded all at once at start
//! and saved all at once when it has changed. Values are opaque JSON text;
//! typing them is the memo's job.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};

/// The three independent memo mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoKind {
    /// Search query to ranked album candidates.
    Search,
    /// Album id to track listing.
    Tracks,
    /// Track URI to feel.
    Features,
}

impl MemoKind {
    pub const ALL: [Self; 3] = [Self::Search, Self::Tracks, Self::Features];

    /// Name used as the storage key for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Tracks => "tracks",
            Self::Features => "features",
        }
    }
}

impl fmt::Display for MemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind load/save of an entire mapping.
pub trait MemoStorage {
    /// Load every entry of `kind`. A kind that was never saved loads empty.
    fn load(&self, kind: MemoKind) -> Result<HashMap<String, String>>;

    /// Replace the stored mapping of `kind` with `entries`.
    fn save(&self, kind: MemoKind, entries: &HashMap<String, String>) -> Result<()>;
}

impl<T: MemoStorage + ?Sized> MemoStorage for Box<T> {
    fn load(&self, kind: MemoKind) -> Result<HashMap<String, String>> {
        (**self).load(kind)
    }

    fn save(&self, kind: MemoKind, entries: &HashMap<String, String>) -> Result<()> {
        (**self).save(kind, entries)
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    mappings: HashMap<MemoKind, HashMap<String, String>>,
    saves: HashMap<MemoKind, usize>,
    fail_loads: bool,
    fail_saves: bool,
}

/// Process-local storage, mainly for tests.
///
/// Clones share the same state, so a test can hand one clone to a memo
/// and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `load` fail.
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Make every subsequent `save` fail.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    /// How many successful saves `kind` has seen.
    #[must_use]
    pub fn save_count(&self, kind: MemoKind) -> usize {
        self.lock().saves.get(&kind).copied().unwrap_or(0)
    }

    /// Number of stored entries for `kind`.
    #[must_use]
    pub fn len(&self, kind: MemoKind) -> usize {
        self.lock().mappings.get(&kind).map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, kind: MemoKind) -> bool {
        self.len(kind) == 0
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryState> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MemoStorage for InMemoryStorage {
    fn load(&self, kind: MemoKind) -> Result<HashMap<String, String>> {
        let state = self.lock();
        if state.fail_loads {
            return Err(Error::Io(std::io::Error::other(format!(
                "in-memory load of {kind} disabled"
            ))));
        }
        Ok(state.mappings.get(&kind).cloned().unwrap_or_default())
    }

    fn save(&self, kind: MemoKind, entries: &HashMap<String, String>) -> Result<()> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(Error::Io(std::io::Error::other(format!(
                "in-memory save of {kind} disabled"
            ))));
        }
        state.mappings.insert(kind, entries.clone());
        *state.saves.entry(kind).or_insert(0) += 1;
        Ok(())
    }
}
