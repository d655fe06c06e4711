use std::collections::HashSet;

use chrono::Utc;

use cinedex_api::MediaType;

use super::{discard, load_collection, persist_collection, SharedStore};
use crate::models::{ContinueWatchingEntry, EntryKey};

pub const CONTINUE_WATCHING_KEY: &str = "continueWatching";

/// Most resume points kept.
pub const CONTINUE_WATCHING_LIMIT: usize = 20;

/// Resume points, most recently watched first.
///
/// Holds at most one entry per `(id, media type)` and never more than
/// [`CONTINUE_WATCHING_LIMIT`] entries. Each mutation writes the whole list
/// in one call, so the persisted blob always satisfies both bounds.
pub struct ContinueWatching {
    store: SharedStore,
    entries: Vec<ContinueWatchingEntry>,
}

impl ContinueWatching {
    pub fn hydrate(store: SharedStore) -> Self {
        let entries = normalize(load_collection(store.as_ref(), CONTINUE_WATCHING_KEY));
        tracing::debug!(count = entries.len(), "Hydrated continue-watching");
        Self { store, entries }
    }

    pub fn entries(&self) -> &[ContinueWatchingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a watch: any existing entry for the key is replaced and the new
    /// one moves to the front with `last_watched_at` set to now.
    pub fn upsert(&mut self, mut entry: ContinueWatchingEntry) {
        let key = entry.key();
        entry.last_watched_at = Utc::now();
        tracing::info!(
            %key,
            title = %entry.title,
            season = ?entry.season,
            episode = ?entry.episode,
            progress = entry.progress_percent,
            "Recorded continue-watching"
        );
        self.entries.retain(|e| e.key() != key);
        self.entries.insert(0, entry);
        self.entries.truncate(CONTINUE_WATCHING_LIMIT);
        self.persist();
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, id: u64, media_type: MediaType) -> bool {
        let key = EntryKey::new(id, media_type);
        let before = self.entries.len();
        self.entries.retain(|e| e.key() != key);
        self.persist();
        self.entries.len() != before
    }

    /// Empty the list and delete the persisted key.
    pub fn clear(&mut self) {
        self.entries.clear();
        discard(self.store.as_ref(), CONTINUE_WATCHING_KEY);
    }

    pub fn get_progress(&self, id: u64, media_type: MediaType) -> Option<&ContinueWatchingEntry> {
        let key = EntryKey::new(id, media_type);
        self.entries.iter().find(|e| e.key() == key)
    }

    fn persist(&self) {
        persist_collection(self.store.as_ref(), CONTINUE_WATCHING_KEY, &self.entries);
    }
}

/// Drop later duplicates and anything past the limit from a stored list.
fn normalize(entries: Vec<ContinueWatchingEntry>) -> Vec<ContinueWatchingEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.key()))
        .take(CONTINUE_WATCHING_LIMIT)
        .collect()
}
