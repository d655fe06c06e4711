use std::collections::HashSet;

use chrono::Utc;

use cinedex_api::{CatalogItem, MediaType};

use super::{discard, load_collection, persist_collection, SharedStore};
use crate::models::{EntryKey, WatchlistEntry};

pub const WATCHLIST_KEY: &str = "watchlist";

/// Saved titles, in the order they were added.
///
/// Keyed by `(id, media type)`: adding a title that is already present is a
/// no-op and never duplicates it.
pub struct Watchlist {
    store: SharedStore,
    entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    /// Load the persisted list. Duplicate keys in the stored blob keep their
    /// first occurrence.
    pub fn hydrate(store: SharedStore) -> Self {
        let mut seen = HashSet::new();
        let entries: Vec<WatchlistEntry> = load_collection(store.as_ref(), WATCHLIST_KEY)
            .into_iter()
            .filter(|e: &WatchlistEntry| seen.insert(e.key()))
            .collect();
        tracing::debug!(count = entries.len(), "Hydrated watchlist");
        Self { store, entries }
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: EntryKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }

    pub fn contains(&self, id: u64, media_type: MediaType) -> bool {
        self.position(EntryKey::new(id, media_type)).is_some()
    }

    pub fn is_in_watchlist(&self, item: &CatalogItem) -> bool {
        self.contains(item.id, item.media_type)
    }

    /// Append the entry, stamped with the current time. Returns `false` when
    /// the key is already present.
    pub fn add(&mut self, mut entry: WatchlistEntry) -> bool {
        if self.position(entry.key()).is_some() {
            return false;
        }
        entry.added_at = Utc::now();
        tracing::info!(key = %entry.key(), title = %entry.title, "Added to watchlist");
        self.entries.push(entry);
        self.persist();
        true
    }

    pub fn add_item(&mut self, item: &CatalogItem) -> bool {
        self.add(WatchlistEntry::from_item(item))
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, id: u64, media_type: MediaType) -> bool {
        let key = EntryKey::new(id, media_type);
        let before = self.entries.len();
        self.entries.retain(|e| e.key() != key);
        let removed = self.entries.len() != before;
        if removed {
            tracing::info!(%key, "Removed from watchlist");
        }
        self.persist();
        removed
    }

    /// Add the item if absent, remove it otherwise. Returns whether the item
    /// is in the watchlist afterwards.
    pub fn toggle(&mut self, item: &CatalogItem) -> bool {
        if self.is_in_watchlist(item) {
            self.remove(item.id, item.media_type);
            false
        } else {
            self.add_item(item)
        }
    }

    /// Empty the list and delete the persisted key.
    pub fn clear(&mut self) {
        self.entries.clear();
        discard(self.store.as_ref(), WATCHLIST_KEY);
    }

    fn persist(&self) {
        persist_collection(self.store.as_ref(), WATCHLIST_KEY, &self.entries);
    }
}
