//! User preferences persisted in the local key-value medium.
//!
//! Each collection is hydrated once when its store is created and fully
//! re-serialized (JSON array of records) on every mutation. Storage
//! failures never reach the caller: a missing, unreadable or corrupted
//! blob hydrates as an empty collection, and a failed write leaves the
//! in-memory state updated. Both cases are logged.

mod continue_watching;
mod grid_size;
mod watchlist;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::KeyValueStore;

pub use continue_watching::{ContinueWatching, CONTINUE_WATCHING_KEY, CONTINUE_WATCHING_LIMIT};
pub use grid_size::GridSizePreference;
pub use watchlist::{Watchlist, WATCHLIST_KEY};

/// Shared handle to the persistence medium.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Both persisted collections, hydrated from one medium.
pub struct Preferences {
    pub watchlist: Watchlist,
    pub continue_watching: ContinueWatching,
}

impl Preferences {
    pub fn hydrate(store: SharedStore) -> Self {
        Self {
            watchlist: Watchlist::hydrate(Arc::clone(&store)),
            continue_watching: ContinueWatching::hydrate(store),
        }
    }
}

fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    match store.get(key) {
        Ok(Some(blob)) => match serde_json::from_str(&blob) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(key, error = %e, "Corrupted persisted collection, starting empty");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to read persisted collection, starting empty");
            Vec::new()
        }
    }
}

fn persist_collection<T: Serialize>(store: &dyn KeyValueStore, key: &str, items: &[T]) {
    let blob = match serde_json::to_string(items) {
        Ok(blob) => blob,
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to serialize collection");
            return;
        }
    };
    if let Err(e) = store.set(key, &blob) {
        tracing::error!(key, error = %e, "Failed to persist collection");
    }
}

fn discard(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::error!(key, error = %e, "Failed to remove persisted collection");
    }
}
