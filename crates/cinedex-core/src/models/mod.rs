mod entries;
mod grid;

use std::hash::Hash;

pub use cinedex_api::{CatalogItem, MediaType};
pub use entries::{ContinueWatchingEntry, EntryKey, WatchlistEntry};
pub use grid::GridSize;

/// An item with a stable identity used for de-duplication in lists.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Send + 'static;

    fn key(&self) -> Self::Key;
}

impl Keyed for CatalogItem {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}
