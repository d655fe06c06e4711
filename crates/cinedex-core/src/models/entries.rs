use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinedex_api::{CatalogItem, MediaType, TitleDetails};

/// Composite identity of a persisted entry: the same numeric id may exist
/// once as a movie and once as a TV show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub id: u64,
    pub media_type: MediaType,
}

impl EntryKey {
    pub fn new(id: u64, media_type: MediaType) -> Self {
        Self { id, media_type }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.media_type, self.id)
    }
}

/// A title the user saved for later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: Option<f32>,
    pub date: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.id, self.media_type)
    }

    /// Snapshot a catalog listing row. `added_at` is stamped again when the
    /// entry is actually added.
    pub fn from_item(item: &CatalogItem) -> Self {
        Self {
            id: item.id,
            media_type: item.media_type,
            title: item.title.clone(),
            poster_path: item.poster_path.clone(),
            rating: item.rating,
            date: item.date.clone(),
            added_at: Utc::now(),
        }
    }

    pub fn from_details(details: &TitleDetails) -> Self {
        Self {
            id: details.id,
            media_type: details.media_type,
            title: details.title.clone(),
            poster_path: details.poster_path.clone(),
            rating: details.rating,
            date: details.date.clone(),
            added_at: Utc::now(),
        }
    }
}

/// Playback resume point for a movie or TV episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWatchingEntry {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub runtime_minutes: u32,
    pub progress_percent: u8,
    pub last_watched_at: DateTime<Utc>,
}

impl ContinueWatchingEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.id, self.media_type)
    }

    /// Minutes already watched, derived from runtime and progress.
    pub fn watched_minutes(&self) -> u64 {
        u64::from(self.runtime_minutes) * u64::from(self.progress_percent.min(100)) / 100
    }
}
