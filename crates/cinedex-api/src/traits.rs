//! Trait definitions for paginated catalog services.
//!
//! The TMDB client implements [`CatalogService`]; list engines in
//! `cinedex-core` only depend on this trait, so any upstream with the same
//! pagination semantics can be swapped in.

use std::future::Future;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Kind of catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub const ALL: &[MediaType] = &[Self::Movie, Self::Tv];

    /// Path segment used by the upstream API and the embed player.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single movie or TV show from any catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// `release_date` for movies, `first_air_date` for TV.
    pub date: Option<String>,
    pub rating: Option<f32>,
    pub overview: Option<String>,
    pub genre_ids: Vec<u32>,
}

impl CatalogItem {
    /// Title for display, never empty.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Release or first-air year, if the date parses.
    pub fn year(&self) -> Option<i32> {
        let date = self.date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }

    /// Full poster URL at the given size (`w500`, `original`, ...).
    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path.as_deref().map(|p| image_url(size, p))
    }
}

/// Build a TMDB image CDN URL.
pub fn image_url(size: &str, path: &str) -> String {
    format!("https://image.tmdb.org/t/p/{size}{path}")
}

/// A single page of catalog results.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

/// Full record for one title, as shown on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    /// `release_date` for movies, `first_air_date` for TV.
    pub date: Option<String>,
    pub rating: Option<f32>,
    /// Movie runtime in minutes.
    pub runtime: Option<u32>,
    /// Typical episode runtimes for TV, most common first.
    pub episode_run_time: Vec<u32>,
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: Option<String>,
    pub episode_count: u32,
}

/// Episode list of one TV season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetails {
    pub season_number: u32,
    pub episodes: Vec<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode_number: u32,
    pub name: Option<String>,
    pub runtime: Option<u32>,
    pub air_date: Option<String>,
}

impl SeasonDetails {
    pub fn episode(&self, number: u32) -> Option<&EpisodeSummary> {
        self.episodes.iter().find(|e| e.episode_number == number)
    }
}

/// A paginated listing exposed by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Filterable discovery listing.
    Discover(MediaType),
    Popular(MediaType),
    /// Movies not yet released.
    Upcoming,
    /// TV shows with episodes airing in the next week.
    OnTheAir,
    Search { media_type: MediaType, query: String },
}

impl Endpoint {
    /// REST path relative to the API base.
    pub fn path(&self) -> String {
        match self {
            Self::Discover(m) => format!("discover/{m}"),
            Self::Popular(m) => format!("{m}/popular"),
            Self::Upcoming => "movie/upcoming".into(),
            Self::OnTheAir => "tv/on_the_air".into(),
            Self::Search { media_type, .. } => format!("search/{media_type}"),
        }
    }

    /// Media type of the items this endpoint returns.
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Discover(m) | Self::Popular(m) => *m,
            Self::Upcoming => MediaType::Movie,
            Self::OnTheAir => MediaType::Tv,
            Self::Search { media_type, .. } => *media_type,
        }
    }

    /// Whether discovery filters (sort, genres, dates) are honoured.
    pub fn accepts_filters(&self) -> bool {
        matches!(self, Self::Discover(_))
    }
}

/// A paginated catalog service interface.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch one page of an endpoint. `query` carries extra query pairs
    /// (filters); `page` starts at 1.
    fn fetch_page(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
        page: u32,
    ) -> impl Future<Output = Result<CatalogPage, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(date: Option<&str>) -> CatalogItem {
        CatalogItem {
            id: 1,
            media_type: MediaType::Movie,
            title: String::new(),
            poster_path: Some("/p.jpg".into()),
            backdrop_path: None,
            date: date.map(Into::into),
            rating: None,
            overview: None,
            genre_ids: vec![],
        }
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Discover(MediaType::Movie).path(), "discover/movie");
        assert_eq!(Endpoint::Popular(MediaType::Tv).path(), "tv/popular");
        assert_eq!(Endpoint::Upcoming.path(), "movie/upcoming");
        assert_eq!(Endpoint::OnTheAir.path(), "tv/on_the_air");
        let search = Endpoint::Search {
            media_type: MediaType::Tv,
            query: "x".into(),
        };
        assert_eq!(search.path(), "search/tv");
        assert_eq!(search.media_type(), MediaType::Tv);
        assert!(!search.accepts_filters());
    }

    #[test]
    fn test_item_helpers() {
        let it = item(Some("1999-03-31"));
        assert_eq!(it.year(), Some(1999));
        assert_eq!(it.display_title(), "Untitled");
        assert_eq!(
            it.poster_url("w500").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
        assert_eq!(item(Some("")).year(), None);
        assert_eq!(item(None).year(), None);
    }

    #[test]
    fn test_media_type_serde() {
        assert_eq!(serde_json::to_string(&MediaType::Tv).unwrap(), "\"tv\"");
        let m: MediaType = serde_json::from_str("\"movie\"").unwrap();
        assert_eq!(m, MediaType::Movie);
    }
}
