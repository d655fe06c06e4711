//! Named catalog listings (movies, TV, anime, coming soon, search) bound to
//! an upstream endpoint, usable as a [`PageSource`].

use std::sync::Arc;

use cinedex_api::{CatalogItem, CatalogService, Endpoint, MediaType};

use crate::filter::FilterState;
use crate::genres;
use crate::sync::{PageResult, PageSource};

/// Country filter for the anime listing.
const ANIME_ORIGIN: &str = "JP";

/// A list screen and the upstream listing behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// Movie discovery, optionally narrowed by a genre slug (`sci-fi`).
    Movies { genre_slug: Option<String> },
    /// TV discovery.
    Tv,
    /// Japanese animated series.
    Anime,
    ComingSoonMovies,
    ComingSoonTv,
    Search { media_type: MediaType, query: String },
}

impl Feed {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Movies { .. } => Endpoint::Discover(MediaType::Movie),
            Self::Tv | Self::Anime => Endpoint::Discover(MediaType::Tv),
            Self::ComingSoonMovies => Endpoint::Upcoming,
            Self::ComingSoonTv => Endpoint::OnTheAir,
            Self::Search { media_type, query } => Endpoint::Search {
                media_type: *media_type,
                query: query.clone(),
            },
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.endpoint().media_type()
    }

    /// Effective filters for a request: the user's filters plus whatever the
    /// feed pins.
    pub fn effective_filters(&self, filters: &FilterState) -> FilterState {
        match self {
            Self::Movies {
                genre_slug: Some(slug),
            } if filters.genres.is_empty() => match genres::slug_to_id(slug) {
                Some(id) => filters.clone().with_genres([id]),
                None => filters.clone(),
            },
            Self::Anime => {
                let mut pinned = filters.clone();
                if !pinned.genres.contains(&genres::ANIMATION) {
                    pinned.genres.insert(0, genres::ANIMATION);
                }
                pinned.origin_country = Some(ANIME_ORIGIN.into());
                pinned
            }
            _ => filters.clone(),
        }
    }

    /// Upstream query pairs. Listings without discovery support ignore
    /// filters entirely.
    pub fn query(&self, filters: &FilterState) -> Vec<(String, String)> {
        let endpoint = self.endpoint();
        if endpoint.accepts_filters() {
            self.effective_filters(filters).to_query(endpoint.media_type())
        } else {
            Vec::new()
        }
    }

    /// Heading shown above the list.
    pub fn title(&self) -> String {
        match self {
            Self::Movies { genre_slug: None } => "Popular Movies".into(),
            Self::Movies {
                genre_slug: Some(slug),
            } => format!("{} Movies", genres::slug_title(slug)),
            Self::Tv => "Popular TV Shows".into(),
            Self::Anime => "Anime".into(),
            Self::ComingSoonMovies => "Coming Soon: Movies".into(),
            Self::ComingSoonTv => "Coming Soon: TV".into(),
            Self::Search { query, .. } => format!("Results for \"{query}\""),
        }
    }
}

/// A [`Feed`] served by a catalog client.
pub struct CatalogFeed<C> {
    client: Arc<C>,
    feed: Feed,
}

impl<C: CatalogService + 'static> CatalogFeed<C> {
    pub fn new(client: Arc<C>, feed: Feed) -> Self {
        Self { client, feed }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// First `limit` items of page 1, for teaser strips. Errors are logged
    /// and yield an empty strip.
    pub async fn preview(&self, limit: usize) -> Vec<CatalogItem> {
        match self.fetch_page(&FilterState::default(), 1).await {
            Ok(page) => page.items.into_iter().take(limit).collect(),
            Err(e) => {
                tracing::warn!(error = %e, feed = %self.feed.title(), "Failed to load preview");
                Vec::new()
            }
        }
    }
}

impl<C: CatalogService + 'static> PageSource for CatalogFeed<C> {
    type Item = CatalogItem;
    type Error = C::Error;

    async fn fetch_page(
        &self,
        filters: &FilterState,
        page: u32,
    ) -> Result<PageResult<CatalogItem>, C::Error> {
        let endpoint = self.feed.endpoint();
        let query = self.feed.query(filters);
        let result = self.client.fetch_page(&endpoint, &query, page).await?;
        Ok(PageResult {
            items: result.items,
            page,
            total_pages: result.total_pages,
        })
    }
}
