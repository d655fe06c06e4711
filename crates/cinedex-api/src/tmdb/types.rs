use serde::Deserialize;

use crate::traits::{
    CatalogItem, CatalogPage, EpisodeSummary, MediaType, SeasonDetails, SeasonSummary,
    TitleDetails,
};

// ── Listing responses ───────────────────────────────────────────

/// Envelope shared by every paginated TMDB listing.
#[derive(Debug, Deserialize)]
pub struct TmdbPageResponse {
    #[serde(default)]
    pub results: Vec<TmdbResult>,
    #[serde(default)]
    pub page: u32,
    /// Absent on some error-ish payloads; treated as zero pages.
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

/// A movie or TV row. Movies carry `title`/`release_date`, TV shows carry
/// `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
pub struct TmdbResult {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f32>,
    pub overview: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl TmdbResult {
    pub fn into_item(self, media_type: MediaType) -> CatalogItem {
        let title = match media_type {
            MediaType::Movie => self.title.or(self.name),
            MediaType::Tv => self.name.or(self.title),
        }
        .unwrap_or_default();
        let date = match media_type {
            MediaType::Movie => self.release_date.or(self.first_air_date),
            MediaType::Tv => self.first_air_date.or(self.release_date),
        }
        .filter(|d| !d.is_empty());

        CatalogItem {
            id: self.id,
            media_type,
            title,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            date,
            rating: self.vote_average,
            overview: self.overview,
            genre_ids: self.genre_ids,
        }
    }
}

impl TmdbPageResponse {
    pub fn into_page(self, media_type: MediaType) -> CatalogPage {
        CatalogPage {
            items: self
                .results
                .into_iter()
                .map(|r| r.into_item(media_type))
                .collect(),
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

// ── Detail responses ────────────────────────────────────────────

/// `movie/{id}` or `tv/{id}`.
#[derive(Debug, Deserialize)]
pub struct TmdbDetailsResponse {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f32>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub seasons: Vec<TmdbSeason>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbSeason {
    pub season_number: u32,
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: u32,
}

/// `tv/{id}/season/{n}`.
#[derive(Debug, Deserialize)]
pub struct TmdbSeasonResponse {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbEpisode {
    pub episode_number: u32,
    pub name: Option<String>,
    pub runtime: Option<u32>,
    pub air_date: Option<String>,
}

impl TmdbDetailsResponse {
    pub fn into_details(self, media_type: MediaType) -> TitleDetails {
        let title = match media_type {
            MediaType::Movie => self.title.or(self.name),
            MediaType::Tv => self.name.or(self.title),
        }
        .unwrap_or_default();
        let date = match media_type {
            MediaType::Movie => self.release_date.or(self.first_air_date),
            MediaType::Tv => self.first_air_date.or(self.release_date),
        }
        .filter(|d| !d.is_empty());

        TitleDetails {
            id: self.id,
            media_type,
            title,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            overview: self.overview,
            date,
            rating: self.vote_average,
            runtime: self.runtime.filter(|&m| m > 0),
            episode_run_time: self.episode_run_time,
            seasons: self
                .seasons
                .into_iter()
                .map(|s| SeasonSummary {
                    season_number: s.season_number,
                    name: s.name,
                    episode_count: s.episode_count,
                })
                .collect(),
        }
    }
}

impl TmdbSeasonResponse {
    pub fn into_season(self) -> SeasonDetails {
        SeasonDetails {
            season_number: self.season_number,
            episodes: self
                .episodes
                .into_iter()
                .map(|e| EpisodeSummary {
                    episode_number: e.episode_number,
                    name: e.name,
                    runtime: e.runtime.filter(|&m| m > 0),
                    air_date: e.air_date.filter(|d| !d.is_empty()),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_page_decodes() {
        let body = r#"{
            "page": 1,
            "results": [
                {"id": 550, "title": "Fight Club", "release_date": "1999-10-15",
                 "vote_average": 8.4, "poster_path": "/a.jpg", "genre_ids": [18]},
                {"id": 13, "title": "Forrest Gump", "release_date": ""}
            ],
            "total_pages": 42,
            "total_results": 830
        }"#;
        let resp: TmdbPageResponse = serde_json::from_str(body).unwrap();
        let page = resp.into_page(MediaType::Movie);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 42);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Fight Club");
        assert_eq!(page.items[0].genre_ids, vec![18]);
        assert_eq!(page.items[1].date, None);
    }

    #[test]
    fn test_tv_rows_use_name() {
        let body = r#"{"results": [{"id": 1399, "name": "Game of Thrones",
                      "first_air_date": "2011-04-17"}]}"#;
        let resp: TmdbPageResponse = serde_json::from_str(body).unwrap();
        let page = resp.into_page(MediaType::Tv);
        assert_eq!(page.items[0].title, "Game of Thrones");
        assert_eq!(page.items[0].date.as_deref(), Some("2011-04-17"));
        assert_eq!(page.items[0].media_type, MediaType::Tv);
        // Missing pagination fields default to zero.
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_missing_results_is_empty() {
        let resp: TmdbPageResponse =
            serde_json::from_str(r#"{"page": 3, "total_pages": 2}"#).unwrap();
        assert!(resp.results.is_empty());
    }

    #[test]
    fn test_tv_details_decode() {
        let body = r#"{
            "id": 1399, "name": "Game of Thrones", "episode_run_time": [60],
            "first_air_date": "2011-04-17", "vote_average": 8.5,
            "seasons": [
                {"season_number": 0, "name": "Specials", "episode_count": 14},
                {"season_number": 1, "name": "Season 1", "episode_count": 10}
            ]
        }"#;
        let resp: TmdbDetailsResponse = serde_json::from_str(body).unwrap();
        let details = resp.into_details(MediaType::Tv);
        assert_eq!(details.title, "Game of Thrones");
        assert_eq!(details.episode_run_time, vec![60]);
        assert_eq!(details.seasons.len(), 2);
        assert_eq!(details.seasons[1].episode_count, 10);
        assert_eq!(details.runtime, None);
        assert_eq!(details.date.as_deref(), Some("2011-04-17"));
    }

    #[test]
    fn test_season_zero_runtime_is_unknown() {
        let body = r#"{"season_number": 2, "episodes": [
            {"episode_number": 1, "name": "North", "runtime": 0, "air_date": ""},
            {"episode_number": 2, "runtime": 52, "air_date": "2012-04-08"}
        ]}"#;
        let resp: TmdbSeasonResponse = serde_json::from_str(body).unwrap();
        let season = resp.into_season();
        assert_eq!(season.episode(1).unwrap().runtime, None);
        assert_eq!(season.episode(1).unwrap().air_date, None);
        assert_eq!(season.episode(2).unwrap().runtime, Some(52));
        assert!(season.episode(3).is_none());
    }
}
