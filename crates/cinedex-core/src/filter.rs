//! Discovery filters and their upstream query encoding.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cinedex_api::MediaType;

/// Sort order accepted by the discovery endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    PopularityDesc,
    PopularityAsc,
    RatingDesc,
    RatingAsc,
    ReleaseDateDesc,
    ReleaseDateAsc,
    TitleAsc,
    TitleDesc,
}

impl SortOrder {
    pub const ALL: &[SortOrder] = &[
        Self::PopularityDesc,
        Self::PopularityAsc,
        Self::RatingDesc,
        Self::RatingAsc,
        Self::ReleaseDateDesc,
        Self::ReleaseDateAsc,
        Self::TitleAsc,
        Self::TitleDesc,
    ];

    /// Upstream `sort_by` value. TV has no release date, only a first air
    /// date, and sorts by `name` rather than `title`.
    pub fn as_query(self, media_type: MediaType) -> &'static str {
        match (self, media_type) {
            (Self::PopularityDesc, _) => "popularity.desc",
            (Self::PopularityAsc, _) => "popularity.asc",
            (Self::RatingDesc, _) => "vote_average.desc",
            (Self::RatingAsc, _) => "vote_average.asc",
            (Self::ReleaseDateDesc, MediaType::Movie) => "primary_release_date.desc",
            (Self::ReleaseDateAsc, MediaType::Movie) => "primary_release_date.asc",
            (Self::ReleaseDateDesc, MediaType::Tv) => "first_air_date.desc",
            (Self::ReleaseDateAsc, MediaType::Tv) => "first_air_date.asc",
            (Self::TitleAsc, MediaType::Movie) => "title.asc",
            (Self::TitleDesc, MediaType::Movie) => "title.desc",
            (Self::TitleAsc, MediaType::Tv) => "name.asc",
            (Self::TitleDesc, MediaType::Tv) => "name.desc",
        }
    }

    /// Parse an upstream `sort_by` value (movie or TV spelling).
    pub fn from_query(s: &str) -> Option<Self> {
        match s {
            "popularity.desc" => Some(Self::PopularityDesc),
            "popularity.asc" => Some(Self::PopularityAsc),
            "vote_average.desc" => Some(Self::RatingDesc),
            "vote_average.asc" => Some(Self::RatingAsc),
            "primary_release_date.desc" | "first_air_date.desc" => Some(Self::ReleaseDateDesc),
            "primary_release_date.asc" | "first_air_date.asc" => Some(Self::ReleaseDateAsc),
            "title.asc" | "name.asc" => Some(Self::TitleAsc),
            "title.desc" | "name.desc" => Some(Self::TitleDesc),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PopularityDesc => "Most Popular",
            Self::PopularityAsc => "Least Popular",
            Self::RatingDesc => "Highest Rated",
            Self::RatingAsc => "Lowest Rated",
            Self::ReleaseDateDesc => "Newest First",
            Self::ReleaseDateAsc => "Oldest First",
            Self::TitleAsc => "A-Z",
            Self::TitleDesc => "Z-A",
        }
    }
}

/// The user's current list filters. Any change to this value restarts
/// pagination from page 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub sort_by: Option<SortOrder>,
    pub genres: Vec<u32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Release region for this list, overriding the client default.
    pub region: Option<String>,
    pub origin_country: Option<String>,
    /// Pass-through query pairs not modelled above.
    pub extra: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort_by = Some(sort);
        self
    }

    pub fn with_genres(mut self, genres: impl IntoIterator<Item = u32>) -> Self {
        self.genres = genres.into_iter().collect();
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_origin_country(mut self, country: impl Into<String>) -> Self {
        self.origin_country = Some(country.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Effective sort: unset falls back to most popular first.
    pub fn sort_or_default(&self) -> SortOrder {
        self.sort_by.unwrap_or_default()
    }

    /// Number of filters that differ from the defaults (for badge counts).
    pub fn active_count(&self) -> usize {
        let sort = usize::from(self.sort_or_default() != SortOrder::PopularityDesc);
        self.genres.len() + sort
    }

    pub fn is_default(&self) -> bool {
        self.active_count() == 0
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.region.is_none()
            && self.origin_country.is_none()
            && self.extra.is_empty()
    }

    /// Render as upstream query pairs for the given media type.
    pub fn to_query(&self, media_type: MediaType) -> Vec<(String, String)> {
        let mut query = vec![(
            "sort_by".to_string(),
            self.sort_or_default().as_query(media_type).to_string(),
        )];

        if !self.genres.is_empty() {
            let ids: Vec<String> = self.genres.iter().map(u32::to_string).collect();
            query.push(("with_genres".into(), ids.join(",")));
        }

        let date_key = match media_type {
            MediaType::Movie => "primary_release_date",
            MediaType::Tv => "first_air_date",
        };
        if let Some(from) = self.date_from {
            query.push((format!("{date_key}.gte"), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            query.push((format!("{date_key}.lte"), to.format("%Y-%m-%d").to_string()));
        }
        if let Some(ref region) = self.region {
            query.push(("region".into(), region.clone()));
        }
        if let Some(ref country) = self.origin_country {
            query.push(("with_origin_country".into(), country.clone()));
        }
        for (key, value) in &self.extra {
            if !value.is_empty() {
                query.push((key.clone(), value.clone()));
            }
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_missing_sort_defaults_to_popularity() {
        let query = FilterState::new().to_query(MediaType::Movie);
        assert_eq!(lookup(&query, "sort_by"), Some("popularity.desc"));
        assert_eq!(query.len(), 1);
    }

    #[test]
    fn test_full_query_for_tv() {
        let filters = FilterState::new()
            .with_sort(SortOrder::ReleaseDateDesc)
            .with_genres([16, 35])
            .with_date_range(
                NaiveDate::from_ymd_opt(2020, 1, 1),
                NaiveDate::from_ymd_opt(2020, 12, 31),
            )
            .with_origin_country("JP")
            .with_extra("with_runtime.gte", "20");
        let query = filters.to_query(MediaType::Tv);

        assert_eq!(lookup(&query, "sort_by"), Some("first_air_date.desc"));
        assert_eq!(lookup(&query, "with_genres"), Some("16,35"));
        assert_eq!(lookup(&query, "first_air_date.gte"), Some("2020-01-01"));
        assert_eq!(lookup(&query, "first_air_date.lte"), Some("2020-12-31"));
        assert_eq!(lookup(&query, "with_origin_country"), Some("JP"));
        assert_eq!(lookup(&query, "with_runtime.gte"), Some("20"));
    }

    #[test]
    fn test_region_is_per_list() {
        let query = FilterState::new().with_region("GB").to_query(MediaType::Movie);
        assert_eq!(lookup(&query, "region"), Some("GB"));
        assert_eq!(query.len(), 2);

        assert!(!FilterState::new().with_region("GB").is_default());
        assert_ne!(FilterState::new(), FilterState::new().with_region("GB"));
        assert_eq!(lookup(&FilterState::new().to_query(MediaType::Tv), "region"), None);
    }

    #[test]
    fn test_active_count() {
        assert_eq!(FilterState::new().active_count(), 0);
        assert!(FilterState::new().is_default());
        let explicit_default = FilterState::new().with_sort(SortOrder::PopularityDesc);
        assert_eq!(explicit_default.active_count(), 0);
        let filters = FilterState::new()
            .with_sort(SortOrder::TitleAsc)
            .with_genres([28, 12]);
        assert_eq!(filters.active_count(), 3);
    }

    #[test]
    fn test_sort_query_roundtrip() {
        for sort in SortOrder::ALL {
            for media in MediaType::ALL {
                assert_eq!(SortOrder::from_query(sort.as_query(*media)), Some(*sort));
            }
        }
        assert_eq!(SortOrder::from_query("bogus"), None);
    }

    #[test]
    fn test_equality_drives_reset() {
        let a = FilterState::new().with_genres([28]);
        let b = FilterState::new().with_genres([28]);
        assert_eq!(a, b);
        assert_ne!(a, b.with_sort(SortOrder::RatingDesc));
    }
}
