use reqwest::Client;
use url::Url;

use super::error::TmdbError;
use super::types::{TmdbDetailsResponse, TmdbPageResponse, TmdbSeasonResponse};
use crate::traits::{
    CatalogPage, CatalogService, Endpoint, MediaType, SeasonDetails, TitleDetails,
};

const BASE_URL: &str = "https://api.themoviedb.org/3/";

/// TMDB v3 REST client (API-key auth).
pub struct TmdbClient {
    api_key: String,
    base_url: Url,
    language: String,
    region: Option<String>,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: Url::parse(BASE_URL).expect("built-in base URL is valid"),
            language: "en-US".into(),
            region: None,
            http: Client::new(),
        }
    }

    /// Point the client at another TMDB-compatible host.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, TmdbError> {
        // `Url::join` drops the last segment unless the base ends in '/'.
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        self.base_url = Url::parse(&base)?;
        Ok(self)
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.filter(|r| !r.is_empty());
        self
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDB API error");
            Err(TmdbError::Api {
                status,
                message: body,
            })
        }
    }

    /// Build the request URL for one page of an endpoint.
    pub fn page_url(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
        page: u32,
    ) -> Result<Url, TmdbError> {
        let mut url = self.base_url.join(&endpoint.path())?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("api_key", &self.api_key)
                .append_pair("language", &self.language)
                .append_pair("page", &page.to_string());
            // A per-list region in `query` wins over the client default.
            if let Some(ref region) = self.region {
                if !query.iter().any(|(k, v)| k == "region" && !v.is_empty()) {
                    pairs.append_pair("region", region);
                }
            }
            if let Endpoint::Search { query: text, .. } = endpoint {
                pairs.append_pair("query", text);
            }
            for (key, value) in query {
                if !value.is_empty() {
                    pairs.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    /// URL of a single resource (`tv/1399`, `tv/1399/season/1`).
    pub fn resource_url(&self, path: &str) -> Result<Url, TmdbError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("language", &self.language);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, TmdbError> {
        if self.api_key.is_empty() {
            return Err(TmdbError::MissingApiKey);
        }
        let resp = self.http.get(url).send().await?;
        let resp = Self::check_response(resp).await?;
        Ok(resp.text().await?)
    }

    /// Detail record for a movie or TV show.
    pub async fn fetch_details(
        &self,
        media_type: MediaType,
        id: u64,
    ) -> Result<TitleDetails, TmdbError> {
        let url = self.resource_url(&format!("{media_type}/{id}"))?;
        tracing::debug!(%media_type, id, "Fetching title details");
        let body = self.get_text(url).await?;
        let resp: TmdbDetailsResponse =
            serde_json::from_str(&body).map_err(|e| TmdbError::Parse(e.to_string()))?;
        Ok(resp.into_details(media_type))
    }

    /// Episode list for one season of a TV show.
    pub async fn fetch_season(&self, show_id: u64, season: u32) -> Result<SeasonDetails, TmdbError> {
        let url = self.resource_url(&format!("tv/{show_id}/season/{season}"))?;
        tracing::debug!(show_id, season, "Fetching season details");
        let body = self.get_text(url).await?;
        let resp: TmdbSeasonResponse =
            serde_json::from_str(&body).map_err(|e| TmdbError::Parse(e.to_string()))?;
        Ok(resp.into_season())
    }
}

/// Decode a listing body into a page of items of the given media type.
pub fn parse_page(body: &str, media_type: MediaType) -> Result<CatalogPage, TmdbError> {
    let resp: TmdbPageResponse =
        serde_json::from_str(body).map_err(|e| TmdbError::Parse(e.to_string()))?;
    Ok(resp.into_page(media_type))
}

impl CatalogService for TmdbClient {
    type Error = TmdbError;

    async fn fetch_page(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
        page: u32,
    ) -> Result<CatalogPage, TmdbError> {
        let url = self.page_url(endpoint, query, page)?;
        tracing::debug!(path = %endpoint.path(), page, "Fetching catalog page");

        let body = self.get_text(url).await?;
        parse_page(&body, endpoint.media_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_discover_url_carries_filters() {
        let client = TmdbClient::new("k".into()).with_region(Some("US".into()));
        let url = client
            .page_url(
                &Endpoint::Discover(MediaType::Movie),
                &[
                    ("sort_by".into(), "vote_average.desc".into()),
                    ("with_genres".into(), String::new()),
                ],
                3,
            )
            .unwrap();

        assert_eq!(url.path(), "/3/discover/movie");
        let q = query_of(&url);
        assert!(q.contains(&("api_key".into(), "k".into())));
        assert!(q.contains(&("page".into(), "3".into())));
        assert!(q.contains(&("region".into(), "US".into())));
        assert!(q.contains(&("sort_by".into(), "vote_average.desc".into())));
        // Empty filter values are not sent.
        assert!(!q.iter().any(|(k, _)| k == "with_genres"));
    }

    #[test]
    fn test_list_region_overrides_client_region() {
        let client = TmdbClient::new("k".into()).with_region(Some("US".into()));
        let url = client
            .page_url(
                &Endpoint::Discover(MediaType::Tv),
                &[("region".into(), "JP".into())],
                1,
            )
            .unwrap();

        let regions: Vec<_> = query_of(&url)
            .into_iter()
            .filter(|(k, _)| k == "region")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(regions, vec!["JP".to_string()]);
    }

    #[test]
    fn test_search_url_and_custom_base() {
        let client = TmdbClient::new("k".into())
            .with_base_url("http://localhost:9000/v3")
            .unwrap();
        let url = client
            .page_url(
                &Endpoint::Search {
                    media_type: MediaType::Tv,
                    query: "the office".into(),
                },
                &[],
                1,
            )
            .unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.path(), "/v3/search/tv");
        assert!(query_of(&url).contains(&("query".into(), "the office".into())));
    }

    #[test]
    fn test_parse_page_rejects_malformed() {
        let err = parse_page("{\"results\": 5}", MediaType::Movie).unwrap_err();
        assert!(matches!(err, TmdbError::Parse(_)));
        let err = parse_page("<html>", MediaType::Movie).unwrap_err();
        assert!(matches!(err, TmdbError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        let client = TmdbClient::new(String::new());
        let err = client
            .fetch_page(&Endpoint::Upcoming, &[], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TmdbError::MissingApiKey));
    }

    #[test]
    fn test_resource_url() {
        let client = TmdbClient::new("k".into()).with_language("de-DE");
        let url = client.resource_url("tv/1399/season/2").unwrap();
        assert_eq!(url.path(), "/3/tv/1399/season/2");
        let q = query_of(&url);
        assert!(q.contains(&("language".into(), "de-DE".into())));
        assert!(!q.iter().any(|(k, _)| k == "page"));
    }

    #[tokio::test]
    async fn test_details_require_api_key() {
        let client = TmdbClient::new(String::new());
        let err = client.fetch_details(MediaType::Movie, 550).await.unwrap_err();
        assert!(matches!(err, TmdbError::MissingApiKey));
    }
}
