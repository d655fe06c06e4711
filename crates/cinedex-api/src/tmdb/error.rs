use thiserror::Error;

/// Errors from the TMDB API client.
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("no API key configured")]
    MissingApiKey,
}
