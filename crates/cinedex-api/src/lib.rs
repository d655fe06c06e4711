//! Upstream catalog API for cinedex: shared listing types, the
//! [`traits::CatalogService`] abstraction, and the TMDB client.

pub mod tmdb;
pub mod traits;

pub use traits::{
    CatalogItem, CatalogPage, CatalogService, Endpoint, EpisodeSummary, MediaType, SeasonDetails,
    SeasonSummary, TitleDetails,
};
