//! Fixed TMDB genre tables.

use cinedex_api::MediaType;

/// A catalog genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: &'static str,
}

const fn g(id: u32, name: &'static str) -> Genre {
    Genre { id, name }
}

pub const MOVIE_GENRES: &[Genre] = &[
    g(28, "Action"),
    g(12, "Adventure"),
    g(16, "Animation"),
    g(35, "Comedy"),
    g(80, "Crime"),
    g(99, "Documentary"),
    g(18, "Drama"),
    g(10751, "Family"),
    g(14, "Fantasy"),
    g(36, "History"),
    g(27, "Horror"),
    g(10402, "Music"),
    g(9648, "Mystery"),
    g(10749, "Romance"),
    g(878, "Science Fiction"),
    g(10770, "TV Movie"),
    g(53, "Thriller"),
    g(10752, "War"),
    g(37, "Western"),
];

pub const TV_GENRES: &[Genre] = &[
    g(10759, "Action & Adventure"),
    g(16, "Animation"),
    g(35, "Comedy"),
    g(80, "Crime"),
    g(99, "Documentary"),
    g(18, "Drama"),
    g(10751, "Family"),
    g(10762, "Kids"),
    g(9648, "Mystery"),
    g(10763, "News"),
    g(10764, "Reality"),
    g(10765, "Sci-Fi & Fantasy"),
    g(10766, "Soap"),
    g(10767, "Talk"),
    g(10768, "War & Politics"),
    g(37, "Western"),
];

/// Genre id used for the anime feed.
pub const ANIMATION: u32 = 16;

/// URL-friendly movie genre slugs.
const SLUGS: &[(&str, u32)] = &[
    ("action", 28),
    ("comedy", 35),
    ("drama", 18),
    ("horror", 27),
    ("sci-fi", 878),
    ("thriller", 53),
    ("romance", 10749),
    ("animation", 16),
];

pub fn for_media(media_type: MediaType) -> &'static [Genre] {
    match media_type {
        MediaType::Movie => MOVIE_GENRES,
        MediaType::Tv => TV_GENRES,
    }
}

/// Resolve a genre slug such as `sci-fi` to its id.
pub fn slug_to_id(slug: &str) -> Option<u32> {
    SLUGS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(slug))
        .map(|(_, id)| *id)
}

/// Human heading for a slug: `sci-fi` -> `Sci-fi`.
pub fn slug_title(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn name_of(media_type: MediaType, id: u32) -> Option<&'static str> {
    for_media(media_type)
        .iter()
        .find(|genre| genre.id == id)
        .map(|genre| genre.name)
}
