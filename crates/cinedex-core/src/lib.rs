pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod genres;
pub mod models;
pub mod player;
pub mod prefs;
pub mod signal;
pub mod storage;
pub mod sync;
pub mod viewport;
