use std::sync::Arc;

use anyhow::{Context, Result};

use cinedex_api::tmdb::TmdbClient;
use cinedex_api::{CatalogItem, MediaType};
use cinedex_core::config::{AppConfig, API_KEY_ENV};
use cinedex_core::feed::{CatalogFeed, Feed};
use cinedex_core::filter::FilterState;
use cinedex_core::genres;
use cinedex_core::models::{GridSize, WatchlistEntry};
use cinedex_core::player::{format_timestamp, EmbedTarget, EpisodeSelection, PlayerSurface};
use cinedex_core::prefs::{ContinueWatching, GridSizePreference, SharedStore, Watchlist};
use cinedex_core::storage::SqliteStore;
use cinedex_core::sync::{FetchOutcome, ListSynchronizer};

fn catalog_client(config: &AppConfig) -> Result<Arc<TmdbClient>> {
    let key = config.api_key().with_context(|| {
        format!("no TMDB API key: set {API_KEY_ENV} or catalog.api_key in the config file")
    })?;
    let client = TmdbClient::new(key)
        .with_base_url(&config.catalog.base_url)?
        .with_language(config.catalog.language.clone())
        .with_region(config.catalog.region.clone());
    Ok(Arc::new(client))
}

fn open_store() -> Result<SharedStore> {
    let path = AppConfig::ensure_db_path()?;
    let store = SqliteStore::open(&path)
        .with_context(|| format!("opening preferences at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn print_item(item: &CatalogItem) {
    let year = item.year().map(|y| format!(" ({y})")).unwrap_or_default();
    let rating = item
        .rating
        .map(|r| format!("  {r:.1}/10"))
        .unwrap_or_default();
    let genre_names: Vec<&str> = item
        .genre_ids
        .iter()
        .filter_map(|&id| genres::name_of(item.media_type, id))
        .collect();
    let genre_list = if genre_names.is_empty() {
        String::new()
    } else {
        format!("  [{}]", genre_names.join(", "))
    };
    println!(
        "{:>8}  {}{year}{rating}{genre_list}",
        item.id,
        item.display_title()
    );
}

async fn pull_pages(feed: CatalogFeed<TmdbClient>, filters: FilterState, pages: u32) {
    let title = feed.feed().title();
    let sync = ListSynchronizer::new(feed);

    if sync.reset(filters).await == FetchOutcome::Failed {
        eprintln!("Could not load {title}; the catalog did not respond.");
    }
    for _ in 1..pages.max(1) {
        let Some(fetch) = sync.load_more() else {
            break;
        };
        if fetch.await == FetchOutcome::Failed {
            eprintln!("Loading page {} failed; stopping.", sync.page() + 1);
            break;
        }
    }

    let state = sync.state();
    println!("{title}");
    for item in &state.items {
        print_item(item);
    }
    println!(
        "-- {} items, page {}, {}",
        state.items.len(),
        state.page,
        if state.has_more { "more available" } else { "end of results" }
    );
}

pub async fn browse(config: &AppConfig, feed: Feed, filters: FilterState, pages: u32) -> Result<()> {
    let client = catalog_client(config)?;
    pull_pages(CatalogFeed::new(client, feed), filters, pages).await;
    Ok(())
}

pub async fn search(config: &AppConfig, media_type: MediaType, query: String, pages: u32) -> Result<()> {
    let query = query.trim().to_string();
    anyhow::ensure!(!query.is_empty(), "search query is empty");
    let client = catalog_client(config)?;
    let feed = Feed::Search { media_type, query };
    pull_pages(CatalogFeed::new(client, feed), FilterState::new(), pages).await;
    Ok(())
}

// ── Watchlist ───────────────────────────────────────────────────

pub fn watchlist_list() -> Result<()> {
    let list = Watchlist::hydrate(open_store()?);
    if list.is_empty() {
        println!("Watchlist is empty.");
    }
    for entry in list.entries() {
        println!(
            "{:>5} {:>8}  {}  (added {})",
            entry.media_type.as_str(),
            entry.id,
            entry.title,
            entry.added_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub async fn watchlist_add(config: &AppConfig, media_type: MediaType, id: u64) -> Result<()> {
    let mut list = Watchlist::hydrate(open_store()?);
    if list.contains(id, media_type) {
        println!("Already in watchlist: {media_type}/{id}");
        return Ok(());
    }
    let client = catalog_client(config)?;
    let details = client
        .fetch_details(media_type, id)
        .await
        .with_context(|| format!("looking up {media_type}/{id}"))?;
    list.add(WatchlistEntry::from_details(&details));
    println!("Added {} to watchlist.", details.title);
    Ok(())
}

pub fn watchlist_remove(media_type: MediaType, id: u64) -> Result<()> {
    let mut list = Watchlist::hydrate(open_store()?);
    if list.remove(id, media_type) {
        println!("Removed {media_type}/{id}.");
    } else {
        println!("Not in watchlist: {media_type}/{id}");
    }
    Ok(())
}

pub fn watchlist_clear() -> Result<()> {
    Watchlist::hydrate(open_store()?).clear();
    println!("Watchlist cleared.");
    Ok(())
}

// ── Continue watching ───────────────────────────────────────────

pub fn continue_list() -> Result<()> {
    let history = ContinueWatching::hydrate(open_store()?);
    if history.is_empty() {
        println!("Nothing in progress.");
    }
    for entry in history.entries() {
        let episode = match (entry.season, entry.episode) {
            (Some(s), Some(e)) => format!(" S{s:02}E{e:02}"),
            _ => String::new(),
        };
        let watched = entry.watched_minutes() * 60;
        let total = u64::from(entry.runtime_minutes) * 60;
        println!(
            "{:>5} {:>8}  {}{episode}  {} / {} ({}%)",
            entry.media_type.as_str(),
            entry.id,
            entry.title,
            format_timestamp(watched),
            format_timestamp(total),
            entry.progress_percent
        );
    }
    Ok(())
}

pub fn continue_remove(media_type: MediaType, id: u64) -> Result<()> {
    let mut history = ContinueWatching::hydrate(open_store()?);
    if history.remove(id, media_type) {
        println!("Removed {media_type}/{id}.");
    } else {
        println!("Not in progress: {media_type}/{id}");
    }
    Ok(())
}

pub fn continue_clear() -> Result<()> {
    ContinueWatching::hydrate(open_store()?).clear();
    println!("Continue watching cleared.");
    Ok(())
}

// ── Playback ────────────────────────────────────────────────────

pub async fn play_movie(config: &AppConfig, id: u64) -> Result<()> {
    let client = catalog_client(config)?;
    let details = client
        .fetch_details(MediaType::Movie, id)
        .await
        .with_context(|| format!("looking up movie/{id}"))?;

    let mut history = ContinueWatching::hydrate(open_store()?);
    let mut player = PlayerSurface::new(config.playback.clone())?;
    let url = player.open(EmbedTarget::Movie { id }, &details, None, &mut history);
    println!("{}", details.title);
    println!("{url}");
    Ok(())
}

pub async fn play_tv(config: &AppConfig, id: u64, requested: Option<(u32, u32)>) -> Result<()> {
    let client = catalog_client(config)?;
    let details = client
        .fetch_details(MediaType::Tv, id)
        .await
        .with_context(|| format!("looking up tv/{id}"))?;
    let selection = EpisodeSelection::resolve(&details, requested)
        .with_context(|| format!("{} lists no seasons", details.title))?;
    if let Some(req) = requested {
        if req != (selection.season, selection.episode) {
            tracing::warn!(season = req.0, "Requested season not found, using default");
        }
    }

    let season = match client.fetch_season(id, selection.season).await {
        Ok(season) => Some(season),
        Err(e) => {
            tracing::warn!(error = %e, season = selection.season, "Season details unavailable");
            None
        }
    };

    let mut history = ContinueWatching::hydrate(open_store()?);
    let mut player = PlayerSurface::new(config.playback.clone())?;
    let url = player.open(selection.target(id), &details, season.as_ref(), &mut history);
    println!(
        "{} S{:02}E{:02}",
        details.title, selection.season, selection.episode
    );
    println!("{url}");
    if let Some(next) = season.as_ref().and_then(|s| selection.next(&details, s)) {
        println!("next: --season {} --episode {}", next.season, next.episode);
    }
    Ok(())
}

// ── Grid & config ───────────────────────────────────────────────

pub fn grid(config: &AppConfig, scope: &str, size: Option<GridSize>) -> Result<()> {
    let mut pref = GridSizePreference::load(open_store()?, scope, config.display.grid_size);
    if let Some(size) = size {
        pref.set(size);
    }
    println!("{scope}: {}", pref.size());
    Ok(())
}

pub fn config_show(config: &AppConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.catalog.api_key.is_some() {
        shown.catalog.api_key = Some("********".into());
    }
    print!("{}", toml::to_string_pretty(&shown)?);
    if std::env::var(API_KEY_ENV).is_ok_and(|v| !v.is_empty()) {
        println!("# API key from {API_KEY_ENV}");
    }
    Ok(())
}

pub fn config_path() {
    println!("config:   {}", AppConfig::config_path().display());
    println!("database: {}", AppConfig::db_path().display());
    println!("logs:     {}", AppConfig::log_dir().display());
}
