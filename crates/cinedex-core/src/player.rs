//! Playback surface: embed addresses for the external iframe player,
//! episode selection, and the continue-watching record made on open.

use url::Url;

use cinedex_api::{MediaType, SeasonDetails, TitleDetails};

use crate::config::PlaybackConfig;
use crate::error::CinedexError;
use crate::models::ContinueWatchingEntry;
use crate::prefs::ContinueWatching;
use crate::signal::{Signal, Subscription};

/// What the embedded player should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTarget {
    Movie { id: u64 },
    Episode { id: u64, season: u32, episode: u32 },
}

impl EmbedTarget {
    pub fn id(&self) -> u64 {
        match self {
            Self::Movie { id } | Self::Episode { id, .. } => *id,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Movie { .. } => MediaType::Movie,
            Self::Episode { .. } => MediaType::Tv,
        }
    }

    /// `{base}/movie/{id}` or `{base}/tv/{id}/{season}/{episode}`.
    pub fn embed_url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Self::Movie { id } => format!("{base}/movie/{id}"),
            Self::Episode {
                id,
                season,
                episode,
            } => format!("{base}/tv/{id}/{season}/{episode}"),
        }
    }
}

/// A season/episode pair within a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeSelection {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeSelection {
    /// First regular season (number > 0), falling back to the first listed
    /// season, at episode 1. `None` when the show lists no seasons.
    pub fn default_for(show: &TitleDetails) -> Option<Self> {
        let season = show
            .seasons
            .iter()
            .find(|s| s.season_number > 0)
            .or_else(|| show.seasons.first())?;
        Some(Self {
            season: season.season_number,
            episode: 1,
        })
    }

    /// Honour a requested pair only when its season exists on the show.
    pub fn resolve(show: &TitleDetails, requested: Option<(u32, u32)>) -> Option<Self> {
        match requested {
            Some((season, episode))
                if show.seasons.iter().any(|s| s.season_number == season) =>
            {
                Some(Self { season, episode })
            }
            _ => Self::default_for(show),
        }
    }

    /// The episode after this one: the next listed episode of the current
    /// season, else episode 1 of the next regular season.
    pub fn next(&self, show: &TitleDetails, season: &SeasonDetails) -> Option<Self> {
        let idx = season
            .episodes
            .iter()
            .position(|e| e.episode_number == self.episode);
        if let Some(next) = idx.and_then(|i| season.episodes.get(i + 1)) {
            return Some(Self {
                season: self.season,
                episode: next.episode_number,
            });
        }

        let regular: Vec<u32> = show
            .seasons
            .iter()
            .map(|s| s.season_number)
            .filter(|&n| n > 0)
            .collect();
        let pos = regular.iter().position(|&n| n == self.season)?;
        regular.get(pos + 1).map(|&season| Self { season, episode: 1 })
    }

    pub fn target(&self, show_id: u64) -> EmbedTarget {
        EmbedTarget::Episode {
            id: show_id,
            season: self.season,
            episode: self.episode,
        }
    }
}

/// Keyboard input from the view. A key source forwards every press; the
/// surface acts on `Escape` and leaves the rest to whatever else listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

pub type KeySignal = Signal<Key>;

/// The overlay hosting the embedded player.
///
/// Opening records a continue-watching entry; further opens of an already
/// open surface (e.g. switching episode) do not record again until the
/// surface is closed.
///
/// With a [`KeySignal`] bound, the surface subscribes on open and drops the
/// subscription on close, so keys pressed while it is closed never reach it.
#[derive(Debug)]
pub struct PlayerSurface {
    settings: PlaybackConfig,
    current: Option<EmbedTarget>,
    recorded: bool,
    keys: Option<KeySignal>,
    key_sub: Option<Subscription<Key>>,
}

impl PlayerSurface {
    pub fn new(settings: PlaybackConfig) -> Result<Self, CinedexError> {
        Url::parse(&settings.embed_base)
            .map_err(|e| CinedexError::Config(format!("invalid embed_base: {e}")))?;
        Ok(Self {
            settings,
            current: None,
            recorded: false,
            keys: None,
            key_sub: None,
        })
    }

    /// Take key events from `signal` while open.
    pub fn with_keys(mut self, signal: KeySignal) -> Self {
        if self.is_open() {
            self.key_sub = Some(signal.subscribe());
        }
        self.keys = Some(signal);
        self
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<EmbedTarget> {
        self.current
    }

    /// Embed address of the open target.
    pub fn embed_url(&self) -> Option<String> {
        self.current
            .map(|t| t.embed_url(&self.settings.embed_base))
    }

    /// Whether a key subscription is live.
    pub fn wants_keys(&self) -> bool {
        self.key_sub.is_some()
    }

    /// Present `target` and return its embed address. `season` supplies the
    /// episode runtime for TV when it has been loaded.
    pub fn open(
        &mut self,
        target: EmbedTarget,
        details: &TitleDetails,
        season: Option<&SeasonDetails>,
        history: &mut ContinueWatching,
    ) -> String {
        self.current = Some(target);
        if self.key_sub.is_none() {
            self.key_sub = self.keys.as_ref().map(Signal::subscribe);
        }
        if !self.recorded {
            history.upsert(self.progress_entry(target, details, season));
            self.recorded = true;
        }
        let url = target.embed_url(&self.settings.embed_base);
        tracing::info!(%url, "Player opened");
        url
    }

    pub fn close(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!("Player closed");
        }
        self.recorded = false;
        self.key_sub = None;
    }

    /// Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if key == Key::Escape && self.is_open() {
            self.close();
            true
        } else {
            false
        }
    }

    /// Handle keys already queued on the subscription. Returns how many
    /// were consumed.
    pub fn pump_keys(&mut self) -> usize {
        let mut consumed = 0;
        while let Some(key) = self.key_sub.as_mut().and_then(Subscription::try_next) {
            if self.handle_key(key) {
                consumed += 1;
            }
        }
        consumed
    }

    /// Feed subscribed keys to [`Self::handle_key`] until the surface
    /// closes. Returns at once when no subscription is live.
    pub async fn run_keys(&mut self) {
        while let Some(sub) = self.key_sub.as_mut() {
            match sub.next().await {
                Some(key) => {
                    self.handle_key(key);
                }
                None => {
                    tracing::debug!("Key source closed");
                    self.key_sub = None;
                }
            }
        }
    }

    /// Entry recorded when playback starts.
    pub fn progress_entry(
        &self,
        target: EmbedTarget,
        details: &TitleDetails,
        season: Option<&SeasonDetails>,
    ) -> ContinueWatchingEntry {
        let (season_no, episode_no, runtime) = match target {
            EmbedTarget::Movie { .. } => (
                None,
                None,
                details
                    .runtime
                    .unwrap_or(self.settings.default_movie_runtime),
            ),
            EmbedTarget::Episode {
                season: s,
                episode: e,
                ..
            } => {
                let episode_runtime = season
                    .filter(|sd| sd.season_number == s)
                    .and_then(|sd| sd.episode(e))
                    .and_then(|ep| ep.runtime);
                let runtime = episode_runtime
                    .or_else(|| details.episode_run_time.iter().copied().find(|&m| m > 0))
                    .unwrap_or(self.settings.default_tv_runtime);
                (Some(s), Some(e), runtime)
            }
        };

        ContinueWatchingEntry {
            id: target.id(),
            media_type: target.media_type(),
            title: details.title.clone(),
            poster_path: details.poster_path.clone(),
            backdrop_path: details.backdrop_path.clone(),
            season: season_no,
            episode: episode_no,
            runtime_minutes: runtime,
            progress_percent: self.settings.initial_progress.min(100),
            last_watched_at: chrono::Utc::now(),
        }
    }
}

/// `M:SS` below an hour, `H:MM:SS` above.
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
