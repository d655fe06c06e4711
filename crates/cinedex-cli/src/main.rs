use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use cinedex_api::MediaType;
use cinedex_core::config::AppConfig;
use cinedex_core::feed::Feed;
use cinedex_core::filter::SortOrder;
use cinedex_core::models::GridSize;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "cinedex")]
#[command(about = "Browse movies and TV, keep a watchlist, pick up where you left off")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Write logs to this file (rotated daily) instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through a catalog listing
    Browse {
        #[arg(value_enum)]
        feed: FeedArg,

        /// Genre slug for movies (action, sci-fi, ...)
        #[arg(long)]
        genre: Option<String>,

        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Comma-separated genre ids
        #[arg(long, value_delimiter = ',')]
        genres: Vec<u32>,

        /// Earliest release / first-air date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest release / first-air date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Release region for this listing (ISO 3166-1, e.g. US)
        #[arg(long)]
        region: Option<String>,

        /// Pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search titles
    Search {
        query: String,

        /// Search TV shows instead of movies
        #[arg(long)]
        tv: bool,

        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: WatchlistCommands,
    },
    /// Manage continue-watching
    Continue {
        #[command(subcommand)]
        cmd: ContinueCommands,
    },
    /// Print the embed address for a title and record it as watched
    Play {
        #[command(subcommand)]
        target: PlayTarget,
    },
    /// Show or set the poster grid size for a page
    Grid {
        /// Page scope (movies, tv, anime, ...)
        #[arg(default_value = "movies")]
        scope: String,

        #[arg(value_enum)]
        size: Option<GridArg>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    List,
    Add {
        #[arg(value_enum)]
        media: MediaArg,
        id: u64,
    },
    Remove {
        #[arg(value_enum)]
        media: MediaArg,
        id: u64,
    },
    Clear,
}

#[derive(Subcommand)]
enum ContinueCommands {
    List,
    Remove {
        #[arg(value_enum)]
        media: MediaArg,
        id: u64,
    },
    Clear,
}

#[derive(Subcommand)]
enum PlayTarget {
    Movie {
        id: u64,
    },
    Tv {
        id: u64,
        #[arg(long, requires = "episode")]
        season: Option<u32>,
        #[arg(long, requires = "season")]
        episode: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print config and database locations
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedArg {
    Movies,
    Tv,
    Anime,
    ComingMovies,
    ComingTv,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Popular,
    LeastPopular,
    TopRated,
    LowestRated,
    Newest,
    Oldest,
    Az,
    Za,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Popular => Self::PopularityDesc,
            SortArg::LeastPopular => Self::PopularityAsc,
            SortArg::TopRated => Self::RatingDesc,
            SortArg::LowestRated => Self::RatingAsc,
            SortArg::Newest => Self::ReleaseDateDesc,
            SortArg::Oldest => Self::ReleaseDateAsc,
            SortArg::Az => Self::TitleAsc,
            SortArg::Za => Self::TitleDesc,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MediaArg {
    Movie,
    Tv,
}

impl From<MediaArg> for MediaType {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::Movie => Self::Movie,
            MediaArg::Tv => Self::Tv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GridArg {
    Small,
    Medium,
    Large,
}

impl From<GridArg> for GridSize {
    fn from(arg: GridArg) -> Self {
        match arg {
            GridArg::Small => Self::Small,
            GridArg::Medium => Self::Medium,
            GridArg::Large => Self::Large,
        }
    }
}

fn feed_of(arg: FeedArg, genre: Option<String>) -> Feed {
    match arg {
        FeedArg::Movies => Feed::Movies { genre_slug: genre },
        FeedArg::Tv => Feed::Tv,
        FeedArg::Anime => Feed::Anime,
        FeedArg::ComingMovies => Feed::ComingSoonMovies,
        FeedArg::ComingTv => Feed::ComingSoonTv,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let config = AppConfig::load()?;

    match cli.command {
        Commands::Browse {
            feed,
            genre,
            sort,
            genres,
            from,
            to,
            region,
            pages,
        } => {
            if genre.is_some() && !matches!(feed, FeedArg::Movies) {
                tracing::warn!("--genre only applies to the movies feed");
            }
            let mut filters = cinedex_core::filter::FilterState::new()
                .with_genres(genres)
                .with_date_range(from, to);
            if let Some(sort) = sort {
                filters = filters.with_sort(sort.into());
            }
            if let Some(region) = region {
                filters = filters.with_region(region);
            }
            commands::browse(&config, feed_of(feed, genre), filters, pages).await
        }
        Commands::Search { query, tv, pages } => {
            let media_type = if tv { MediaType::Tv } else { MediaType::Movie };
            commands::search(&config, media_type, query, pages).await
        }
        Commands::Watchlist { cmd } => match cmd {
            WatchlistCommands::List => commands::watchlist_list(),
            WatchlistCommands::Add { media, id } => {
                commands::watchlist_add(&config, media.into(), id).await
            }
            WatchlistCommands::Remove { media, id } => {
                commands::watchlist_remove(media.into(), id)
            }
            WatchlistCommands::Clear => commands::watchlist_clear(),
        },
        Commands::Continue { cmd } => match cmd {
            ContinueCommands::List => commands::continue_list(),
            ContinueCommands::Remove { media, id } => commands::continue_remove(media.into(), id),
            ContinueCommands::Clear => commands::continue_clear(),
        },
        Commands::Play { target } => match target {
            PlayTarget::Movie { id } => commands::play_movie(&config, id).await,
            PlayTarget::Tv {
                id,
                season,
                episode,
            } => {
                let requested = season.zip(episode);
                commands::play_tv(&config, id, requested).await
            }
        },
        Commands::Grid { scope, size } => {
            commands::grid(&config, &scope, size.map(GridSize::from))
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config_show(&config),
            ConfigCommands::Path => {
                commands::config_path();
                Ok(())
            }
        },
    }
}
