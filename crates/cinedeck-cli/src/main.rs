mod view;

use std::path::PathBuf;
use std::sync::Arc;

use cinedeck_api::models::{MediaKind, TimeWindow};
use cinedeck_api::tmdb::TmdbClient;
use cinedeck_core::browser::{Browser, Intent};
use cinedeck_core::catalog::{DiscoverCategory, ListQuery};
use cinedeck_core::config::AppConfig;
use cinedeck_core::error::CoreError;
use cinedeck_core::playback::PlaybackState;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cinedeck", version, about = "Browse movies and shows from TMDB")]
struct Args {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TMDB API key; overrides the config file and TMDB_API_KEY.
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// First page of every home screen rail.
    Home,
    /// Page through a category.
    List {
        #[arg(value_enum)]
        category: Category,
        /// Number of pages to load.
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Search movies and shows.
    Search {
        query: String,
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },
    /// Show details and the embed URL for a movie or show.
    Show {
        /// `movie` or `tv`.
        kind: MediaKind,
        id: u64,
        #[arg(short, long)]
        season: Option<u32>,
        #[arg(short, long)]
        episode: Option<u32>,
        /// Embed provider id.
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Print the config file location, optionally writing the defaults there.
    Config {
        #[arg(long)]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Category {
    Trending,
    TrendingWeek,
    NowPlaying,
    Popular,
    TopRated,
    PopularTv,
    DiscoverMovies,
    DiscoverTv,
    EditorPicks,
}

impl From<Category> for ListQuery {
    fn from(category: Category) -> Self {
        match category {
            Category::Trending => ListQuery::Trending(TimeWindow::Day),
            Category::TrendingWeek => ListQuery::Trending(TimeWindow::Week),
            Category::NowPlaying => ListQuery::NowPlaying,
            Category::Popular => ListQuery::PopularMovies,
            Category::TopRated => ListQuery::TopRatedMovies,
            Category::PopularTv => ListQuery::PopularShows,
            Category::DiscoverMovies => ListQuery::Discover(DiscoverCategory::Movies),
            Category::DiscoverTv => ListQuery::Discover(DiscoverCategory::Tv),
            Category::EditorPicks => ListQuery::Discover(DiscoverCategory::EditorPicks),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cinedeck=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)?;
    config.apply_api_key_override(args.api_key.clone());

    if let Command::Config { init } = args.command {
        if init && !config_path.exists() {
            AppConfig::default().save_to(&config_path)?;
            info!(path = %config_path.display(), "Wrote default config");
        }
        println!("{}", config_path.display());
        return Ok(());
    }

    let client = TmdbClient::new(config.catalog.api_key.clone())
        .with_base_url(config.catalog.base_url.as_str())
        .with_language(config.catalog.language.as_str());
    let mut browser = Browser::from_config(Arc::new(client), &config)?;

    match args.command {
        Command::Home => {
            let rails = browser.home().await?;
            view::rail("Trending today", &rails.trending);
            view::rail("Now playing", &rails.now_playing);
            view::rail("Popular movies", &rails.popular_movies);
            view::rail("Popular TV", &rails.popular_shows);
        }
        Command::List { category, pages } => {
            browser.handle(Intent::SelectCategory(category.into())).await?;
            load_pages(&mut browser, pages).await?;
        }
        Command::Search { query, pages } => {
            browser.handle(Intent::Search(query)).await?;
            load_pages(&mut browser, pages).await?;
        }
        Command::Show {
            kind,
            id,
            season,
            episode,
            provider,
        } => {
            browser.handle(Intent::OpenMedia(id, kind)).await?;
            if let PlaybackState::Failed(e) = browser.playback().state() {
                return Err(e.clone().into());
            }
            if let Some(season) = season {
                browser.handle(Intent::SelectSeason(season)).await?;
            }
            if let Some(number) = episode {
                let found = browser.playback().selection().and_then(|s| {
                    s.episode_list
                        .iter()
                        .find(|e| e.episode_number == number)
                        .cloned()
                });
                if let Some(found) = found {
                    browser.handle(Intent::SelectEpisode(found)).await?;
                }
            }
            if let Some(provider) = provider {
                browser
                    .handle(Intent::SelectProvider(provider.as_str().into()))
                    .await?;
            }
            browser.handle(Intent::OpenPlayer).await?;
            view::session(browser.playback(), &config.catalog.image_base_url)?;
        }
        Command::Config { .. } => {}
    }

    Ok(())
}

/// Load up to `pages` pages of the current list, then print it.
async fn load_pages<C>(browser: &mut Browser<C>, pages: u32) -> Result<(), CoreError>
where
    C: cinedeck_api::CatalogService,
{
    for _ in 1..pages {
        if let Some(e) = &browser.page_state().error {
            return Err(e.clone().into());
        }
        browser.handle(Intent::LoadMore).await?;
    }
    if let Some(e) = &browser.page_state().error {
        return Err(e.clone().into());
    }
    view::list(browser.page_state());
    Ok(())
}
