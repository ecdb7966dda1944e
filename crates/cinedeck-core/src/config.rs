use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::CoreError;
use crate::key::ResourceKind;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `catalog.api_key`.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Top-level application configuration.
///
/// Sections or fields missing from the user file fall back to the built-in
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
    pub fetch_timeout_secs: u64,
    pub ttl: TtlConfig,
}

/// Freshness window per resource kind, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlConfig {
    pub trending: u64,
    pub now_playing: u64,
    pub popular_movies: u64,
    pub top_rated_movies: u64,
    pub popular_shows: u64,
    pub search: u64,
    pub discover: u64,
    pub movie_details: u64,
    pub show_details: u64,
    pub season: u64,
    pub recommendations: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub default_provider: String,
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    /// URL template with `{kind}` and `{id}` placeholders.
    pub template: String,
    /// Per-episode template with `{id}`, `{season}` and `{episode}`.
    pub episode_template: Option<String>,
}

impl AppConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path` (if it exists) merged over built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let mut config = if path.exists() {
            let user_str = std::fs::read_to_string(path)?;
            Self::from_user_str(&user_str)?
        } else {
            Self::default()
        };
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Parse a user config, overlaying it on the built-in defaults.
    pub fn from_user_str(user_str: &str) -> Result<Self, CoreError> {
        let parse = |s: &str| {
            toml::from_str::<toml::Table>(s).map_err(|e| CoreError::Config(e.to_string()))
        };
        let mut table = parse(DEFAULT_CONFIG)?;
        merge_tables(&mut table, parse(user_str)?);
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| CoreError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "cinedeck")
    }

    /// A non-empty override replaces the configured API key.
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.catalog.api_key = Some(key);
        }
    }

    /// Cache policy described by the `[cache]` section.
    pub fn cache_policy(&self) -> CachePolicy {
        let timeout = match self.cache.fetch_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        ResourceKind::ALL.iter().fold(
            CachePolicy::default()
                .with_capacity(self.cache.capacity)
                .with_fetch_timeout(timeout),
            |policy, &kind| policy.with_ttl(kind, self.cache.ttl.for_kind(kind)),
        )
    }
}

impl TtlConfig {
    pub fn for_kind(&self, kind: ResourceKind) -> Duration {
        Duration::from_secs(match kind {
            ResourceKind::Trending => self.trending,
            ResourceKind::NowPlaying => self.now_playing,
            ResourceKind::PopularMovies => self.popular_movies,
            ResourceKind::TopRatedMovies => self.top_rated_movies,
            ResourceKind::PopularShows => self.popular_shows,
            ResourceKind::Search => self.search,
            ResourceKind::Discover => self.discover,
            ResourceKind::MovieDetails => self.movie_details,
            ResourceKind::ShowDetails => self.show_details,
            ResourceKind::Season => self.season,
            ResourceKind::Recommendations => self.recommendations,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        AppConfig::default().playback
    }
}

/// Recursively overlay `overlay` on `base`. Arrays and scalars replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, incoming) in overlay {
        let merged = match (base.remove(&key), incoming) {
            (Some(toml::Value::Table(mut existing)), toml::Value::Table(incoming)) => {
                merge_tables(&mut existing, incoming);
                toml::Value::Table(existing)
            }
            (_, incoming) => incoming,
        };
        base.insert(key, merged);
    }
}
