use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The kind of resource a request fetches. Determines the freshness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Trending,
    NowPlaying,
    PopularMovies,
    TopRatedMovies,
    PopularShows,
    Search,
    Discover,
    MovieDetails,
    ShowDetails,
    Season,
    Recommendations,
}

impl ResourceKind {
    pub const ALL: &[ResourceKind] = &[
        Self::Trending,
        Self::NowPlaying,
        Self::PopularMovies,
        Self::TopRatedMovies,
        Self::PopularShows,
        Self::Search,
        Self::Discover,
        Self::MovieDetails,
        Self::ShowDetails,
        Self::Season,
        Self::Recommendations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::NowPlaying => "now_playing",
            Self::PopularMovies => "popular_movies",
            Self::TopRatedMovies => "top_rated_movies",
            Self::PopularShows => "popular_shows",
            Self::Search => "search",
            Self::Discover => "discover",
            Self::MovieDetails => "movie_details",
            Self::ShowDetails => "show_details",
            Self::Season => "season",
            Self::Recommendations => "recommendations",
        }
    }

    /// Built-in time-to-live, used when the config doesn't override it.
    pub fn default_ttl(self) -> Duration {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        Duration::from_secs(match self {
            Self::Trending | Self::NowPlaying => HOUR,
            Self::PopularMovies | Self::PopularShows => 4 * HOUR,
            Self::TopRatedMovies => 12 * HOUR,
            Self::Search => 5 * MINUTE,
            Self::Discover | Self::Season | Self::Recommendations => HOUR,
            // Details are revalidated in the background on every read.
            Self::MovieDetails | Self::ShowDetails => 0,
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical identity of a cacheable query: a resource kind plus an ordered
/// list of parameters. Two keys are equal iff both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    kind: ResourceKind,
    params: Vec<(&'static str, String)>,
}

impl RequestKey {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    /// Append a parameter. Order is significant for equality.
    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Look up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_covers_kind_and_params() {
        let season = |kind, n: u32| {
            RequestKey::new(kind)
                .param("show", 1399)
                .param("season", n)
        };
        let a = season(ResourceKind::Season, 1);
        let b = season(ResourceKind::Season, 1);
        let c = season(ResourceKind::Season, 2);
        let d = season(ResourceKind::ShowDetails, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_display() {
        let key = RequestKey::new(ResourceKind::Search)
            .param("query", "dune")
            .param("page", 2);
        assert_eq!(key.to_string(), "search?query=dune&page=2");
        assert_eq!(
            RequestKey::new(ResourceKind::NowPlaying).to_string(),
            "now_playing"
        );
        assert_eq!(key.get("page"), Some("2"));
    }

    #[test]
    fn test_default_ttls() {
        assert_eq!(ResourceKind::Trending.default_ttl(), Duration::from_secs(3600));
        assert_eq!(ResourceKind::PopularMovies.default_ttl(), Duration::from_secs(4 * 3600));
        assert_eq!(ResourceKind::TopRatedMovies.default_ttl(), Duration::from_secs(12 * 3600));
        assert_eq!(ResourceKind::Search.default_ttl(), Duration::from_secs(300));
        assert_eq!(ResourceKind::MovieDetails.default_ttl(), Duration::ZERO);
    }
}
