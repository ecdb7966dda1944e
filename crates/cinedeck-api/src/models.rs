//! Normalized catalog records shared by the client and its consumers.
//!
//! Everything here has a uniform shape regardless of whether the upstream
//! record described a movie or a show. See [`crate::normalize`] for how the
//! raw wire records are mapped into these types.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Title used when the source record carries neither a title nor a name.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Number of cast members shown on a detail view.
const MAIN_CAST_LEN: usize = 6;

/// Whether a record is a movie or a TV show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment used by the catalog API and the embed providers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv" | "show" => Ok(Self::Tv),
            other => Err(format!("unknown media kind: {other}")),
        }
    }
}

/// Time window for the trending endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

/// A media item with a uniform shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: u64,
    pub display_title: String,
    pub release_date: Option<String>,
    pub kind: MediaKind,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f32,
    pub vote_count: u32,
    pub genre_ids: Vec<u32>,
}

impl MediaItem {
    /// Year parsed from the release (or first air) date.
    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .map(|d| d.year())
    }

    /// Overview text, or a placeholder when the catalog has none.
    pub fn overview_or_placeholder(&self) -> &str {
        if self.overview.trim().is_empty() {
            "No description available"
        } else {
            &self.overview
        }
    }

    /// Up to two genre names for a grid card.
    pub fn card_genres(&self) -> Vec<&'static str> {
        genre_names(self.kind, &self.genre_ids)
            .into_iter()
            .take(2)
            .collect()
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaPage {
    pub page: u32,
    pub items: Vec<MediaItem>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl MediaPage {
    /// An exhausted page with no results.
    pub fn empty() -> Self {
        Self {
            page: 1,
            items: Vec::new(),
            total_pages: 1,
            total_results: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    pub job: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub name: String,
    pub kind: String,
    pub site: String,
}

impl Video {
    pub fn watch_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// Credits, videos and similar titles appended to a detail response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Extras {
    pub genres: Vec<Genre>,
    pub production_countries: Vec<String>,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    pub videos: Vec<Video>,
    pub similar: Vec<MediaItem>,
}

impl Extras {
    /// First YouTube trailer, if any.
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .iter()
            .find(|v| v.kind == "Trailer" && v.site == "YouTube")
    }

    pub fn director(&self) -> Option<&CrewMember> {
        self.crew.iter().find(|c| c.job == "Director")
    }

    pub fn main_cast(&self) -> &[CastMember] {
        &self.cast[..self.cast.len().min(MAIN_CAST_LEN)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub item: MediaItem,
    pub runtime: Option<u32>,
    pub extras: Extras,
}

/// Summary of a season as listed on the show itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: String,
    pub episode_count: u32,
    pub air_date: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetails {
    pub item: MediaItem,
    pub episode_run_time: Vec<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub seasons: Vec<SeasonSummary>,
    pub extras: Extras,
}

/// Movie or show detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaDetails {
    Movie(MovieDetails),
    Show(ShowDetails),
}

impl MediaDetails {
    pub fn item(&self) -> &MediaItem {
        match self {
            Self::Movie(m) => &m.item,
            Self::Show(s) => &s.item,
        }
    }

    pub fn extras(&self) -> &Extras {
        match self {
            Self::Movie(m) => &m.extras,
            Self::Show(s) => &s.extras,
        }
    }

    /// Runtime in minutes (first episode run time for shows).
    pub fn runtime(&self) -> Option<u32> {
        match self {
            Self::Movie(m) => m.runtime,
            Self::Show(s) => s.episode_run_time.first().copied(),
        }
        .filter(|&m| m > 0)
    }

    /// Season numbers available for selection; empty for movies.
    pub fn season_numbers(&self) -> Vec<u32> {
        match self {
            Self::Movie(_) => Vec::new(),
            Self::Show(show) => show
                .seasons
                .iter()
                .map(|s| s.season_number)
                .collect(),
        }
    }
}

/// An episode within a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub id: u64,
    pub episode_number: u32,
    pub name: String,
    pub overview: String,
    pub still_path: Option<String>,
    pub runtime: Option<u32>,
    pub vote_average: f32,
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetails {
    pub show_id: u64,
    pub season_number: u32,
    pub name: String,
    pub overview: String,
    pub air_date: Option<String>,
    pub poster_path: Option<String>,
    pub episodes: Vec<EpisodeRef>,
}

/// Format a runtime in minutes as `"2h 5m"`.
pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Build an image URL from a catalog image path.
pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{}/{size}{p}", base.trim_end_matches('/')))
}

const MOVIE_GENRES: &[(u32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Sci-Fi"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

const TV_GENRES: &[(u32, &str)] = &[
    (10759, "Action & Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (10762, "Kids"),
    (9648, "Mystery"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
    (37, "Western"),
];

/// Map genre ids to names, skipping ids the table doesn't know.
pub fn genre_names(kind: MediaKind, ids: &[u32]) -> Vec<&'static str> {
    let table = match kind {
        MediaKind::Movie => MOVIE_GENRES,
        MediaKind::Tv => TV_GENRES,
    };
    ids.iter()
        .filter_map(|id| table.iter().find(|(g, _)| g == id).map(|(_, name)| *name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: MediaKind, genre_ids: Vec<u32>) -> MediaItem {
        MediaItem {
            id: 1,
            display_title: "Dune".into(),
            release_date: Some("2021-09-15".into()),
            kind,
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.8,
            vote_count: 100,
            genre_ids,
        }
    }

    #[test]
    fn test_release_year() {
        assert_eq!(item(MediaKind::Movie, vec![]).release_year(), Some(2021));

        let mut undated = item(MediaKind::Movie, vec![]);
        undated.release_date = Some(String::new());
        assert_eq!(undated.release_year(), None);
    }

    #[test]
    fn test_card_genres_use_kind_table() {
        let movie = item(MediaKind::Movie, vec![878, 12, 18]);
        assert_eq!(movie.card_genres(), vec!["Sci-Fi", "Adventure"]);

        // 10759 only exists in the TV table.
        let show = item(MediaKind::Tv, vec![10759, 99999, 18]);
        assert_eq!(show.card_genres(), vec!["Action & Adventure", "Drama"]);
    }

    #[test]
    fn test_overview_placeholder() {
        assert_eq!(
            item(MediaKind::Movie, vec![]).overview_or_placeholder(),
            "No description available"
        );
    }

    #[test]
    fn test_format_runtime() {
        assert_eq!(format_runtime(125), "2h 5m");
        assert_eq!(format_runtime(45), "0h 45m");
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("https://image.tmdb.org/t/p/", "w500", Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(image_url("https://image.tmdb.org/t/p", "w500", None), None);
    }

    #[test]
    fn test_extras_helpers() {
        let extras = Extras {
            crew: vec![
                CrewMember {
                    id: 1,
                    name: "A".into(),
                    job: "Producer".into(),
                },
                CrewMember {
                    id: 2,
                    name: "Denis Villeneuve".into(),
                    job: "Director".into(),
                },
            ],
            videos: vec![
                Video {
                    key: "t1".into(),
                    name: "Teaser".into(),
                    kind: "Teaser".into(),
                    site: "YouTube".into(),
                },
                Video {
                    key: "t2".into(),
                    name: "Trailer".into(),
                    kind: "Trailer".into(),
                    site: "YouTube".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            extras.director().map(|d| d.name.as_str()),
            Some("Denis Villeneuve")
        );
        let trailer = extras.trailer().unwrap();
        assert_eq!(
            trailer.watch_url().as_deref(),
            Some("https://www.youtube.com/watch?v=t2")
        );
        assert!(extras.main_cast().is_empty());
    }

    #[test]
    fn test_media_kind_parse() {
        assert_eq!("TV".parse::<MediaKind>(), Ok(MediaKind::Tv));
        assert_eq!("movie".parse::<MediaKind>(), Ok(MediaKind::Movie));
        assert!("person".parse::<MediaKind>().is_err());
    }
}
