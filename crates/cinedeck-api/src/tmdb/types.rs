use serde::Deserialize;

use crate::models::{
    CastMember, CrewMember, EpisodeRef, Genre, SeasonDetails, SeasonSummary, Video,
};

// ── Envelopes ────────────────────────────────────────────────────

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub status_message: Option<String>,
}

// ── Media records ────────────────────────────────────────────────

/// A movie or show exactly as the catalog sends it.
///
/// List endpoints only fill the summary fields; detail endpoints add the
/// rest. Shape differences between movies and shows are resolved in
/// [`crate::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMedia {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub media_type: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub genre_ids: Vec<u32>,

    // Detail-only fields.
    pub runtime: Option<u32>,
    pub genres: Vec<Genre>,
    pub production_countries: Vec<RawCountry>,
    pub credits: Option<RawCredits>,
    pub videos: Option<RawVideos>,
    pub similar: Option<ListResponse<RawMedia>>,
    pub episode_run_time: Vec<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub seasons: Vec<RawSeasonSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCountry {
    pub iso_3166_1: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCredits {
    pub cast: Vec<RawCast>,
    pub crew: Vec<RawCrew>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCast {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCrew {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVideos {
    pub results: Vec<RawVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVideo {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub site: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: u32,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

// ── Seasons ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RawSeason {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub episodes: Vec<RawEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEpisode {
    pub id: u64,
    pub episode_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub still_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub air_date: Option<String>,
}

// ── Conversions ──────────────────────────────────────────────────

impl From<RawCast> for CastMember {
    fn from(c: RawCast) -> Self {
        Self {
            id: c.id,
            name: c.name,
            character: c.character.unwrap_or_default(),
            profile_path: c.profile_path,
        }
    }
}

impl From<RawCrew> for CrewMember {
    fn from(c: RawCrew) -> Self {
        Self {
            id: c.id,
            name: c.name,
            job: c.job.unwrap_or_default(),
        }
    }
}

impl From<RawVideo> for Video {
    fn from(v: RawVideo) -> Self {
        Self {
            key: v.key,
            name: v.name,
            kind: v.type_,
            site: v.site,
        }
    }
}

impl From<RawSeasonSummary> for SeasonSummary {
    fn from(s: RawSeasonSummary) -> Self {
        Self {
            name: s
                .name
                .unwrap_or_else(|| format!("Season {}", s.season_number)),
            season_number: s.season_number,
            episode_count: s.episode_count,
            air_date: s.air_date,
            poster_path: s.poster_path,
        }
    }
}

impl From<RawEpisode> for EpisodeRef {
    fn from(e: RawEpisode) -> Self {
        Self {
            id: e.id,
            name: e
                .name
                .unwrap_or_else(|| format!("Episode {}", e.episode_number)),
            episode_number: e.episode_number,
            overview: e.overview.unwrap_or_default(),
            still_path: e.still_path,
            runtime: e.runtime,
            vote_average: e.vote_average.unwrap_or_default(),
            air_date: e.air_date,
        }
    }
}

impl RawSeason {
    pub fn into_season_details(self, show_id: u64) -> SeasonDetails {
        SeasonDetails {
            show_id,
            name: self
                .name
                .unwrap_or_else(|| format!("Season {}", self.season_number)),
            season_number: self.season_number,
            overview: self.overview.unwrap_or_default(),
            air_date: self.air_date,
            poster_path: self.poster_path,
            episodes: self.episodes.into_iter().map(EpisodeRef::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_list_response() {
        let json = r#"{
            "page": 1,
            "results": [
                {
                    "id": 27205,
                    "title": "Inception",
                    "overview": "Cobb, a skilled thief...",
                    "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
                    "release_date": "2010-07-15",
                    "vote_average": 8.4,
                    "vote_count": 35000,
                    "genre_ids": [28, 878, 12]
                },
                {
                    "id": 1399,
                    "name": "Game of Thrones",
                    "media_type": "tv",
                    "first_air_date": "2011-04-17",
                    "vote_average": 8.5
                }
            ],
            "total_pages": 50,
            "total_results": 1000
        }"#;

        let resp: ListResponse<RawMedia> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.page, 1);
        assert_eq!(resp.total_pages, 50);
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[0].title.as_deref(), Some("Inception"));
        assert_eq!(resp.results[0].genre_ids, vec![28, 878, 12]);
        assert_eq!(resp.results[1].media_type.as_deref(), Some("tv"));
        assert!(resp.results[1].overview.is_none());
    }

    #[test]
    fn test_deserialize_season() {
        let json = r#"{
            "_id": "5256c89f19c2956ff6046d47",
            "air_date": "2011-04-17",
            "name": "Season 1",
            "overview": "",
            "id": 3624,
            "poster_path": null,
            "season_number": 1,
            "episodes": [
                { "id": 63056, "episode_number": 1, "name": "Winter Is Coming", "overview": "", "vote_average": 7.9, "runtime": 62 },
                { "id": 63057, "episode_number": 2, "name": null, "vote_count": 100 }
            ]
        }"#;

        let raw: RawSeason = serde_json::from_str(json).unwrap();
        let season = raw.into_season_details(1399);
        assert_eq!(season.show_id, 1399);
        assert_eq!(season.season_number, 1);
        assert_eq!(season.episodes.len(), 2);
        assert_eq!(season.episodes[0].name, "Winter Is Coming");
        assert_eq!(season.episodes[0].runtime, Some(62));
        assert_eq!(season.episodes[1].name, "Episode 2");
        assert_eq!(season.episodes[1].vote_average, 0.0);
    }

    #[test]
    fn test_deserialize_error_body() {
        let json = r#"{"status_code": 34, "status_message": "The resource you requested could not be found.", "success": false}"#;
        let body: ErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(
            body.status_message.as_deref(),
            Some("The resource you requested could not be found.")
        );
    }
}
