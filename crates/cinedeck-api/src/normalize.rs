//! Normalization of raw catalog records.
//!
//! Movies and shows arrive with different field names (`title` vs `name`,
//! `release_date` vs `first_air_date`) and list endpoints do not always
//! say which one a record is. The kind is resolved exactly once, here, into
//! a [`SourceRecord`]; [`normalize`] then produces the uniform
//! [`MediaItem`]. Nothing downstream re-derives the kind.

use crate::models::{
    CastMember, CrewMember, Extras, MediaDetails, MediaItem, MediaKind, MovieDetails,
    SeasonSummary, ShowDetails, Video, UNKNOWN_TITLE,
};
use crate::tmdb::types::RawMedia;

/// A raw record tagged with its resolved kind.
#[derive(Debug, Clone)]
pub enum SourceRecord {
    Movie(RawMedia),
    Show(RawMedia),
}

impl SourceRecord {
    /// Resolve the kind of a list record.
    ///
    /// An explicit `media_type` wins; otherwise a `name` field marks a show.
    /// Returns `None` for people, which multi-search mixes into its results.
    pub fn classify(raw: RawMedia) -> Option<Self> {
        let kind = match raw.media_type.as_deref() {
            Some("movie") => MediaKind::Movie,
            Some("tv") => MediaKind::Tv,
            Some("person") => return None,
            _ if raw.name.is_some() => MediaKind::Tv,
            _ => MediaKind::Movie,
        };
        Some(Self::with_kind(raw, kind))
    }

    /// Tag a record whose kind is known from the endpoint it came from.
    pub fn with_kind(raw: RawMedia, kind: MediaKind) -> Self {
        match kind {
            MediaKind::Movie => Self::Movie(raw),
            MediaKind::Tv => Self::Show(raw),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Movie(_) => MediaKind::Movie,
            Self::Show(_) => MediaKind::Tv,
        }
    }

    fn raw(&self) -> &RawMedia {
        match self {
            Self::Movie(raw) | Self::Show(raw) => raw,
        }
    }
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map a tagged record to the uniform shape.
pub fn normalize(record: &SourceRecord) -> MediaItem {
    let raw = record.raw();
    let (primary_title, primary_date, other_title, other_date) = match record {
        SourceRecord::Movie(r) => (&r.title, &r.release_date, &r.name, &r.first_air_date),
        SourceRecord::Show(r) => (&r.name, &r.first_air_date, &r.title, &r.release_date),
    };

    MediaItem {
        id: raw.id,
        display_title: non_empty(primary_title)
            .or_else(|| non_empty(other_title))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        release_date: non_empty(primary_date).or_else(|| non_empty(other_date)),
        kind: record.kind(),
        overview: raw.overview.clone().unwrap_or_default(),
        poster_path: non_empty(&raw.poster_path),
        backdrop_path: non_empty(&raw.backdrop_path),
        vote_average: raw.vote_average.unwrap_or_default(),
        vote_count: raw.vote_count.unwrap_or_default(),
        genre_ids: raw.genre_ids.clone(),
    }
}

/// Normalize a batch of list records, dropping anything that isn't media.
pub fn normalize_list(records: Vec<RawMedia>) -> Vec<MediaItem> {
    records
        .into_iter()
        .filter_map(SourceRecord::classify)
        .map(|r| normalize(&r))
        .collect()
}

/// Normalize a detail record fetched from the movie or tv endpoint.
pub fn normalize_details(record: SourceRecord) -> MediaDetails {
    let item = normalize(&record);
    match record {
        SourceRecord::Movie(raw) => MediaDetails::Movie(MovieDetails {
            item,
            runtime: raw.runtime,
            extras: extras(raw),
        }),
        SourceRecord::Show(raw) => MediaDetails::Show(ShowDetails {
            item,
            episode_run_time: raw.episode_run_time.clone(),
            number_of_seasons: raw.number_of_seasons,
            number_of_episodes: raw.number_of_episodes,
            seasons: raw
                .seasons
                .iter()
                .cloned()
                .map(SeasonSummary::from)
                .collect(),
            extras: extras(raw),
        }),
    }
}

fn extras(raw: RawMedia) -> Extras {
    let credits = raw.credits.unwrap_or_default();
    Extras {
        genres: raw.genres,
        production_countries: raw
            .production_countries
            .into_iter()
            .map(|c| c.name)
            .collect(),
        cast: credits.cast.into_iter().map(CastMember::from).collect(),
        crew: credits.crew.into_iter().map(CrewMember::from).collect(),
        videos: raw
            .videos
            .map(|v| v.results.into_iter().map(Video::from).collect())
            .unwrap_or_default(),
        similar: raw
            .similar
            .map(|s| normalize_list(s.results))
            .unwrap_or_default(),
    }
}
