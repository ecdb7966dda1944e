//! In-memory catalog used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use cinedeck_api::models::{
    EpisodeRef, Extras, MediaDetails, MediaItem, MediaKind, MediaPage, MovieDetails,
    SeasonDetails, SeasonSummary, ShowDetails, TimeWindow,
};
use cinedeck_api::{CatalogError, CatalogService};

/// Detail requests for this id answer 404.
pub const MISSING_ID: u64 = 404;

pub const SEASONS_PER_SHOW: u32 = 3;
pub const EPISODES_PER_SEASON: u32 = 4;

/// Deterministic catalog: every list has `total_pages` pages of `per_page`
/// items, every show has three seasons of four episodes.
pub struct FakeCatalog {
    pub total_pages: u32,
    pub per_page: u64,
    pub delay: Duration,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub season_calls: AtomicUsize,
    pub recommendation_calls: AtomicUsize,
    /// Number of upcoming list requests that fail with a network error.
    pub failing_lists: AtomicUsize,
    pub fail_recommendations: AtomicBool,
    season_delays: Mutex<HashMap<u32, Duration>>,
    failing_seasons: Mutex<HashSet<u32>>,
    last_list_call: Mutex<Option<String>>,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self {
            total_pages: 50,
            per_page: 20,
            delay: Duration::from_millis(10),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            season_calls: AtomicUsize::new(0),
            recommendation_calls: AtomicUsize::new(0),
            failing_lists: AtomicUsize::new(0),
            fail_recommendations: AtomicBool::new(false),
            season_delays: Mutex::new(HashMap::new()),
            failing_seasons: Mutex::new(HashSet::new()),
            last_list_call: Mutex::new(None),
        }
    }
}

impl FakeCatalog {
    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.total_pages = total_pages;
        self
    }

    pub fn delay_season(&self, season: u32, delay: Duration) {
        self.season_delays.lock().unwrap().insert(season, delay);
    }

    pub fn fail_season(&self, season: u32) {
        self.failing_seasons.lock().unwrap().insert(season);
    }

    pub fn fail_next_lists(&self, count: usize) {
        self.failing_lists.store(count, Ordering::SeqCst);
    }

    pub fn last_list_call(&self) -> Option<String> {
        self.last_list_call.lock().unwrap().clone()
    }

    async fn page(
        &self,
        endpoint: String,
        kind: MediaKind,
        page: u32,
    ) -> Result<MediaPage, CatalogError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_list_call.lock().unwrap() = Some(endpoint);
        tokio::time::sleep(self.delay).await;

        let failed = self
            .failing_lists
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CatalogError::Network("connection reset".into()));
        }

        let first = u64::from(page.saturating_sub(1)) * self.per_page + 1;
        Ok(MediaPage {
            page,
            items: (first..first + self.per_page).map(|id| item(id, kind)).collect(),
            total_pages: self.total_pages,
            total_results: self.total_pages * self.per_page as u32,
        })
    }
}

pub fn item(id: u64, kind: MediaKind) -> MediaItem {
    MediaItem {
        id,
        display_title: format!("Title {id}"),
        release_date: Some("2021-09-15".into()),
        kind,
        overview: String::new(),
        poster_path: None,
        backdrop_path: None,
        vote_average: 7.5,
        vote_count: 100,
        genre_ids: vec![18],
    }
}

pub fn episode(show_id: u64, season: u32, number: u32) -> EpisodeRef {
    EpisodeRef {
        id: show_id * 1000 + u64::from(season) * 100 + u64::from(number),
        episode_number: number,
        name: format!("S{season}E{number}"),
        overview: String::new(),
        still_path: None,
        runtime: Some(50),
        vote_average: 8.0,
        air_date: None,
    }
}

impl CatalogService for FakeCatalog {
    async fn trending(&self, window: TimeWindow, page: u32) -> Result<MediaPage, CatalogError> {
        self.page(format!("trending/{}", window.as_str()), MediaKind::Movie, page)
            .await
    }

    async fn now_playing(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.page("movie/now_playing".into(), MediaKind::Movie, page).await
    }

    async fn popular_movies(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.page("movie/popular".into(), MediaKind::Movie, page).await
    }

    async fn top_rated_movies(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.page("movie/top_rated".into(), MediaKind::Movie, page).await
    }

    async fn popular_shows(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.page("tv/popular".into(), MediaKind::Tv, page).await
    }

    async fn search_multi(&self, query: &str, page: u32) -> Result<MediaPage, CatalogError> {
        self.page(format!("search/{query}"), MediaKind::Movie, page).await
    }

    async fn discover(&self, kind: MediaKind, page: u32) -> Result<MediaPage, CatalogError> {
        self.page(format!("discover/{kind}"), kind, page).await
    }

    async fn details(&self, kind: MediaKind, id: u64) -> Result<MediaDetails, CatalogError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if id == MISSING_ID {
            return Err(CatalogError::NotFound(format!("/{kind}/{id}")));
        }

        Ok(match kind {
            MediaKind::Movie => MediaDetails::Movie(MovieDetails {
                item: item(id, kind),
                runtime: Some(136),
                extras: Extras::default(),
            }),
            MediaKind::Tv => MediaDetails::Show(ShowDetails {
                item: item(id, kind),
                episode_run_time: vec![50],
                number_of_seasons: Some(SEASONS_PER_SHOW),
                number_of_episodes: Some(SEASONS_PER_SHOW * EPISODES_PER_SEASON),
                seasons: (1..=SEASONS_PER_SHOW)
                    .map(|n| SeasonSummary {
                        season_number: n,
                        name: format!("Season {n}"),
                        episode_count: EPISODES_PER_SEASON,
                        air_date: None,
                        poster_path: None,
                    })
                    .collect(),
                extras: Extras::default(),
            }),
        })
    }

    async fn season(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> Result<SeasonDetails, CatalogError> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .season_delays
            .lock()
            .unwrap()
            .get(&season_number)
            .copied()
            .unwrap_or(self.delay);
        tokio::time::sleep(delay).await;

        if self.failing_seasons.lock().unwrap().contains(&season_number) {
            return Err(CatalogError::Http {
                status: 500,
                message: "Internal error".into(),
            });
        }

        Ok(SeasonDetails {
            show_id,
            season_number,
            name: format!("Season {season_number}"),
            overview: String::new(),
            air_date: None,
            poster_path: None,
            episodes: (1..=EPISODES_PER_SEASON)
                .map(|n| episode(show_id, season_number, n))
                .collect(),
        })
    }

    async fn recommendations(
        &self,
        kind: MediaKind,
        id: u64,
        page: u32,
    ) -> Result<MediaPage, CatalogError> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_recommendations.load(Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
            return Err(CatalogError::Network("unreachable".into()));
        }
        self.page(format!("{kind}/{id}/recommendations"), kind, page)
            .await
    }
}
