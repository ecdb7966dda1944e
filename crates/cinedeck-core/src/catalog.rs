//! Catalog queries routed through the query cache.
//!
//! [`Catalog`] pairs a [`CatalogService`] with one cache per value type and
//! owns the mapping from a query to its [`RequestKey`]. Controllers never
//! talk to the service directly.

use std::sync::Arc;

use cinedeck_api::models::{MediaDetails, MediaKind, MediaPage, SeasonDetails, TimeWindow};
use cinedeck_api::CatalogService;
use tracing::debug;

use crate::cache::{CachePolicy, FetchResult, Lookup, QueryCache};
use crate::key::{RequestKey, ResourceKind};

/// Sub-views of the discover screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoverCategory {
    Movies,
    Tv,
    /// Weekly trending across movies and shows.
    EditorPicks,
}

impl DiscoverCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Tv => "tv",
            Self::EditorPicks => "editor_picks",
        }
    }
}

/// A paginated list the user can browse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListQuery {
    Trending(TimeWindow),
    NowPlaying,
    PopularMovies,
    TopRatedMovies,
    PopularShows,
    Search(String),
    Discover(DiscoverCategory),
    Recommendations(MediaKind, u64),
}

impl ListQuery {
    /// Cache key for one page of this list.
    pub fn key(&self, page: u32) -> RequestKey {
        let key = match self {
            Self::Trending(window) => {
                RequestKey::new(ResourceKind::Trending).param("window", window.as_str())
            }
            Self::NowPlaying => RequestKey::new(ResourceKind::NowPlaying),
            Self::PopularMovies => RequestKey::new(ResourceKind::PopularMovies),
            Self::TopRatedMovies => RequestKey::new(ResourceKind::TopRatedMovies),
            Self::PopularShows => RequestKey::new(ResourceKind::PopularShows),
            Self::Search(text) => RequestKey::new(ResourceKind::Search).param("query", text.trim()),
            Self::Discover(category) => {
                RequestKey::new(ResourceKind::Discover).param("category", category.as_str())
            }
            Self::Recommendations(kind, id) => RequestKey::new(ResourceKind::Recommendations)
                .param("kind", kind)
                .param("id", id),
        };
        key.param("page", page)
    }

    /// Whether the query can be answered without asking the catalog.
    fn is_blank(&self) -> bool {
        matches!(self, Self::Search(text) if text.trim().is_empty())
    }
}

fn details_key(kind: MediaKind, id: u64) -> RequestKey {
    let resource = match kind {
        MediaKind::Movie => ResourceKind::MovieDetails,
        MediaKind::Tv => ResourceKind::ShowDetails,
    };
    RequestKey::new(resource).param("id", id)
}

fn season_key(show_id: u64, season: u32) -> RequestKey {
    RequestKey::new(ResourceKind::Season)
        .param("show", show_id)
        .param("season", season)
}

/// Cached access to a catalog service. Clones share the client and caches.
pub struct Catalog<C> {
    client: Arc<C>,
    pages: QueryCache<MediaPage>,
    details: QueryCache<MediaDetails>,
    seasons: QueryCache<SeasonDetails>,
}

impl<C> Clone for Catalog<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            pages: self.pages.clone(),
            details: self.details.clone(),
            seasons: self.seasons.clone(),
        }
    }
}

impl<C: CatalogService> Catalog<C> {
    pub fn new(client: Arc<C>, policy: CachePolicy) -> Self {
        Self {
            client,
            pages: QueryCache::new(policy.clone()),
            details: QueryCache::new(policy.clone()),
            seasons: QueryCache::new(policy),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn pages(&self) -> &QueryCache<MediaPage> {
        &self.pages
    }

    pub fn details_cache(&self) -> &QueryCache<MediaDetails> {
        &self.details
    }

    pub fn seasons(&self) -> &QueryCache<SeasonDetails> {
        &self.seasons
    }

    /// Read one page of a list.
    pub fn list(&self, query: &ListQuery, page: u32) -> Lookup<MediaPage> {
        if query.is_blank() {
            debug!("Blank search, skipping catalog");
            return Lookup::Fresh(Arc::new(MediaPage::empty()));
        }

        let client = Arc::clone(&self.client);
        let owned = query.clone();
        self.pages.get(query.key(page), move || async move {
            match owned {
                ListQuery::Trending(window) => client.trending(window, page).await,
                ListQuery::NowPlaying => client.now_playing(page).await,
                ListQuery::PopularMovies => client.popular_movies(page).await,
                ListQuery::TopRatedMovies => client.top_rated_movies(page).await,
                ListQuery::PopularShows => client.popular_shows(page).await,
                ListQuery::Search(text) => client.search_multi(text.trim(), page).await,
                ListQuery::Discover(DiscoverCategory::Movies) => {
                    client.discover(MediaKind::Movie, page).await
                }
                ListQuery::Discover(DiscoverCategory::Tv) => {
                    client.discover(MediaKind::Tv, page).await
                }
                ListQuery::Discover(DiscoverCategory::EditorPicks) => {
                    client.trending(TimeWindow::Week, page).await
                }
                ListQuery::Recommendations(kind, id) => {
                    client.recommendations(kind, id, page).await
                }
            }
        })
    }

    pub async fn fetch_list(&self, query: &ListQuery, page: u32) -> FetchResult<MediaPage> {
        self.list(query, page).resolve().await
    }

    /// Read the detail record for a movie or show.
    pub fn details(&self, kind: MediaKind, id: u64) -> Lookup<MediaDetails> {
        let client = Arc::clone(&self.client);
        self.details
            .get(details_key(kind, id), move || async move { client.details(kind, id).await })
    }

    pub async fn fetch_details(&self, kind: MediaKind, id: u64) -> FetchResult<MediaDetails> {
        self.details(kind, id).resolve().await
    }

    /// Read the episode list of one season.
    pub fn season(&self, show_id: u64, season: u32) -> Lookup<SeasonDetails> {
        let client = Arc::clone(&self.client);
        self.seasons.get(season_key(show_id, season), move || async move {
            client.season(show_id, season).await
        })
    }

    pub async fn fetch_season(&self, show_id: u64, season: u32) -> FetchResult<SeasonDetails> {
        self.season(show_id, season).resolve().await
    }

    /// Drop every cached page, detail record and season.
    pub fn clear(&self) {
        self.pages.clear();
        self.details.clear();
        self.seasons.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use futures::future::join_all;

    use super::*;
    use crate::testing::FakeCatalog;

    fn catalog() -> (Arc<FakeCatalog>, Catalog<FakeCatalog>) {
        let fake = Arc::new(FakeCatalog::default());
        let catalog = Catalog::new(Arc::clone(&fake), CachePolicy::default());
        (fake, catalog)
    }

    #[test]
    fn test_keys_include_page_and_params() {
        assert_eq!(
            ListQuery::Search(" dune ".into()).key(2).to_string(),
            "search?query=dune&page=2"
        );
        assert_eq!(
            ListQuery::Trending(TimeWindow::Week).key(1).to_string(),
            "trending?window=week&page=1"
        );
        assert_eq!(
            ListQuery::Recommendations(MediaKind::Tv, 1399).key(1).to_string(),
            "recommendations?kind=tv&id=1399&page=1"
        );
        assert_ne!(ListQuery::PopularMovies.key(1), ListQuery::PopularMovies.key(2));
        assert_eq!(details_key(MediaKind::Movie, 7).kind(), ResourceKind::MovieDetails);
        assert_eq!(season_key(1399, 2).to_string(), "season?show=1399&season=2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_list_reads_hit_the_network_once() {
        let (fake, catalog) = catalog();

        let reads = (0..5).map(|_| catalog.fetch_list(&ListQuery::PopularMovies, 1));
        let pages = join_all(reads).await;

        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 1);
        for page in pages {
            assert_eq!(page.unwrap().items.len(), 20);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_search_skips_network() {
        let (fake, catalog) = catalog();

        let lookup = catalog.list(&ListQuery::Search("   ".into()), 1);
        let page = lookup.value().cloned().unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 0);
        assert!(catalog.pages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_editor_picks_use_weekly_trending() {
        let (fake, catalog) = catalog();

        catalog
            .fetch_list(&ListQuery::Discover(DiscoverCategory::EditorPicks), 1)
            .await
            .unwrap();
        assert_eq!(fake.last_list_call().as_deref(), Some("trending/week"));

        catalog
            .fetch_list(&ListQuery::Discover(DiscoverCategory::Tv), 1)
            .await
            .unwrap();
        assert_eq!(fake.last_list_call().as_deref(), Some("discover/tv"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_details_are_revalidated_in_background() {
        let (fake, catalog) = catalog();

        let first = catalog.fetch_details(MediaKind::Movie, 603).await.unwrap();
        assert_eq!(first.item().id, 603);

        // Details have a zero TTL: the cached record is served and refreshed.
        let lookup = catalog.details(MediaKind::Movie, 603);
        assert!(matches!(lookup, Lookup::Stale(_)));
        assert_eq!(lookup.value().unwrap().item().id, 603);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(fake.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_empties_every_cache() {
        let (_fake, catalog) = catalog();

        catalog.fetch_list(&ListQuery::NowPlaying, 1).await.unwrap();
        catalog.fetch_details(MediaKind::Tv, 1399).await.unwrap();
        catalog.fetch_season(1399, 1).await.unwrap();

        catalog.clear();
        assert!(catalog.pages().is_empty());
        assert!(catalog.details_cache().is_empty());
        assert!(catalog.seasons().is_empty());
    }
}
