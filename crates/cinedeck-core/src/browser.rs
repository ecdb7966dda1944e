//! Entry point for a presentation layer.
//!
//! A front end turns user input into [`Intent`]s and hands them to
//! [`Browser::dispatch`]. The returned [`Command`]s can be spawned or
//! awaited in any order; their [`Outcome`]s go back through
//! [`Browser::apply`]. [`Browser::run_to_idle`] does this loop in place for
//! callers that just want to wait.

use std::sync::Arc;

use cinedeck_api::models::{EpisodeRef, MediaKind, MediaPage, TimeWindow};
use cinedeck_api::{CatalogError, CatalogService};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::cache::FetchResult;
use crate::catalog::{Catalog, ListQuery};
use crate::config::AppConfig;
use crate::error::CoreError;
use crate::pagination::{PageRequest, PageState, Paginator};
use crate::playback::{PlaybackCommand, PlaybackController, PlaybackOutcome};
use crate::provider::{ProviderId, ProviderRegistry};

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Search(String),
    SelectCategory(ListQuery),
    LoadMore,
    OpenMedia(u64, MediaKind),
    SelectSeason(u32),
    SelectEpisode(EpisodeRef),
    SelectProvider(ProviderId),
    OpenPlayer,
    ClosePlayer,
    CloseMedia,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Page(PageRequest),
    Playback(PlaybackCommand),
}

#[derive(Debug)]
pub enum Outcome {
    Page(PageRequest, FetchResult<MediaPage>),
    Playback(PlaybackOutcome),
}

impl Command {
    pub async fn run<C: CatalogService>(self, catalog: &Catalog<C>) -> Outcome {
        match self {
            Self::Page(request) => {
                let result = request.execute(catalog).await;
                Outcome::Page(request, result)
            }
            Self::Playback(command) => Outcome::Playback(command.run(catalog).await),
        }
    }
}

/// First page of each home screen rail.
#[derive(Debug, Clone)]
pub struct HomeRails {
    pub trending: Arc<MediaPage>,
    pub now_playing: Arc<MediaPage>,
    pub popular_movies: Arc<MediaPage>,
    pub popular_shows: Arc<MediaPage>,
}

/// Browsing state for one front end: the list being paged through and the
/// open playback session, both backed by one shared catalog.
pub struct Browser<C> {
    catalog: Catalog<C>,
    list: Paginator,
    playback: PlaybackController,
}

impl<C: CatalogService> Browser<C> {
    pub fn new(catalog: Catalog<C>, providers: ProviderRegistry) -> Self {
        Self {
            catalog,
            list: Paginator::new(),
            playback: PlaybackController::new(providers),
        }
    }

    pub fn from_config(client: Arc<C>, config: &AppConfig) -> Result<Self, CoreError> {
        let providers = ProviderRegistry::from_config(&config.playback)?;
        Ok(Self::new(Catalog::new(client, config.cache_policy()), providers))
    }

    pub fn catalog(&self) -> &Catalog<C> {
        &self.catalog
    }

    pub fn page_state(&self) -> &PageState {
        self.list.state()
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Update local state for `intent` and return the fetches it needs.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Vec<Command>, CoreError> {
        debug!(?intent, "Dispatch");
        let commands = match intent {
            Intent::Search(text) => vec![Command::Page(self.list.reset(ListQuery::Search(text)))],
            Intent::SelectCategory(query) => vec![Command::Page(self.list.reset(query))],
            Intent::LoadMore => self.list.load_next().map(Command::Page).into_iter().collect(),
            Intent::OpenMedia(id, kind) => vec![Command::Playback(self.playback.open(id, kind))],
            Intent::SelectSeason(season) => self
                .playback
                .select_season(season)
                .map(Command::Playback)
                .into_iter()
                .collect(),
            Intent::SelectEpisode(episode) => {
                self.playback.select_episode(&episode);
                Vec::new()
            }
            Intent::SelectProvider(id) => {
                self.playback.select_provider(&id)?;
                Vec::new()
            }
            Intent::OpenPlayer => {
                self.playback.open_player();
                Vec::new()
            }
            Intent::ClosePlayer => {
                self.playback.close_player();
                Vec::new()
            }
            Intent::CloseMedia => {
                self.playback.close();
                Vec::new()
            }
        };
        Ok(commands)
    }

    /// Apply a finished command and return any follow-up work.
    pub fn apply(&mut self, outcome: Outcome) -> Vec<Command> {
        match outcome {
            Outcome::Page(request, result) => {
                self.list.apply(&request, result);
                Vec::new()
            }
            Outcome::Playback(outcome) => self
                .playback
                .apply(outcome)
                .into_iter()
                .map(Command::Playback)
                .collect(),
        }
    }

    /// Run `commands` and everything they lead to. Outcomes are applied in
    /// the order they complete.
    pub async fn run_to_idle(&mut self, commands: Vec<Command>) {
        let catalog = self.catalog.clone();
        let mut pending: FuturesUnordered<_> =
            commands.into_iter().map(|c| c.run(&catalog)).collect();
        while let Some(outcome) = pending.next().await {
            for command in self.apply(outcome) {
                pending.push(command.run(&catalog));
            }
        }
    }

    /// Dispatch `intent` and wait until its effects have settled.
    pub async fn handle(&mut self, intent: Intent) -> Result<(), CoreError> {
        let commands = self.dispatch(intent)?;
        self.run_to_idle(commands).await;
        Ok(())
    }

    /// Load the first page of every home rail concurrently.
    pub async fn home(&self) -> Result<HomeRails, CatalogError> {
        let (trending, now_playing, popular_movies, popular_shows) = futures::try_join!(
            self.catalog.fetch_list(&ListQuery::Trending(TimeWindow::Day), 1),
            self.catalog.fetch_list(&ListQuery::NowPlaying, 1),
            self.catalog.fetch_list(&ListQuery::PopularMovies, 1),
            self.catalog.fetch_list(&ListQuery::PopularShows, 1),
        )?;
        Ok(HomeRails {
            trending,
            now_playing,
            popular_movies,
            popular_shows,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::catalog::DiscoverCategory;
    use crate::playback::PlaybackState;
    use crate::testing::{self, FakeCatalog};

    fn browser() -> (Arc<FakeCatalog>, Browser<FakeCatalog>) {
        let fake = Arc::new(FakeCatalog::default().with_total_pages(3));
        let browser = Browser::from_config(Arc::clone(&fake), &AppConfig::default()).unwrap();
        (fake, browser)
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_and_load_more() {
        let (fake, mut browser) = browser();

        browser.handle(Intent::Search("dune".into())).await.unwrap();
        assert_eq!(browser.page_state().items.len(), 20);
        assert_eq!(fake.last_list_call().as_deref(), Some("search/dune"));

        // A second trigger while the first is pending is dropped.
        let first = browser.dispatch(Intent::LoadMore).unwrap();
        let second = browser.dispatch(Intent::LoadMore).unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        browser.run_to_idle(first).await;

        browser.handle(Intent::LoadMore).await.unwrap();
        assert_eq!(browser.page_state().items.len(), 60);
        assert!(browser.dispatch(Intent::LoadMore).unwrap().is_empty());
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_switch_discards_previous_list() {
        let (_fake, mut browser) = browser();

        let stale = browser
            .dispatch(Intent::SelectCategory(ListQuery::TopRatedMovies))
            .unwrap();
        let fresh = browser
            .dispatch(Intent::SelectCategory(ListQuery::Discover(DiscoverCategory::Tv)))
            .unwrap();

        let mut all = stale;
        all.extend(fresh);
        browser.run_to_idle(all).await;

        let state = browser.page_state();
        assert_eq!(state.query, Some(ListQuery::Discover(DiscoverCategory::Tv)));
        assert_eq!(state.items.len(), 20);
        assert!(state.items.iter().all(|i| i.kind == MediaKind::Tv));
    }

    #[tokio::test(start_paused = true)]
    async fn test_home_rails_warm_the_cache() {
        let (fake, mut browser) = browser();

        let rails = browser.home().await.unwrap();
        assert_eq!(rails.trending.items.len(), 20);
        assert_eq!(rails.popular_shows.items[0].kind, MediaKind::Tv);
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 4);

        browser
            .handle(Intent::SelectCategory(ListQuery::PopularMovies))
            .await
            .unwrap();
        assert_eq!(browser.page_state().items.len(), 20);
        assert_eq!(fake.list_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_intents() {
        let (_fake, mut browser) = browser();

        browser
            .handle(Intent::OpenMedia(1399, MediaKind::Tv))
            .await
            .unwrap();
        assert_eq!(browser.playback().state(), &PlaybackState::Ready);
        assert_eq!(browser.playback().recommendations().len(), 20);

        browser.handle(Intent::SelectSeason(2)).await.unwrap();
        browser
            .handle(Intent::SelectEpisode(testing::episode(1399, 2, 2)))
            .await
            .unwrap();
        browser
            .handle(Intent::SelectProvider("vidsrc".into()))
            .await
            .unwrap();
        browser.handle(Intent::OpenPlayer).await.unwrap();

        assert_eq!(browser.playback().state(), &PlaybackState::Playing);
        assert_eq!(
            browser.playback().embed_url().unwrap().unwrap().as_str(),
            "https://vidsrc.cc/v2/embed/tv/1399/2/2"
        );

        browser.handle(Intent::ClosePlayer).await.unwrap();
        assert_eq!(browser.playback().state(), &PlaybackState::Ready);
        browser.handle(Intent::CloseMedia).await.unwrap();
        assert_eq!(browser.playback().state(), &PlaybackState::Closed);
        assert!(!browser.catalog().seasons().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_provider_surfaces_an_error() {
        let (_fake, mut browser) = browser();
        let err = browser
            .dispatch(Intent::SelectProvider("missing".into()))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownProvider(id) if id == "missing"));
    }
}
