//! Playback session controller.
//!
//! Tracks the title the user opened, its season/episode selection and the
//! chosen embed provider. Network work is returned as [`PlaybackCommand`]s;
//! their [`PlaybackOutcome`]s are fed back through
//! [`PlaybackController::apply`]. Every command is tagged with the session
//! it belongs to and, for seasons, the selection generation it was issued
//! in, so responses for a closed session or a season the user already
//! moved away from are dropped.

use std::sync::Arc;

use cinedeck_api::models::{
    EpisodeRef, MediaDetails, MediaItem, MediaKind, MediaPage, SeasonDetails,
};
use cinedeck_api::{CatalogError, CatalogService};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::FetchResult;
use crate::catalog::{Catalog, ListQuery};
use crate::error::CoreError;
use crate::provider::{EpisodeSlot, ProviderId, ProviderRegistry};

/// Season selected when a show is opened.
pub const DEFAULT_SEASON: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Closed,
    /// Waiting for the detail record.
    Loading,
    Ready,
    /// The embedded player is open.
    Playing,
    /// The detail record could not be loaded; only `close` leaves this state.
    Failed(CatalogError),
}

impl PlaybackState {
    /// Message for the terminal error view.
    pub fn failure_message(&self) -> Option<&'static str> {
        match self {
            Self::Failed(CatalogError::NotFound(_)) => Some("Content not found"),
            Self::Failed(_) => Some("Failed to load content"),
            _ => None,
        }
    }
}

/// What the user has selected in the open session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSelection {
    pub media_id: u64,
    pub media_kind: MediaKind,
    pub provider: ProviderId,
    /// Selected season; meaningful for shows only.
    pub season: u32,
    /// Always an element of `episode_list` when set.
    pub episode: Option<EpisodeRef>,
    pub episode_list: Vec<EpisodeRef>,
    pub player_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsRequest {
    pub session: u64,
    pub kind: MediaKind,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonRequest {
    pub session: u64,
    pub generation: u64,
    pub show_id: u64,
    pub season: u32,
}

/// Network work requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    FetchDetails(DetailsRequest),
    FetchSeason(SeasonRequest),
    FetchRecommendations(DetailsRequest),
}

/// A finished [`PlaybackCommand`].
#[derive(Debug)]
pub enum PlaybackOutcome {
    Details(DetailsRequest, FetchResult<MediaDetails>),
    Season(SeasonRequest, FetchResult<SeasonDetails>),
    Recommendations(DetailsRequest, FetchResult<MediaPage>),
}

impl PlaybackCommand {
    /// Run the command through the cached catalog.
    pub async fn run<C: CatalogService>(self, catalog: &Catalog<C>) -> PlaybackOutcome {
        match self {
            Self::FetchDetails(req) => {
                let result = catalog.fetch_details(req.kind, req.id).await;
                PlaybackOutcome::Details(req, result)
            }
            Self::FetchSeason(req) => {
                let result = catalog.fetch_season(req.show_id, req.season).await;
                PlaybackOutcome::Season(req, result)
            }
            Self::FetchRecommendations(req) => {
                let query = ListQuery::Recommendations(req.kind, req.id);
                let result = catalog.fetch_list(&query, 1).await;
                PlaybackOutcome::Recommendations(req, result)
            }
        }
    }
}

#[derive(Debug)]
pub struct PlaybackController {
    providers: ProviderRegistry,
    state: PlaybackState,
    selection: Option<PlaybackSelection>,
    details: Option<Arc<MediaDetails>>,
    recommendations: Vec<MediaItem>,
    season_loading: bool,
    season_error: Option<CatalogError>,
    session: u64,
    generation: u64,
}

impl PlaybackController {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self {
            providers,
            state: PlaybackState::Closed,
            selection: None,
            details: None,
            recommendations: Vec::new(),
            season_loading: false,
            season_error: None,
            session: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn selection(&self) -> Option<&PlaybackSelection> {
        self.selection.as_ref()
    }

    pub fn details(&self) -> Option<&Arc<MediaDetails>> {
        self.details.as_ref()
    }

    pub fn recommendations(&self) -> &[MediaItem] {
        &self.recommendations
    }

    pub fn is_season_loading(&self) -> bool {
        self.season_loading
    }

    pub fn season_error(&self) -> Option<&CatalogError> {
        self.season_error.as_ref()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Open `id` and request its detail record. Replaces any open session.
    pub fn open(&mut self, id: u64, kind: MediaKind) -> PlaybackCommand {
        self.reset();
        self.state = PlaybackState::Loading;
        self.selection = Some(PlaybackSelection {
            media_id: id,
            media_kind: kind,
            provider: self.providers.default_id().clone(),
            season: DEFAULT_SEASON,
            episode: None,
            episode_list: Vec::new(),
            player_open: false,
        });
        info!(id, kind = %kind, session = self.session, "Opening media");
        PlaybackCommand::FetchDetails(DetailsRequest {
            session: self.session,
            kind,
            id,
        })
    }

    /// Tear down the session. Cached data is left alone.
    pub fn close(&mut self) {
        if self.selection.is_some() {
            debug!(session = self.session, "Closing media");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.session += 1;
        self.generation += 1;
        self.state = PlaybackState::Closed;
        self.selection = None;
        self.details = None;
        self.recommendations.clear();
        self.season_loading = false;
        self.season_error = None;
    }

    /// Feed a finished command back in. Returns follow-up commands.
    pub fn apply(&mut self, outcome: PlaybackOutcome) -> Vec<PlaybackCommand> {
        match outcome {
            PlaybackOutcome::Details(req, result) => self.apply_details(&req, result),
            PlaybackOutcome::Season(req, result) => {
                self.apply_season(&req, result);
                Vec::new()
            }
            PlaybackOutcome::Recommendations(req, result) => {
                self.apply_recommendations(&req, result);
                Vec::new()
            }
        }
    }

    pub fn apply_details(
        &mut self,
        req: &DetailsRequest,
        result: FetchResult<MediaDetails>,
    ) -> Vec<PlaybackCommand> {
        if req.session != self.session || self.state != PlaybackState::Loading {
            debug!(id = req.id, "Discarding details for a closed session");
            return Vec::new();
        }

        let details = match result {
            Ok(details) => details,
            Err(e) => {
                warn!(id = req.id, error = %e, "Failed to load details");
                self.state = PlaybackState::Failed(e);
                return Vec::new();
            }
        };
        self.details = Some(details);
        self.state = PlaybackState::Ready;

        let mut commands = vec![PlaybackCommand::FetchRecommendations(req.clone())];
        if req.kind == MediaKind::Tv {
            commands.extend(self.request_season(DEFAULT_SEASON));
        }
        commands
    }

    /// Switch to season `season` of the open show and request its episodes.
    ///
    /// Provider and player state are kept.
    pub fn select_season(&mut self, season: u32) -> Option<PlaybackCommand> {
        if !matches!(self.state, PlaybackState::Ready | PlaybackState::Playing) {
            return None;
        }
        self.request_season(season)
    }

    fn request_season(&mut self, season: u32) -> Option<PlaybackCommand> {
        let selection = self.selection.as_mut()?;
        if selection.media_kind != MediaKind::Tv {
            return None;
        }
        self.generation += 1;
        selection.season = season;
        selection.episode = None;
        selection.episode_list.clear();
        self.season_loading = true;
        self.season_error = None;
        debug!(show = selection.media_id, season, generation = self.generation, "Selecting season");

        Some(PlaybackCommand::FetchSeason(SeasonRequest {
            session: self.session,
            generation: self.generation,
            show_id: selection.media_id,
            season,
        }))
    }

    /// Apply a season response. Returns `false` if it was superseded.
    pub fn apply_season(
        &mut self,
        req: &SeasonRequest,
        result: FetchResult<SeasonDetails>,
    ) -> bool {
        if req.session != self.session || req.generation != self.generation {
            debug!(
                season = req.season,
                generation = req.generation,
                current = self.generation,
                "Discarding stale season response"
            );
            return false;
        }
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };

        self.season_loading = false;
        match result {
            Ok(season) => {
                selection.episode_list = season.episodes.clone();
                selection.episode = selection.episode_list.first().cloned();
                self.season_error = None;
            }
            Err(e) => {
                warn!(season = req.season, error = %e, "Failed to load season");
                selection.episode_list.clear();
                selection.episode = None;
                self.season_error = Some(e);
            }
        }
        true
    }

    fn apply_recommendations(&mut self, req: &DetailsRequest, result: FetchResult<MediaPage>) {
        if req.session != self.session {
            return;
        }
        match result {
            Ok(page) => self.recommendations = page.items.clone(),
            Err(e) => {
                debug!(id = req.id, error = %e, "No recommendations");
                self.recommendations.clear();
            }
        }
    }

    /// Select an episode from the current list. Returns `false` if it is
    /// not part of the list.
    pub fn select_episode(&mut self, episode: &EpisodeRef) -> bool {
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        match selection.episode_list.iter().find(|e| e.id == episode.id) {
            Some(found) => {
                selection.episode = Some(found.clone());
                true
            }
            None => {
                debug!(episode = episode.id, "Ignoring episode outside the current season");
                false
            }
        }
    }

    /// Select episode `number` of the current season.
    pub fn select_episode_number(&mut self, number: u32) -> bool {
        let found = self
            .selection
            .as_ref()
            .and_then(|s| s.episode_list.iter().find(|e| e.episode_number == number))
            .cloned();
        found.is_some_and(|episode| self.select_episode(&episode))
    }

    pub fn select_provider(&mut self, id: &ProviderId) -> Result<(), CoreError> {
        if self.providers.get(id).is_none() {
            return Err(CoreError::UnknownProvider(id.to_string()));
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.provider = id.clone();
        }
        Ok(())
    }

    /// Open the embedded player. Only possible once details have loaded.
    pub fn open_player(&mut self) -> bool {
        if !matches!(self.state, PlaybackState::Ready | PlaybackState::Playing) {
            return false;
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.player_open = true;
        }
        self.state = PlaybackState::Playing;
        true
    }

    pub fn close_player(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Ready;
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.player_open = false;
        }
    }

    /// Embed URL for the current selection, if a session is open.
    pub fn embed_url(&self) -> Result<Option<Url>, CoreError> {
        let Some(selection) = &self.selection else {
            return Ok(None);
        };
        let provider = self
            .providers
            .get(&selection.provider)
            .ok_or_else(|| CoreError::UnknownProvider(selection.provider.to_string()))?;
        let slot = selection.episode.as_ref().map(|e| EpisodeSlot {
            season: selection.season,
            episode: e.episode_number,
        });
        provider
            .embed_url(selection.media_kind, selection.media_id, slot)
            .map(Some)
    }
}
