//! Trait definition for the remote catalog.
//!
//! The TMDB client implements this trait; the caching layer and the
//! controllers only depend on it, so tests can substitute in-memory fakes.

use std::future::Future;

use crate::error::CatalogError;
use crate::models::{MediaDetails, MediaKind, MediaPage, SeasonDetails, TimeWindow};

/// Read-only access to a movie/TV metadata catalog.
///
/// Implementations return normalized records and do no caching of their own.
pub trait CatalogService: Send + Sync + 'static {
    /// Trending movies and shows for the given window.
    fn trending(
        &self,
        window: TimeWindow,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    /// Movies currently in theatres.
    fn now_playing(&self, page: u32)
        -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    fn popular_movies(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    fn top_rated_movies(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    fn popular_shows(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    /// Search movies and shows by free text.
    fn search_multi(
        &self,
        query: &str,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    /// Browse movies or shows sorted by popularity.
    fn discover(
        &self,
        kind: MediaKind,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;

    /// Full record for a movie or show, with credits, videos and similar titles.
    fn details(
        &self,
        kind: MediaKind,
        id: u64,
    ) -> impl Future<Output = Result<MediaDetails, CatalogError>> + Send;

    /// Episodes of one season of a show.
    fn season(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> impl Future<Output = Result<SeasonDetails, CatalogError>> + Send;

    /// Titles recommended alongside a movie or show.
    fn recommendations(
        &self,
        kind: MediaKind,
        id: u64,
        page: u32,
    ) -> impl Future<Output = Result<MediaPage, CatalogError>> + Send;
}
