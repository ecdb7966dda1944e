//! Incremental pagination over a [`ListQuery`].
//!
//! The paginator is plain state. [`Paginator::reset`] and
//! [`Paginator::load_next`] hand out [`PageRequest`]s; the caller runs them
//! (usually on the runtime) and feeds the result back through
//! [`Paginator::apply`]. Requests carry the generation they were issued in,
//! so a page that lands after a reset is ignored.

use cinedeck_api::models::{MediaItem, MediaPage};
use cinedeck_api::{CatalogError, CatalogService};
use tracing::{debug, warn};

use crate::cache::FetchResult;
use crate::catalog::{Catalog, ListQuery};

/// Read-only view of the list being browsed.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub query: Option<ListQuery>,
    pub items: Vec<MediaItem>,
    /// Last page appended; 0 before the first page lands.
    pub current_page: u32,
    /// `None` until the first page reports it.
    pub total_pages: Option<u32>,
    pub loading_more: bool,
    pub error: Option<CatalogError>,
}

impl PageState {
    pub fn is_exhausted(&self) -> bool {
        self.total_pages
            .is_some_and(|total| self.current_page >= total)
    }
}

/// A page fetch issued by the paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub query: ListQuery,
    pub page: u32,
}

impl PageRequest {
    /// Run the request through the cached catalog.
    pub async fn execute<C: CatalogService>(&self, catalog: &Catalog<C>) -> FetchResult<MediaPage> {
        catalog.fetch_list(&self.query, self.page).await
    }
}

#[derive(Debug, Default)]
pub struct Paginator {
    state: PageState,
    generation: u64,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start over on `query` and request its first page.
    pub fn reset(&mut self, query: ListQuery) -> PageRequest {
        self.generation += 1;
        debug!(generation = self.generation, query = ?query, "Pagination reset");
        self.state = PageState {
            query: Some(query.clone()),
            ..PageState::default()
        };
        self.begin(query)
    }

    /// Request the next page, unless one is already loading or the list is
    /// exhausted.
    pub fn load_next(&mut self) -> Option<PageRequest> {
        if self.state.loading_more || self.state.is_exhausted() {
            return None;
        }
        let query = self.state.query.clone()?;
        Some(self.begin(query))
    }

    fn begin(&mut self, query: ListQuery) -> PageRequest {
        self.state.loading_more = true;
        PageRequest {
            generation: self.generation,
            query,
            page: self.state.current_page + 1,
        }
    }

    /// Apply the outcome of `request`. Returns `false` if it was superseded.
    pub fn apply(&mut self, request: &PageRequest, result: FetchResult<MediaPage>) -> bool {
        if request.generation != self.generation {
            debug!(
                page = request.page,
                generation = request.generation,
                current = self.generation,
                "Discarding page from a previous query"
            );
            return false;
        }

        self.state.loading_more = false;
        match result {
            Ok(page) => {
                self.state.items.extend(page.items.iter().cloned());
                self.state.current_page = request.page;
                self.state.total_pages = Some(page.total_pages);
                self.state.error = None;
            }
            Err(e) => {
                warn!(page = request.page, error = %e, "Failed to load page");
                self.state.error = Some(e);
            }
        }
        true
    }

    /// Fetch the next page and apply it. Returns `false` if nothing was loaded.
    pub async fn load_next_and_apply<C: CatalogService>(&mut self, catalog: &Catalog<C>) -> bool {
        let Some(request) = self.load_next() else {
            return false;
        };
        let result = request.execute(catalog).await;
        self.apply(&request, result) && self.state.error.is_none()
    }

    /// Reset to `query` and load its first page.
    pub async fn reset_and_load<C: CatalogService>(
        &mut self,
        catalog: &Catalog<C>,
        query: ListQuery,
    ) -> Result<(), CatalogError> {
        let request = self.reset(query);
        let result = request.execute(catalog).await;
        self.apply(&request, result);
        match &self.state.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
