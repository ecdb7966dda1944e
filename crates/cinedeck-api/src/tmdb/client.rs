use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::types::{ErrorBody, ListResponse, RawMedia, RawSeason};
use crate::error::CatalogError;
use crate::models::{MediaDetails, MediaKind, MediaPage, SeasonDetails, TimeWindow};
use crate::normalize::{normalize, normalize_details, normalize_list, SourceRecord};
use crate::traits::CatalogService;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Sub-resources appended to every detail request.
const DETAIL_APPENDS: &str = "credits,videos,similar";

/// TMDB v3 REST client.
pub struct TmdbClient {
    api_key: Option<String>,
    base_url: String,
    language: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            http: Client::new(),
        }
    }

    /// Point the client at a different API root (e.g. a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Build the full request URL for an endpoint path.
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, CatalogError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CatalogError::Config("TMDB API key not configured".into()))?;

        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| CatalogError::Config(format!("invalid base URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            query.append_pair("api_key", api_key);
            query.append_pair("language", &self.language);
        }
        Ok(url)
    }

    async fn check_response(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, CatalogError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.status_message)
            .unwrap_or(body);
        warn!(path, status = status.as_u16(), %message, "Catalog request failed");

        if status == reqwest::StatusCode::NOT_FOUND {
            Err(CatalogError::NotFound(path.to_string()))
        } else {
            Err(CatalogError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }

    #[tracing::instrument(name = "tmdb_get", skip(self, params))]
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = self.endpoint(path, params)?;
        let resp = self.http.get(url).send().await?;
        let resp = Self::check_response(path, resp).await?;
        let body = resp.json::<T>().await?;
        debug!("Catalog request succeeded");
        Ok(body)
    }

    async fn get_page(
        &self,
        path: &str,
        mut params: Vec<(&str, String)>,
        page: u32,
    ) -> Result<MediaPage, CatalogError> {
        params.push(("page", page.max(1).to_string()));
        let body: ListResponse<RawMedia> = self.get(path, &params).await?;
        Ok(into_page(body))
    }
}

fn into_page(body: ListResponse<RawMedia>) -> MediaPage {
    MediaPage {
        page: body.page,
        total_pages: body.total_pages,
        total_results: body.total_results,
        items: normalize_list(body.results),
    }
}

impl CatalogService for TmdbClient {
    async fn trending(&self, window: TimeWindow, page: u32) -> Result<MediaPage, CatalogError> {
        let path = format!("/trending/all/{}", window.as_str());
        self.get_page(&path, Vec::new(), page).await
    }

    async fn now_playing(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.get_page("/movie/now_playing", Vec::new(), page).await
    }

    async fn popular_movies(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.get_page("/movie/popular", Vec::new(), page).await
    }

    async fn top_rated_movies(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.get_page("/movie/top_rated", Vec::new(), page).await
    }

    async fn popular_shows(&self, page: u32) -> Result<MediaPage, CatalogError> {
        self.get_page("/tv/popular", Vec::new(), page).await
    }

    async fn search_multi(&self, query: &str, page: u32) -> Result<MediaPage, CatalogError> {
        let params = vec![("query", query.to_string())];
        self.get_page("/search/multi", params, page).await
    }

    async fn discover(&self, kind: MediaKind, page: u32) -> Result<MediaPage, CatalogError> {
        let path = format!("/discover/{}", kind.as_str());
        let params = vec![("sort_by", "popularity.desc".to_string())];
        self.get_page(&path, params, page).await
    }

    async fn details(&self, kind: MediaKind, id: u64) -> Result<MediaDetails, CatalogError> {
        let path = format!("/{}/{id}", kind.as_str());
        let raw: RawMedia = self
            .get(&path, &[("append_to_response", DETAIL_APPENDS.to_string())])
            .await?;
        Ok(normalize_details(SourceRecord::with_kind(raw, kind)))
    }

    async fn season(
        &self,
        show_id: u64,
        season_number: u32,
    ) -> Result<SeasonDetails, CatalogError> {
        let path = format!("/tv/{show_id}/season/{season_number}");
        let raw: RawSeason = self.get(&path, &[]).await?;
        Ok(raw.into_season_details(show_id))
    }

    async fn recommendations(
        &self,
        kind: MediaKind,
        id: u64,
        page: u32,
    ) -> Result<MediaPage, CatalogError> {
        let path = format!("/{}/{id}/recommendations", kind.as_str());
        let body: ListResponse<RawMedia> = self
            .get(&path, &[("page", page.max(1).to_string())])
            .await?;
        // Recommendation records omit `media_type`; they share the source's kind.
        Ok(MediaPage {
            page: body.page,
            total_pages: body.total_pages,
            total_results: body.total_results,
            items: body
                .results
                .into_iter()
                .map(|raw| normalize(&SourceRecord::with_kind(raw, kind)))
                .collect(),
        })
    }
}
