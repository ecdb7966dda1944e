//! Embed providers and their URL templates.

use std::fmt;

use cinedeck_api::models::MediaKind;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{PlaybackConfig, ProviderConfig};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Season and episode numbers substituted into an episode template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeSlot {
    pub season: u32,
    pub episode: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    template: String,
    episode_template: Option<String>,
}

impl Provider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: ProviderId::new(id),
            name: name.into(),
            template: template.into(),
            episode_template: None,
        }
    }

    pub fn with_episode_template(mut self, template: impl Into<String>) -> Self {
        self.episode_template = Some(template.into());
        self
    }

    /// Whether this provider can deep-link to a single episode.
    pub fn is_episode_aware(&self) -> bool {
        self.episode_template.is_some()
    }

    /// Build the embed URL for a title, or for one episode of a show when
    /// the provider supports it.
    pub fn embed_url(
        &self,
        kind: MediaKind,
        id: u64,
        episode: Option<EpisodeSlot>,
    ) -> Result<Url, CoreError> {
        let raw = match (kind, episode, &self.episode_template) {
            (MediaKind::Tv, Some(slot), Some(template)) => template
                .replace("{id}", &id.to_string())
                .replace("{season}", &slot.season.to_string())
                .replace("{episode}", &slot.episode.to_string()),
            _ => self
                .template
                .replace("{kind}", kind.as_str())
                .replace("{id}", &id.to_string()),
        };
        Url::parse(&raw).map_err(|source| CoreError::InvalidEmbedUrl { url: raw, source })
    }
}

impl From<&ProviderConfig> for Provider {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            id: ProviderId::new(config.id.as_str()),
            name: config.name.clone(),
            template: config.template.clone(),
            episode_template: config.episode_template.clone(),
        }
    }
}

/// The providers a user can pick from, in display order.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
    default: ProviderId,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Provider>, default: ProviderId) -> Result<Self, CoreError> {
        if providers.is_empty() {
            return Err(CoreError::Config("no embed providers configured".into()));
        }
        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.id == provider.id) {
                return Err(CoreError::Config(format!(
                    "duplicate provider id: {}",
                    provider.id
                )));
            }
            if !provider.template.contains("{id}") {
                return Err(CoreError::Config(format!(
                    "provider {} template has no {{id}} placeholder",
                    provider.id
                )));
            }
        }
        if !providers.iter().any(|p| p.id == default) {
            return Err(CoreError::UnknownProvider(default.to_string()));
        }
        Ok(Self { providers, default })
    }

    pub fn from_config(config: &PlaybackConfig) -> Result<Self, CoreError> {
        Self::new(
            config.providers.iter().map(Provider::from).collect(),
            ProviderId::new(config.default_provider.as_str()),
        )
    }

    pub fn default_id(&self) -> &ProviderId {
        &self.default
    }

    pub fn get(&self, id: &ProviderId) -> Option<&Provider> {
        self.providers.iter().find(|p| &p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }
}
