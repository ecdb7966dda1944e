use cinedeck_api::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("invalid embed URL {url}: {source}")]
    InvalidEmbedUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
