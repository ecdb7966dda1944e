use std::time::Duration;

use thiserror::Error;

/// Errors from the catalog client.
///
/// Cloneable because a single failed request is observed by every caller
/// waiting on the same in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl CatalogError {
    /// HTTP status that triggered the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Config(_) | Self::NotFound(_) | Self::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_extraction() {
        let err = CatalogError::Http {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert!(err.is_retryable());

        assert_eq!(CatalogError::NotFound("movie 1".into()).status(), Some(404));
        assert_eq!(CatalogError::Network("reset".into()).status(), None);
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = CatalogError::Http {
            status: 401,
            message: "invalid api key".into(),
        };
        assert!(!err.is_retryable());
        assert!(!CatalogError::Config("missing key".into()).is_retryable());
        assert!(CatalogError::Timeout(Duration::from_secs(30)).is_retryable());
    }
}
