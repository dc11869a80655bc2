use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    InvalidUrlScheme(String),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("HTTP {status} returned for {url}")]
    HttpError { status: u16, url: String },

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Concurrency limit reached")]
    ConcurrencyLimitError,
}

impl PreviewError {
    /// Classifies a transport error coming out of reqwest.
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return PreviewError::TimeoutError(err.to_string());
        }
        if let Some(status) = err.status() {
            return PreviewError::HttpError {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        PreviewError::FetchError(err.to_string())
    }

    /// True when the remote document could not be retrieved.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PreviewError::FetchError(_)
                | PreviewError::TimeoutError(_)
                | PreviewError::HttpError { .. }
        )
    }

    /// True for every outcome a request boundary should surface as "not found":
    /// fetch failures plus URLs rejected before fetching.
    pub fn is_not_found(&self) -> bool {
        self.is_fetch_failure()
            || matches!(
                self,
                PreviewError::UrlParseError(_)
                    | PreviewError::InvalidUrl(_)
                    | PreviewError::InvalidUrlScheme(_)
            )
    }

    pub fn log(&self) {
        match self {
            PreviewError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            PreviewError::InvalidUrl(e) => {
                warn!(error = %e, "Invalid URL rejected");
            }
            PreviewError::InvalidUrlScheme(scheme) => {
                warn!(scheme = %scheme, "URL scheme not allowed");
            }
            PreviewError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            PreviewError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            PreviewError::HttpError { status, url } => {
                warn!(status = %status, url = %url, "Non-success HTTP status");
            }
            PreviewError::CacheError(e) => {
                warn!(error = %e, "Cache operation failed");
            }
            PreviewError::ConcurrencyLimitError => {
                warn!("Preview service stopped accepting requests");
            }
        }
    }
}
