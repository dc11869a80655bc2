use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "cache")]
mod cache;
mod error;
mod extractor;
mod fetcher;
#[cfg(feature = "logging")]
mod logging;
mod preview_generator;
mod preview_service;
mod request;
mod utils;

#[cfg(feature = "cache")]
pub use cache::{CacheKey, PreviewCache};
pub use error::PreviewError;
pub use extractor::{MetadataExtractor, DESCRIPTION_MAX_CHARS, ELLIPSIS};
pub use fetcher::{FetchResult, Fetcher, FetcherConfig, BROWSER_USER_AGENT};
#[cfg(feature = "logging")]
pub use logging::{
    format_error_card, format_preview_card, log_error_card, log_preview_card, setup_logging,
    LogConfig,
};
pub use preview_generator::UrlPreviewGenerator;
pub use preview_service::{PreviewService, PreviewServiceConfig, MAX_CONCURRENT_REQUESTS};
pub use request::PreviewRequest;
pub use utils::{resolve_image_src, strip_tags};

/// One image candidate of a preview. `src` is always an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
}

/// Embeddable summary of a link.
///
/// Serializes as a flat JSON object: OpenGraph properties without a dedicated
/// field (`site_name`, `type`, ...) sit next to `url`, `title`, `description`
/// and `images`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Preview {
    /// Extra `og:*` property captured from the document, if any.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.extra.get(name).map(String::as_str)
    }

    pub fn site_name(&self) -> Option<&str> {
        self.property("site_name")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[async_trait]
pub trait PreviewGenerator {
    async fn generate_preview(&self, url: &str) -> Result<Preview, PreviewError>;
}
