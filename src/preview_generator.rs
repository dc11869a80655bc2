use crate::{Fetcher, MetadataExtractor, Preview, PreviewError, PreviewGenerator, PreviewRequest};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Validate, fetch, extract. Holds no per-call state and performs no caching.
#[derive(Clone, Default)]
pub struct UrlPreviewGenerator {
    pub fetcher: Fetcher,
    extractor: MetadataExtractor,
}

impl UrlPreviewGenerator {
    pub fn new() -> Self {
        Self::new_with_fetcher(Fetcher::new())
    }

    pub fn new_with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            extractor: MetadataExtractor::new(),
        }
    }

    /// Builds a preview for an already validated request.
    #[instrument(level = "debug", skip(self), fields(url = %request.as_str()))]
    pub async fn generate_for(&self, request: &PreviewRequest) -> Result<Preview, PreviewError> {
        let fetched = self.fetcher.fetch(request.as_str()).await?;
        let preview = self.extractor.extract(&fetched.resolved_url, &fetched.body);
        debug!(
            resolved_url = %preview.url,
            title = %preview.title,
            images = preview.images.len(),
            "Preview generated"
        );
        Ok(preview)
    }
}

#[async_trait]
impl PreviewGenerator for UrlPreviewGenerator {
    async fn generate_preview(&self, url: &str) -> Result<Preview, PreviewError> {
        let request = PreviewRequest::parse(url)?;
        self.generate_for(&request).await
    }
}
