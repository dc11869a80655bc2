#[cfg(feature = "cache")]
use crate::{CacheKey, PreviewCache};
use crate::{Fetcher, Preview, PreviewError, PreviewGenerator, PreviewRequest, UrlPreviewGenerator};
use async_trait::async_trait;
use std::sync::Arc;
#[cfg(feature = "cache")]
use std::time::Duration;
use tokio::sync::Semaphore;
#[cfg(feature = "cache")]
use tracing::warn;
use tracing::{debug, instrument};

pub const MAX_CONCURRENT_REQUESTS: usize = 500;

#[cfg(feature = "cache")]
const DEFAULT_NAMESPACE: &str = "default";

/// Entry point for hosts that serve previews to many callers at once.
///
/// Each call is an independent unit of work; the semaphore only bounds how many
/// outbound fetches are in flight. With the `cache` feature and a TTL
/// configured, previews are stored under a namespaced [`CacheKey`].
#[derive(Clone)]
pub struct PreviewService {
    pub generator: Arc<UrlPreviewGenerator>,
    #[cfg(feature = "cache")]
    cache: Option<PreviewCache>,
    #[cfg(feature = "cache")]
    namespace: String,
    // Max Concurrent Requests
    semaphore: Arc<Semaphore>,
}

impl Default for PreviewService {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewService {
    pub fn new() -> Self {
        Self::new_with_config(PreviewServiceConfig::default())
    }

    pub fn new_with_config(config: PreviewServiceConfig) -> Self {
        debug!(
            max_concurrent_requests = config.max_concurrent_requests,
            "Initializing PreviewService"
        );

        let generator = Arc::new(UrlPreviewGenerator::new_with_fetcher(
            config.fetcher.unwrap_or_default(),
        ));

        #[cfg(feature = "cache")]
        let cache = config
            .cache_ttl
            .map(|ttl| PreviewCache::new(config.cache_capacity, ttl));

        #[cfg(feature = "cache")]
        let namespace = if config.namespace.is_empty() {
            warn!(
                fallback = DEFAULT_NAMESPACE,
                "Empty cache namespace configured, using fallback"
            );
            DEFAULT_NAMESPACE.to_string()
        } else {
            config.namespace
        };

        Self {
            generator,
            #[cfg(feature = "cache")]
            cache,
            #[cfg(feature = "cache")]
            namespace,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests)),
        }
    }

    #[cfg(feature = "cache")]
    pub fn cache(&self) -> Option<&PreviewCache> {
        self.cache.as_ref()
    }

    #[cfg(feature = "cache")]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn generate_preview(&self, url: &str) -> Result<Preview, PreviewError> {
        let request = PreviewRequest::parse(url).inspect_err(PreviewError::log)?;

        #[cfg(feature = "cache")]
        let cache_slot = match &self.cache {
            Some(cache) => {
                let key = CacheKey::new(&self.namespace, request.as_str())?;
                if let Some(cached) = cache.get(&key) {
                    debug!(url = %request.as_str(), "Serving preview from cache");
                    return Ok(cached);
                }
                Some((cache, key))
            }
            None => None,
        };

        let preview = {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|_| PreviewError::ConcurrencyLimitError)?;
            self.generator
                .generate_for(&request)
                .await
                .inspect_err(PreviewError::log)?
        };

        #[cfg(feature = "cache")]
        if let Some((cache, key)) = cache_slot {
            cache.insert(key, preview.clone());
        }

        Ok(preview)
    }

    /// Generates previews for every URL concurrently. Results keep input order
    /// and one failure does not affect the others.
    pub async fn generate_previews(&self, urls: &[&str]) -> Vec<Result<Preview, PreviewError>> {
        let futures: Vec<_> = urls.iter().map(|url| self.generate_preview(url)).collect();
        futures::future::join_all(futures).await
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[async_trait]
impl PreviewGenerator for PreviewService {
    async fn generate_preview(&self, url: &str) -> Result<Preview, PreviewError> {
        PreviewService::generate_preview(self, url).await
    }
}

pub struct PreviewServiceConfig {
    pub fetcher: Option<Fetcher>,
    pub max_concurrent_requests: usize,
    /// Previews are cached only when a TTL is set.
    #[cfg(feature = "cache")]
    pub cache_ttl: Option<Duration>,
    #[cfg(feature = "cache")]
    pub cache_capacity: usize,
    /// Tenant discriminator folded into every cache key. An empty value falls
    /// back to `"default"`.
    #[cfg(feature = "cache")]
    pub namespace: String,
}

impl Default for PreviewServiceConfig {
    fn default() -> Self {
        Self {
            fetcher: None,
            max_concurrent_requests: MAX_CONCURRENT_REQUESTS,
            #[cfg(feature = "cache")]
            cache_ttl: None,
            #[cfg(feature = "cache")]
            cache_capacity: 1000,
            #[cfg(feature = "cache")]
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl PreviewServiceConfig {
    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_max_concurrent_requests(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests;
        self
    }

    #[cfg(feature = "cache")]
    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = Some(ttl);
        self
    }

    #[cfg(feature = "cache")]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}
