use crate::PreviewError;
use reqwest::{header::HeaderMap, Client};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Browser-like client signature; some servers answer unknown clients with
/// an error page instead of the document.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) \
    Chrome/119.0.0.0 Safari/537.36";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_REDIRECTS: usize = 10;

/// The settled response of a single GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// URL after every redirect has been followed.
    pub resolved_url: String,
    pub body: String,
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default())
    }

    pub fn new_with_custom_config(timeout: Duration, user_agent: &str) -> Self {
        Self::new_with_config(FetcherConfig {
            user_agent: user_agent.to_string(),
            timeout,
            ..FetcherConfig::default()
        })
    }

    /// Creates a Fetcher with custom configuration
    pub fn new_with_config(config: FetcherConfig) -> Self {
        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .pool_max_idle_per_host(10);

        if let Some(headers) = config.headers {
            client_builder = client_builder.default_headers(headers);
        }

        let redirect_policy = config
            .redirect_policy
            .unwrap_or_else(|| reqwest::redirect::Policy::limited(DEFAULT_MAX_REDIRECTS));
        client_builder = client_builder.redirect(redirect_policy);

        let client = client_builder.build().unwrap_or_else(|e| {
            error!(error = %e, "Failed to create HTTP client");
            panic!("Failed to initialize HTTP client: {}", e);
        });

        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// One GET, no retries. Succeeds only on a 2xx status after redirects.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, PreviewError> {
        debug!(url = %url, "Starting fetch request");

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send request");
            PreviewError::from_reqwest_error(e)
        })?;

        let resolved_url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %resolved_url, "Request returned non-success status");
            return Err(PreviewError::HttpError {
                status: status.as_u16(),
                url: resolved_url,
            });
        }

        if resolved_url != url {
            debug!(url = %url, resolved_url = %resolved_url, "Request was redirected");
        }

        let body = response.text().await.map_err(|e| {
            error!(error = %e, url = %resolved_url, "Failed to read response body");
            PreviewError::from_reqwest_error(e)
        })?;

        debug!(url = %resolved_url, content_length = body.len(), "Successfully fetched webpage");
        Ok(FetchResult { resolved_url, body })
    }

    /// Fetches every URL concurrently; results come back in input order.
    pub async fn fetch_batch(&self, urls: Vec<&str>) -> Vec<Result<FetchResult, PreviewError>> {
        let futures: Vec<_> = urls.into_iter().map(|url| self.fetch(url)).collect();
        futures::future::join_all(futures).await
    }
}

/// Options for building the HTTP client behind a [`Fetcher`].
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     user_agent: "my-custom-agent/1.0".to_string(),
///     timeout: Duration::from_secs(20),
///     headers: Some(my_custom_headers),
///     redirect_policy: Some(reqwest::redirect::Policy::limited(3)),
/// });
/// ```
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
    /// Defaults to following up to ten redirects.
    pub redirect_policy: Option<reqwest::redirect::Policy>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: None,
            redirect_policy: None,
        }
    }
}
