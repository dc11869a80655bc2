use crate::PreviewError;
use url::Url;

/// A caller-supplied URL that has passed the shape checks needed before any
/// network traffic: it parses, is absolute, uses `http` or `https` and names a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    url: Url,
}

impl PreviewRequest {
    pub fn parse(url: &str) -> Result<Self, PreviewError> {
        let url = Url::parse(url.trim())?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(PreviewError::InvalidUrlScheme(other.to_string())),
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(PreviewError::InvalidUrl(format!("No host in URL: {url}")));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}
