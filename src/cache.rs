use crate::{Preview, PreviewError};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identity of a cached preview: a tenant namespace plus every request
/// parameter, so two tenants or two parameter sets never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(namespace: &str, url: &str) -> Result<Self, PreviewError> {
        Self::with_params(namespace, [("url", url)])
    }

    /// Parameter order does not matter; parameters are sorted by name.
    pub fn with_params<I, K, V>(namespace: &str, params: I) -> Result<Self, PreviewError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if namespace.is_empty() {
            return Err(PreviewError::CacheError("cache namespace is empty".into()));
        }

        let params: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let encoded = serde_json::to_string(&params)
            .map_err(|e| PreviewError::CacheError(e.to_string()))?;

        Ok(Self(format!("{namespace}:{encoded}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
struct CacheEntry {
    preview: Preview,
    inserted_at: Instant,
}

/// Bounded TTL store for previews. Expired entries read as misses and are dropped.
#[derive(Clone)]
pub struct PreviewCache {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl PreviewCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).map_or(100, NonZeroUsize::get);
        Self {
            entries: Arc::new(DashMap::with_capacity(capacity)),
            ttl,
            capacity,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &CacheKey) -> Option<Preview> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.preview.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: CacheKey, preview: Preview) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.purge_expired();
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                preview,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            debug!(key = %key.as_str(), "Evicting oldest cached preview");
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
