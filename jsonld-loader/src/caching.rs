//! Loader wrapper that serves repeated requests from a [`DocumentCache`].

use crate::cache::DocumentCache;
use crate::config::LoaderConfig;
use jsonld_core::{DocumentLoader, LoadOptions, RemoteDocument, Result};
use std::sync::Arc;

/// Wraps any loader with an LRU/TTL cache.
///
/// Documents are cached under the requested URL and, after a redirect,
/// under the final document URL as well. Failures are not cached.
#[derive(Debug)]
pub struct CachingLoader<L> {
    inner: L,
    cache: Arc<DocumentCache>,
}

impl<L: DocumentLoader> CachingLoader<L> {
    pub fn new(inner: L, config: &LoaderConfig) -> Self {
        Self::with_cache(
            inner,
            Arc::new(DocumentCache::new(config.max_entries, config.ttl())),
        )
    }

    /// Use an existing cache, e.g. one shared between several loaders.
    pub fn with_cache(inner: L, cache: Arc<DocumentCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: DocumentLoader> DocumentLoader for CachingLoader<L> {
    fn load(&self, url: &str, options: &LoadOptions) -> Result<RemoteDocument> {
        if let Some(hit) = self.cache.get(url) {
            tracing::debug!(url, "document cache hit");
            return Ok(RemoteDocument::clone(&hit));
        }

        tracing::debug!(url, "document cache miss");
        let document = Arc::new(self.inner.load(url, options)?);
        if document.document_url != url {
            self.cache
                .insert(document.document_url.clone(), document.clone());
        }
        self.cache.insert(url, document.clone());
        Ok(RemoteDocument::clone(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonld_core::{ErrorKind, JsonLdError, StaticLoader};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and redirects `/old` to `/new`.
    struct CountingLoader {
        calls: AtomicUsize,
    }

    impl DocumentLoader for CountingLoader {
        fn load(&self, url: &str, _options: &LoadOptions) -> Result<RemoteDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match url {
                "https://ex/old" => Ok(RemoteDocument::new("https://ex/new", json!({"v": 1}))),
                "https://ex/doc" => Ok(RemoteDocument::new(url, json!({"v": 2}))),
                _ => Err(JsonLdError::loader(
                    ErrorKind::LoadingDocumentFailed,
                    url,
                    "not found",
                )),
            }
        }
    }

    fn counting() -> CachingLoader<CountingLoader> {
        CachingLoader::new(
            CountingLoader {
                calls: AtomicUsize::new(0),
            },
            &LoaderConfig::default(),
        )
    }

    #[test]
    fn test_repeated_loads_hit_cache() {
        let loader = counting();
        let options = LoadOptions::default();

        let first = loader.load("https://ex/doc", &options).unwrap();
        let second = loader.load("https://ex/doc", &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_redirect_cached_under_both_urls() {
        let loader = counting();
        let options = LoadOptions::default();

        let doc = loader.load("https://ex/old", &options).unwrap();
        assert_eq!(doc.document_url, "https://ex/new");
        assert_eq!(loader.cache().len(), 2);

        loader.load("https://ex/new", &options).unwrap();
        assert_eq!(loader.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_not_cached() {
        let loader = counting();
        let options = LoadOptions::default();

        assert!(loader.load("https://ex/missing", &options).is_err());
        assert!(loader.load("https://ex/missing", &options).is_err());
        assert_eq!(loader.inner().calls.load(Ordering::SeqCst), 2);
        assert!(loader.cache().is_empty());
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(DocumentCache::new(8, LoaderConfig::default().ttl()));
        let a = CachingLoader::with_cache(
            StaticLoader::new().with_document("https://ex/c", json!({"@context": {}})),
            cache.clone(),
        );
        let b = CachingLoader::with_cache(StaticLoader::new(), cache);

        a.load("https://ex/c", &LoadOptions::context()).unwrap();
        let doc = b.load("https://ex/c", &LoadOptions::context()).unwrap();
        assert_eq!(doc.document, json!({"@context": {}}));
    }
}
