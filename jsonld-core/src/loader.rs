//! Document loader contract.
//!
//! Remote contexts (`"@context": "https://..."`, `@import`) and remote input
//! documents are fetched through a [`DocumentLoader`]. The algorithms call it
//! synchronously; a loader may block while it fetches.

use crate::error::{ErrorKind, JsonLdError, Result};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A loaded document together with the URL it was finally served from.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// Parsed JSON body.
    pub document: JsonValue,
    /// Final URL after redirects; used as the base IRI of the document.
    pub document_url: String,
    /// Context named by an HTTP `Link` header, if any.
    pub context_url: Option<String>,
    pub content_type: Option<String>,
}

impl RemoteDocument {
    pub fn new(document_url: impl Into<String>, document: JsonValue) -> Self {
        Self {
            document,
            document_url: document_url.into(),
            context_url: None,
            content_type: None,
        }
    }
}

/// Request hints passed to a loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Profile IRI the caller expects (e.g. the context profile).
    pub profile: Option<String>,
    pub request_profile: Vec<String>,
}

impl LoadOptions {
    /// Options used when fetching a remote `@context`.
    pub fn context() -> Self {
        Self {
            profile: Some("http://www.w3.org/ns/json-ld#context".to_string()),
            request_profile: vec!["http://www.w3.org/ns/json-ld#context".to_string()],
        }
    }
}

/// Fetches documents by URL.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, url: &str, options: &LoadOptions) -> Result<RemoteDocument>;
}

/// A loader that refuses every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoader;

impl DocumentLoader for NoLoader {
    fn load(&self, url: &str, _options: &LoadOptions) -> Result<RemoteDocument> {
        Err(JsonLdError::loader(
            ErrorKind::LoadingDocumentFailed,
            url,
            "no document loader is configured",
        ))
    }
}

/// In-memory loader serving a fixed set of documents.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, JsonValue>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `url`.
    pub fn with_document(mut self, url: impl Into<String>, document: JsonValue) -> Self {
        self.documents.insert(url.into(), document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: JsonValue) {
        self.documents.insert(url.into(), document);
    }
}

impl DocumentLoader for StaticLoader {
    fn load(&self, url: &str, _options: &LoadOptions) -> Result<RemoteDocument> {
        self.documents
            .get(url)
            .map(|doc| RemoteDocument::new(url, doc.clone()))
            .ok_or_else(|| {
                JsonLdError::loader(ErrorKind::LoadingDocumentFailed, url, "document not found")
            })
    }
}
