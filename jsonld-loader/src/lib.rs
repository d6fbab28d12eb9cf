//! Document loaders for JSON-LD processing
//!
//! - [`DocumentCache`]: LRU + TTL cache of remote documents
//! - [`CachingLoader`]: wraps any [`DocumentLoader`] with a cache
//! - [`HttpLoader`]: blocking HTTP(S) loader (cargo feature `http`)
//!
//! Loaders plug into processing through
//! [`JsonLdOptions::with_document_loader`](jsonld_core::JsonLdOptions::with_document_loader).
//!
//! ```
//! use jsonld_core::{expand, JsonLdOptions, StaticLoader};
//! use jsonld_loader::{CachingLoader, LoaderConfig};
//! use serde_json::json;
//!
//! let contexts = StaticLoader::new().with_document(
//!     "https://example.org/ctx.jsonld",
//!     json!({"@context": {"name": "http://schema.org/name"}}),
//! );
//! let options = JsonLdOptions::default()
//!     .with_document_loader(CachingLoader::new(contexts, &LoaderConfig::default()));
//!
//! let doc = json!({"@context": "https://example.org/ctx.jsonld", "name": "Ada"});
//! let expanded = expand(&doc, &options).unwrap();
//! assert_eq!(expanded, json!([{"http://schema.org/name": [{"@value": "Ada"}]}]));
//! ```

pub mod cache;
pub mod caching;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod link;

pub use cache::DocumentCache;
pub use caching::CachingLoader;
pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
#[cfg(feature = "http")]
pub use http::HttpLoader;
pub use link::{parse_link_header, Link};

pub use jsonld_core::{DocumentLoader, LoadOptions, RemoteDocument};
