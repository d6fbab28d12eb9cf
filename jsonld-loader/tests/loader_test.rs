//! Loader integration with the processing algorithms

use jsonld_core::{compact, expand, ErrorKind, JsonLdOptions, StaticLoader};
use jsonld_loader::{CachingLoader, DocumentCache, DocumentLoader, LoadOptions, LoaderConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn contexts() -> StaticLoader {
    StaticLoader::new()
        .with_document(
            "https://example.org/person.jsonld",
            json!({"@context": {
                "@vocab": "http://schema.org/",
                "knows": {"@type": "@id"}
            }}),
        )
        .with_document(
            "https://example.org/imported.jsonld",
            json!({"@context": {"@import": "https://example.org/person.jsonld", "nick": "http://ex/nick"}}),
        )
}

// =============================================================================
// Remote contexts through the cache
// =============================================================================

#[test]
fn remote_context_loaded_once() {
    let cache = Arc::new(DocumentCache::new(16, Duration::from_secs(60)));
    let options = JsonLdOptions::default()
        .with_document_loader(CachingLoader::with_cache(contexts(), cache.clone()));

    let doc = json!({
        "@context": "https://example.org/person.jsonld",
        "@id": "http://ex/alice",
        "name": "Alice",
        "knows": "http://ex/bob"
    });
    let expanded = expand(&doc, &options).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@id": "http://ex/alice",
            "http://schema.org/knows": [{"@id": "http://ex/bob"}],
            "http://schema.org/name": [{"@value": "Alice"}]
        }])
    );
    assert_eq!(cache.len(), 1);

    let compacted = compact(
        &expanded,
        &json!("https://example.org/person.jsonld"),
        &options,
    )
    .unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": "https://example.org/person.jsonld",
            "@id": "http://ex/alice",
            "knows": "http://ex/bob",
            "name": "Alice"
        })
    );
    assert_eq!(cache.len(), 1);
}

#[test]
fn imported_context_uses_loader() {
    let options = JsonLdOptions::default()
        .with_document_loader(CachingLoader::new(contexts(), &LoaderConfig::default()));
    let doc = json!({
        "@context": {"@import": "https://example.org/person.jsonld", "nick": "http://ex/nick"},
        "nick": "Al",
        "name": "Alice"
    });
    let expanded = expand(&doc, &options).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "http://ex/nick": [{"@value": "Al"}],
            "http://schema.org/name": [{"@value": "Alice"}]
        }])
    );
}

#[test]
fn missing_remote_context_fails() {
    let options = JsonLdOptions::default()
        .with_document_loader(CachingLoader::new(contexts(), &LoaderConfig::default()));
    let doc = json!({"@context": "https://example.org/nope.jsonld", "name": "x"});
    let err = expand(&doc, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LoadingRemoteContextFailed);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn config_drives_cache_capacity() {
    let config: LoaderConfig = serde_json::from_value(json!({"maxEntries": 1, "ttlSecs": 60})).unwrap();
    let loader = CachingLoader::new(contexts(), &config);

    loader
        .load("https://example.org/person.jsonld", &LoadOptions::context())
        .unwrap();
    loader
        .load("https://example.org/imported.jsonld", &LoadOptions::context())
        .unwrap();

    assert_eq!(loader.cache().len(), 1);
    assert!(loader.cache().get("https://example.org/imported.jsonld").is_some());
}
