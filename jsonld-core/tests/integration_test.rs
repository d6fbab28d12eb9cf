//! End-to-end tests of the public entry points: expand, compact, flatten and
//! frame, including remote contexts served by a static loader.

use jsonld_core::{
    compact, expand, flatten, frame, Embed, ErrorKind, JsonLdOptions, StaticLoader,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

fn options() -> JsonLdOptions {
    JsonLdOptions::default()
}

// ============================================================================
// @graph containers
// ============================================================================

fn graph_container_doc() -> JsonValue {
    json!({
        "@context": {
            "@version": 1.1,
            "input": {"@id": "foo:input", "@container": "@graph"},
            "value": "foo:value"
        },
        "input": {"value": "x"}
    })
}

#[test]
fn test_expand_graph_container() {
    let expanded = expand(&graph_container_doc(), &options()).unwrap();
    assert_eq!(
        expanded,
        json!([{"foo:input": [{"@graph": [{"foo:value": [{"@value": "x"}]}]}]}])
    );
}

#[test]
fn test_compact_graph_set_container() {
    let context = json!({
        "@version": 1.1,
        "input": {"@id": "foo:input", "@container": ["@graph", "@set"]},
        "value": "foo:value"
    });
    let expanded = expand(&graph_container_doc(), &options()).unwrap();
    let compacted = compact(&expanded, &context, &options()).unwrap();
    assert_eq!(
        compacted,
        json!({"@context": context, "input": [{"value": "x"}]})
    );
}

#[test]
fn test_named_graph_flattens_into_graph_object() {
    let doc = json!({
        "@context": {"@vocab": "http://example.org/"},
        "@id": "http://example.org/g",
        "@graph": [{"@id": "http://example.org/s", "name": "S"}]
    });
    let flat = flatten(&doc, None, &options()).unwrap();
    assert_eq!(
        flat,
        json!([{
            "@id": "http://example.org/g",
            "@graph": [{
                "@id": "http://example.org/s",
                "http://example.org/name": [{"@value": "S"}]
            }]
        }])
    );
}

// ============================================================================
// Round trips and idempotence
// ============================================================================

#[test]
fn test_expand_compact_round_trip() {
    let context = json!({
        "@vocab": "http://schema.org/",
        "knows": {"@type": "@id"},
        "tags": {"@container": "@set"},
        "label": {"@id": "http://www.w3.org/2000/01/rdf-schema#label", "@container": "@language"}
    });
    let doc = json!({
        "@context": context,
        "@id": "http://example.org/alice",
        "@type": "Person",
        "name": "Alice",
        "knows": "http://example.org/bob",
        "tags": ["a"],
        "label": {"en": "Alice", "fr": "Alice-fr"}
    });

    let expanded = expand(&doc, &options()).unwrap();
    let compacted = compact(&expanded, &context, &options()).unwrap();
    assert_eq!(compacted, doc);
    assert_eq!(expand(&compacted, &options()).unwrap(), expanded);
}

#[test]
fn test_flatten_is_idempotent() {
    let doc = json!({
        "@context": {"@vocab": "http://example.org/"},
        "@id": "http://example.org/a",
        "knows": {
            "name": "anonymous",
            "knows": {"@id": "http://example.org/b", "name": "B"}
        }
    });

    let once = flatten(&doc, None, &options()).unwrap();
    let twice = flatten(&once, None, &options()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.as_array().map(Vec::len), Some(3));
}

#[test]
fn test_flatten_merges_subjects() {
    let doc = json!([
        {"@id": "http://example.org/a", "http://example.org/p": "1"},
        {"@id": "http://example.org/a", "http://example.org/p": ["1", "2"]}
    ]);
    let flat = flatten(&doc, Some(&json!({"p": "http://example.org/p"})), &options()).unwrap();
    assert_eq!(
        flat,
        json!({
            "@context": {"p": "http://example.org/p"},
            "@graph": [{"@id": "http://example.org/a", "p": ["1", "2"]}]
        })
    );
}

// ============================================================================
// Protected terms and context errors
// ============================================================================

#[test]
fn test_protected_term_redefinition_fails() {
    let doc = json!({
        "@context": [
            {"@version": 1.1, "@protected": true, "name": "http://schema.org/name"},
            {"name": "http://example.org/name"}
        ],
        "name": "x"
    });
    let err = expand(&doc, &options()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtectedTermRedefinition);
}

#[test]
fn test_protected_term_identical_redefinition_allowed() {
    let doc = json!({
        "@context": [
            {"@protected": true, "name": "http://schema.org/name"},
            {"name": "http://schema.org/name"}
        ],
        "name": "x"
    });
    let expanded = expand(&doc, &options()).unwrap();
    assert_eq!(expanded, json!([{"http://schema.org/name": [{"@value": "x"}]}]));
}

#[test]
fn test_keyword_redefinition_fails() {
    let err = expand(&json!({"@context": {"@id": "http://example.org/id"}}), &options()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeywordRedefinition);
}

// ============================================================================
// Remote contexts
// ============================================================================

#[test]
fn test_remote_context_through_static_loader() {
    let loader = StaticLoader::new().with_document(
        "https://example.org/contexts/person.jsonld",
        json!({"@context": {"@vocab": "http://schema.org/", "knows": {"@type": "@id"}}}),
    );
    let options = JsonLdOptions::default().with_document_loader(loader);

    let doc = json!({
        "@context": "https://example.org/contexts/person.jsonld",
        "@id": "http://example.org/alice",
        "knows": "http://example.org/bob"
    });
    let expanded = expand(&doc, &options).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@id": "http://example.org/alice",
            "http://schema.org/knows": [{"@id": "http://example.org/bob"}]
        }])
    );

    let compacted = compact(&expanded, &json!("https://example.org/contexts/person.jsonld"), &options)
        .unwrap();
    assert_eq!(compacted, doc);
}

#[test]
fn test_remote_document_by_url() {
    let loader = StaticLoader::new().with_document(
        "https://example.org/data/alice.jsonld",
        json!({
            "@context": {"@vocab": "http://schema.org/"},
            "@id": "alice",
            "name": "Alice"
        }),
    );
    let options = JsonLdOptions::default().with_document_loader(loader);

    let expanded = expand(&json!("https://example.org/data/alice.jsonld"), &options).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@id": "https://example.org/data/alice",
            "http://schema.org/name": [{"@value": "Alice"}]
        }])
    );
}

#[test]
fn test_missing_remote_context() {
    let options = JsonLdOptions::default().with_document_loader(StaticLoader::new());
    let err = expand(&json!({"@context": "https://example.org/missing"}), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LoadingRemoteContextFailed);
}

// ============================================================================
// Framing
// ============================================================================

fn cyclic_doc() -> JsonValue {
    json!({
        "@context": {"@vocab": "http://example.org/"},
        "@graph": [
            {"@id": "http://example.org/a", "@type": "Person", "knows": {"@id": "http://example.org/b"}},
            {"@id": "http://example.org/b", "@type": "Person", "knows": {"@id": "http://example.org/a"}}
        ]
    })
}

#[test]
fn test_frame_cycle_terminates_under_always() {
    let out = frame(
        &cyclic_doc(),
        &json!({
            "@context": {"@vocab": "http://example.org/"},
            "@id": "http://example.org/a",
            "@embed": "@always"
        }),
        &options(),
    )
    .unwrap();

    assert_eq!(
        out,
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@id": "http://example.org/a",
            "@type": "Person",
            "knows": {
                "@id": "http://example.org/b",
                "@type": "Person",
                "knows": {"@id": "http://example.org/a"}
            }
        })
    );
}

#[test]
fn test_frame_embed_never_from_options() {
    let options = JsonLdOptions::default().with_embed(Embed::Never);
    let out = frame(
        &cyclic_doc(),
        &json!({"@context": {"@vocab": "http://example.org/"}, "@id": "http://example.org/a"}),
        &options,
    )
    .unwrap();
    assert_eq!(out["knows"], json!({"@id": "http://example.org/b"}));
}

#[test]
fn test_frame_invalid_embed_value() {
    let err = frame(&cyclic_doc(), &json!({"@embed": "@sometimes"}), &options()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidEmbedValue);
}

#[test]
fn test_frame_all_matches_under_graph() {
    let out = frame(
        &cyclic_doc(),
        &json!({"@context": {"@vocab": "http://example.org/"}, "@type": "Person", "@embed": "@never"}),
        &options(),
    )
    .unwrap();
    assert_eq!(
        out,
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@graph": [
                {"@id": "http://example.org/a", "@type": "Person", "knows": {"@id": "http://example.org/b"}},
                {"@id": "http://example.org/b", "@type": "Person", "knows": {"@id": "http://example.org/a"}}
            ]
        })
    );
}
