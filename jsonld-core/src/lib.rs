//! JSON-LD 1.1 processing library
//!
//! This library provides the JSON-LD transformation algorithms:
//! - Context processing (remote contexts, scoped and protected terms)
//! - Expansion to typed [`Item`]s or expanded JSON
//! - Flattening through a node map
//! - Compaction against a context
//! - Framing
//!
//! Remote documents are fetched through a [`DocumentLoader`] set on the
//! [`JsonLdOptions`]; RDF conversion lives in the `jsonld-rdf` crate.
//!
//! # Example
//!
//! ```
//! use jsonld_core::{compact, expand, JsonLdOptions};
//! use serde_json::json;
//!
//! let doc = json!({
//!     "@context": {"name": "http://schema.org/name"},
//!     "@id": "http://example.org/person/1",
//!     "name": "John Doe"
//! });
//! let options = JsonLdOptions::default();
//!
//! let expanded = expand(&doc, &options).unwrap();
//! assert_eq!(
//!     expanded,
//!     json!([{
//!         "@id": "http://example.org/person/1",
//!         "http://schema.org/name": [{"@value": "John Doe"}]
//!     }])
//! );
//!
//! let compacted = compact(&expanded, &json!({"name": "http://schema.org/name"}), &options).unwrap();
//! assert_eq!(compacted["name"], "John Doe");
//! ```

pub mod compact;
pub mod context;
pub mod error;
pub mod expand;
pub mod frame;
pub mod iri;
pub mod issuer;
pub mod loader;
pub mod model;
pub mod node_map;
pub mod options;

pub use context::{ActiveContext, Container, TermDefinition, TypeMapping};
pub use error::{DocPath, ErrorKind, JsonLdError, Result};
pub use expand::expand_document as expand_items;
pub use issuer::BlankNodeIssuer;
pub use loader::{DocumentLoader, LoadOptions, NoLoader, RemoteDocument, StaticLoader};
pub use model::{Direction, Item, List, Literal, LiteralValue, Node};
pub use node_map::{build_node_map, merge_node_maps, NodeMap};
pub use options::{Embed, JsonLdOptions, ProcessingMode, RdfDirection};

use model::items_to_json;
use serde_json::Value as JsonValue;

/// Process a local context on top of an empty active context.
///
/// # Arguments
/// * `context` - The context to process (string, object, array or null)
/// * `options` - Base IRI, processing mode and document loader
///
/// # Example
/// ```
/// use jsonld_core::{process_context, JsonLdOptions};
/// use serde_json::json;
///
/// let ctx = process_context(&json!({"schema": "http://schema.org/"}), &JsonLdOptions::default()).unwrap();
/// assert_eq!(ctx.expand_iri("schema:name", false, true).as_deref(), Some("http://schema.org/name"));
/// ```
pub fn process_context(context: &JsonValue, options: &JsonLdOptions) -> Result<ActiveContext> {
    let local = context
        .as_object()
        .and_then(|m| m.get("@context"))
        .unwrap_or(context);
    ActiveContext::for_options(options, None).process(local, None, options)
}

/// Expand a JSON-LD document.
///
/// A string input is treated as the URL of a remote document and fetched
/// through the configured document loader.
///
/// # Returns
/// The expanded document: always an array of node objects.
pub fn expand(document: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    let items = expand::expand_document(document, options)?;
    Ok(items_to_json(&items))
}

/// Compact a JSON-LD document against `context`.
///
/// The input is expanded first; the output carries `context` as its
/// `@context` unless the context is empty.
pub fn compact(document: &JsonValue, context: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    let items = expand::expand_document(document, options)?;
    tracing::debug!(items = items.len(), "compacting document");
    compact::compact_document(&items, context, options, false)
}

/// Flatten a JSON-LD document.
///
/// Without a context the result is the flattened expanded form (an array
/// of node objects sorted by `@id`); with one it is compacted and always
/// wrapped in `@graph`.
///
/// # Example
/// ```
/// use jsonld_core::{flatten, JsonLdOptions};
/// use serde_json::json;
///
/// let doc = json!({
///     "@id": "http://example.org/a",
///     "http://example.org/knows": {"@id": "http://example.org/b", "http://example.org/name": "B"}
/// });
/// let flat = flatten(&doc, None, &JsonLdOptions::default()).unwrap();
/// assert_eq!(flat.as_array().map(Vec::len), Some(2));
/// ```
pub fn flatten(
    document: &JsonValue,
    context: Option<&JsonValue>,
    options: &JsonLdOptions,
) -> Result<JsonValue> {
    let items = expand::expand_document(document, options)?;
    let mut issuer = BlankNodeIssuer::default();
    let flattened = node_map::flatten_items(&items, &mut issuer)?;
    match context {
        None => Ok(items_to_json(&flattened)),
        Some(context) => compact::compact_document(&flattened, context, options, true),
    }
}

/// Frame a JSON-LD document.
///
/// The input is expanded and flattened into a node map; subjects matching
/// `frame` are embedded into the shape of the frame and the result is
/// compacted with the frame's `@context`.
pub fn frame(document: &JsonValue, frame: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    let items = expand::expand_document(document, options)?;
    frame::frame_items(&items, frame, options)
}
