//! RDF dataset conversion for JSON-LD
//!
//! - [`to_rdf`] turns a JSON-LD document into a [`Dataset`] of quads
//! - [`from_rdf`] turns a dataset back into expanded JSON-LD
//! - [`nquads`] reads and writes the N-Quads text format
//! - [`FormatRegistry`] maps input format ids to parsers
//!
//! # Example
//!
//! ```
//! use jsonld_core::JsonLdOptions;
//! use jsonld_rdf::to_rdf_string;
//! use serde_json::json;
//!
//! let doc = json!({"@id": "https://example.com/", "https://example.com/test": "test"});
//! let nquads = to_rdf_string(&doc, &JsonLdOptions::default()).unwrap();
//! assert_eq!(nquads, "<https://example.com/> <https://example.com/test> \"test\" .\n");
//! ```

mod canonical;
pub mod error;
pub mod from_rdf;
pub mod nquads;
pub mod quad;
pub mod registry;
pub mod to_rdf;

pub use canonical::canonical_json;
pub use error::{RdfError, Result};
pub use from_rdf::RdfDeserializer;
pub use nquads::{parse_nquads, to_nquads};
pub use quad::{Dataset, Literal, Quad, Term};
pub use registry::{FormatRegistry, RdfParser};
pub use to_rdf::RdfSerializer;

use jsonld_core::model::items_to_json;
use jsonld_core::{build_node_map, expand_items, BlankNodeIssuer, Item, JsonLdOptions, NodeMap};
use jsonld_vocab::media;
use serde_json::Value as JsonValue;

/// Expand `document` and convert it to an RDF dataset.
pub fn to_rdf(document: &JsonValue, options: &JsonLdOptions) -> Result<Dataset> {
    let items = expand_items(document, options)?;
    let mut issuer = BlankNodeIssuer::default();
    let node_map = build_node_map(&items, &mut issuer)?;
    let dataset = node_map_to_rdf(&node_map, &mut issuer, options);
    tracing::debug!(quads = dataset.len(), "converted document to RDF");
    Ok(dataset)
}

/// Convert an already built node map; list nodes draw labels from `issuer`.
pub fn node_map_to_rdf(
    node_map: &NodeMap,
    issuer: &mut BlankNodeIssuer,
    options: &JsonLdOptions,
) -> Dataset {
    RdfSerializer::new(options).serialize(node_map, issuer)
}

/// Convert `document` to RDF text in `options.format` (N-Quads when unset).
pub fn to_rdf_string(document: &JsonValue, options: &JsonLdOptions) -> Result<String> {
    match options.format.as_deref() {
        None | Some(media::N_QUADS) | Some(registry::N_QUADS_ALIAS) => {
            Ok(to_nquads(&to_rdf(document, options)?))
        }
        Some(other) => Err(RdfError::UnknownFormat(other.to_string())),
    }
}

/// Convert a dataset to expanded JSON-LD items.
pub fn from_rdf(dataset: &Dataset, options: &JsonLdOptions) -> Result<Vec<Item>> {
    let items = RdfDeserializer::new(options).deserialize(dataset)?;
    tracing::debug!(quads = dataset.len(), nodes = items.len(), "converted RDF to JSON-LD");
    Ok(items)
}

/// Parse RDF text in `options.format` (N-Quads when unset) and return
/// expanded JSON-LD.
pub fn from_rdf_string(input: &str, options: &JsonLdOptions) -> Result<JsonValue> {
    from_rdf_string_with(&FormatRegistry::default(), input, options)
}

/// Like [`from_rdf_string`], resolving the format through `registry`.
pub fn from_rdf_string_with(
    registry: &FormatRegistry,
    input: &str,
    options: &JsonLdOptions,
) -> Result<JsonValue> {
    let format = options.format.as_deref().unwrap_or(media::N_QUADS);
    let dataset = registry.parse(format, input)?;
    let items = from_rdf(&dataset, options)?;
    Ok(items_to_json(&items))
}
