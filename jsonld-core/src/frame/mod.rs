//! Framing: select subjects from a node map with a frame and embed them
//! into a tree shaped like the frame.
//!
//! The frame is parsed into a typed [`pattern`] under its own context,
//! subjects are selected by the [`matcher`], and [`embed`] builds the output
//! before it is compacted with the frame's context.

mod embed;
mod matcher;
mod pattern;

pub use embed::MAX_FRAME_DEPTH;

use crate::compact::compact_document;
use crate::context::ActiveContext;
use crate::error::{ErrorKind, JsonLdError, Result};
use crate::issuer::BlankNodeIssuer;
use crate::model::Item;
use crate::node_map::{build_node_map, merge_node_maps, DEFAULT_GRAPH};
use crate::options::JsonLdOptions;
use embed::{FrameState, Framer, Parent, MERGED_GRAPH};
use jsonld_vocab::keywords as kw;
use pattern::FrameParser;
use serde_json::{Map, Value as JsonValue};

fn frame_object(frame: &JsonValue) -> Result<&Map<String, JsonValue>> {
    match frame {
        JsonValue::Object(map) => Ok(map),
        JsonValue::Array(values) if values.len() == 1 => frame_object(&values[0]),
        other => Err(JsonLdError::frame(
            ErrorKind::InvalidFrame,
            "a frame must be a single object",
        )
        .with_value(other)),
    }
}

/// Frame expanded `items` with `frame` and compact the result with the
/// frame's context.
pub fn frame_items(items: &[Item], frame: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    let frame = frame_object(frame)?;
    let context = frame.get(kw::CONTEXT).cloned().unwrap_or(JsonValue::Null);
    let active = ActiveContext::for_options(options, None).process(&context, None, options)?;
    let parsed = FrameParser::new(options).parse_document(&active, frame)?;

    let mut issuer = BlankNodeIssuer::default();
    let node_map = build_node_map(items, &mut issuer)?;
    let merged = merge_node_maps(&node_map);
    let mut graphs = node_map.into_graphs();
    graphs.insert(MERGED_GRAPH.to_string(), merged);

    let start = if parsed.merged { MERGED_GRAPH } else { DEFAULT_GRAPH };
    let subject_ids: Vec<String> = graphs
        .get(start)
        .map(|g| g.keys().cloned().collect())
        .unwrap_or_default();

    let mut state = FrameState::new(start);
    Framer::new(options, &graphs).frame(&mut state, &subject_ids, &parsed.frame, Parent::Root)?;

    let json_ld_11 = !active.is_json_ld_10();
    let framed = state.into_items(json_ld_11);
    tracing::debug!(
        subjects = subject_ids.len(),
        matches = framed.len(),
        merged = parsed.merged,
        "framed document"
    );

    let omit_graph = options.omit_graph.unwrap_or(json_ld_11);
    compact_document(&framed, &context, options, !omit_graph)
}
