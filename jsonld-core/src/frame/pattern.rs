//! Frames parsed into typed patterns.
//!
//! A frame document is read under its own `@context`: keys are expanded
//! to IRIs, `@id` and `@type` constraints are validated, and scalar
//! patterns and `@default` values go through value expansion.

use crate::context::{ActiveContext, Scope};
use crate::error::{ErrorKind, JsonLdError, Result};
use crate::expand::Expander;
use crate::iri;
use crate::model::Item;
use crate::options::{Embed, JsonLdOptions};
use jsonld_vocab::keywords::{self as kw, is_keyword};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// `@id` constraint of a frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum IdPattern {
    /// `{}` or `[]`: any subject.
    Wildcard,
    Values(Vec<String>),
}

/// `@type` constraint of a frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TypePattern {
    /// `[]`: only subjects without a type.
    MatchNone,
    /// `{}`: any subject with at least one type.
    Wildcard,
    /// Subjects with one of `iris`; a `@default` type matches every subject
    /// and is written to untyped output nodes.
    Values {
        iris: Vec<String>,
        default: Option<String>,
    },
}

/// Constraint on one part of a value object.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ValueConstraint<T> {
    Absent,
    Wildcard,
    Values(Vec<T>),
}

impl<T> ValueConstraint<T> {
    fn is_absent(&self) -> bool {
        matches!(self, ValueConstraint::Absent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValuePattern {
    pub(crate) value: ValueConstraint<JsonValue>,
    pub(crate) datatype: ValueConstraint<String>,
    /// Lower-cased language tags.
    pub(crate) language: ValueConstraint<String>,
}

impl ValuePattern {
    pub(crate) fn is_unconstrained(&self) -> bool {
        self.value.is_absent() && self.datatype.is_absent() && self.language.is_absent()
    }
}

/// Pattern of a single frame property.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pattern {
    /// `[]`: the subject must not have the property.
    MatchNone,
    Node(Frame),
    Value(ValuePattern),
    /// `{"@list": [pattern]}`; `None` when the list pattern is empty.
    List(Option<Box<Pattern>>),
}

impl Pattern {
    pub(crate) fn node_frame(&self) -> Option<&Frame> {
        match self {
            Pattern::Node(frame) => Some(frame),
            _ => None,
        }
    }

    pub(crate) fn default_value(&self) -> Option<&[Item]> {
        self.node_frame().and_then(|f| f.default.as_deref())
    }
}

/// Flags set by frame keywords; unset flags fall back to the options.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct FrameFlags {
    pub(crate) embed: Option<Embed>,
    pub(crate) explicit: Option<bool>,
    pub(crate) require_all: Option<bool>,
    pub(crate) omit_default: Option<bool>,
}

/// Flags in effect for one frame level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Flags {
    pub(crate) embed: Embed,
    pub(crate) explicit: bool,
    pub(crate) require_all: bool,
}

impl FrameFlags {
    pub(crate) fn resolve(&self, options: &JsonLdOptions) -> Flags {
        Flags {
            embed: self.embed.unwrap_or(options.embed),
            explicit: self.explicit.unwrap_or(options.explicit),
            require_all: self.require_all.unwrap_or(options.require_all),
        }
    }
}

/// One level of a frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Frame {
    pub(crate) id: Option<IdPattern>,
    pub(crate) types: Option<TypePattern>,
    pub(crate) properties: BTreeMap<String, Pattern>,
    pub(crate) reverse: BTreeMap<String, Frame>,
    pub(crate) graph: Option<Box<Frame>>,
    pub(crate) included: Option<Box<Frame>>,
    pub(crate) default: Option<Vec<Item>>,
    pub(crate) flags: FrameFlags,
}

impl Frame {
    /// Frame matching anything, carrying `flags` down to nested subjects.
    pub(crate) fn implicit(flags: &Flags) -> Self {
        Frame {
            flags: FrameFlags {
                embed: Some(flags.embed),
                explicit: Some(flags.explicit),
                require_all: Some(flags.require_all),
                omit_default: None,
            },
            ..Default::default()
        }
    }

    /// Only an `@id` constraint: matched against the referenced subject.
    pub(crate) fn is_reference_pattern(&self) -> bool {
        self.id.is_some()
            && self.types.is_none()
            && self.properties.is_empty()
            && self.reverse.is_empty()
            && self.graph.is_none()
            && self.included.is_none()
            && self.default.is_none()
            && self.flags == FrameFlags::default()
    }
}

fn invalid(message: impl Into<String>, value: &JsonValue) -> JsonLdError {
    JsonLdError::frame(ErrorKind::InvalidFrame, message).with_value(value)
}

fn as_array(value: &JsonValue) -> &[JsonValue] {
    match value {
        JsonValue::Array(values) => values,
        single => std::slice::from_ref(single),
    }
}

fn is_empty_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// The single pattern object of a frame value.
fn single_object<'v>(value: &'v JsonValue) -> Result<Option<&'v Map<String, JsonValue>>> {
    match as_array(value) {
        [] => Ok(None),
        [JsonValue::Object(map)] => Ok(Some(map)),
        _ => Err(invalid("a frame must be a single object", value)),
    }
}

/// Parsed top-level frame.
#[derive(Debug)]
pub(crate) struct FrameDocument {
    pub(crate) frame: Frame,
    /// Frame the merged graph instead of the default graph.
    pub(crate) merged: bool,
}

pub(crate) struct FrameParser<'a> {
    options: &'a JsonLdOptions,
    expander: Expander<'a>,
}

impl<'a> FrameParser<'a> {
    pub(crate) fn new(options: &'a JsonLdOptions) -> Self {
        Self {
            options,
            expander: Expander::new(options),
        }
    }

    /// Parse a frame document whose `@context` produced `active`.
    pub(crate) fn parse_document(
        &self,
        active: &ActiveContext,
        frame: &Map<String, JsonValue>,
    ) -> Result<FrameDocument> {
        let graph_key = frame
            .keys()
            .find(|k| active.expand_iri(k, false, true).as_deref() == Some(kw::GRAPH));
        let merged = graph_key.is_none();

        let only_graph = frame.keys().all(|k| k == kw::CONTEXT || Some(k) == graph_key);
        let frame = match graph_key.filter(|_| only_graph) {
            Some(key) => match single_object(&frame[key])? {
                Some(map) => self.parse_frame(active, map, None)?,
                None => Frame::default(),
            },
            None => self.parse_entries(active, frame, None)?,
        };
        Ok(FrameDocument { frame, merged })
    }

    /// A nested frame object, under its own embedded `@context` if it has one.
    fn parse_frame(
        &self,
        active: &ActiveContext,
        map: &Map<String, JsonValue>,
        active_property: Option<&str>,
    ) -> Result<Frame> {
        let active: Cow<'_, ActiveContext> = match map.get(kw::CONTEXT) {
            Some(local) => Cow::Owned(active.process(local, None, self.options)?),
            None => Cow::Borrowed(active),
        };
        self.parse_entries(&active, map, active_property)
    }

    fn parse_entries(
        &self,
        active: &ActiveContext,
        map: &Map<String, JsonValue>,
        active_property: Option<&str>,
    ) -> Result<Frame> {
        let mut frame = Frame::default();
        for (key, value) in map {
            if key == kw::CONTEXT {
                continue;
            }
            let Some(expanded) = active.expand_iri(key, false, true) else {
                continue;
            };
            match expanded.as_str() {
                kw::ID => frame.id = Some(self.parse_ids(active, value)?),
                kw::TYPE => frame.types = Some(self.parse_types(active, value)?),
                kw::REVERSE => {
                    let Some(reverse) = value.as_object() else {
                        return Err(invalid("@reverse must be an object", value));
                    };
                    for (rkey, rvalue) in reverse {
                        let Some(property) = active.expand_iri(rkey, false, true) else {
                            continue;
                        };
                        let sub = match single_object(rvalue)? {
                            Some(m) => self.parse_frame(active, m, Some(rkey))?,
                            None => Frame::default(),
                        };
                        frame.reverse.insert(property, sub);
                    }
                }
                kw::GRAPH => frame.graph = Some(Box::new(self.parse_sub_frame(active, value)?)),
                kw::INCLUDED => {
                    frame.included = Some(Box::new(self.parse_sub_frame(active, value)?))
                }
                kw::EMBED => frame.flags.embed = Some(parse_embed(value)?),
                kw::EXPLICIT => frame.flags.explicit = Some(parse_flag(key, value)?),
                kw::REQUIRE_ALL => frame.flags.require_all = Some(parse_flag(key, value)?),
                kw::OMIT_DEFAULT => frame.flags.omit_default = Some(parse_flag(key, value)?),
                kw::DEFAULT => frame.default = Some(self.parse_default(active, active_property, value)?),
                other if is_keyword(other) => {}
                property if property.contains(':') => {
                    let pattern = self.parse_pattern(active, key, value)?;
                    frame.properties.insert(property.to_string(), pattern);
                }
                _ => {}
            }
        }
        Ok(frame)
    }

    fn parse_sub_frame(&self, active: &ActiveContext, value: &JsonValue) -> Result<Frame> {
        match single_object(value)? {
            Some(map) => self.parse_frame(active, map, None),
            None => Ok(Frame::default()),
        }
    }

    fn parse_ids(&self, active: &ActiveContext, value: &JsonValue) -> Result<IdPattern> {
        let values = as_array(value);
        if values.is_empty() || (values.len() == 1 && is_empty_object(&values[0])) {
            return Ok(IdPattern::Wildcard);
        }
        let mut ids = Vec::with_capacity(values.len());
        for v in values {
            let id = v
                .as_str()
                .and_then(|s| active.expand_iri(s, true, false))
                .filter(|id| iri::is_absolute(id) && !iri::is_blank(id))
                .ok_or_else(|| invalid("invalid @id in frame", v))?;
            ids.push(id);
        }
        Ok(IdPattern::Values(ids))
    }

    fn parse_types(&self, active: &ActiveContext, value: &JsonValue) -> Result<TypePattern> {
        let values = as_array(value);
        if values.is_empty() {
            return Ok(TypePattern::MatchNone);
        }
        if values.len() == 1 && is_empty_object(&values[0]) {
            return Ok(TypePattern::Wildcard);
        }
        let expand_type = |v: &JsonValue| {
            v.as_str()
                .and_then(|s| active.expand_iri(s, true, true))
                .filter(|t| iri::is_absolute(t) && !iri::is_blank(t))
                .ok_or_else(|| invalid("invalid @type in frame", v))
        };
        let mut iris = Vec::new();
        let mut default = None;
        for v in values {
            match v.as_object().and_then(|m| m.get(kw::DEFAULT)) {
                Some(d) => default = Some(expand_type(d)?),
                None => iris.push(expand_type(v)?),
            }
        }
        Ok(TypePattern::Values { iris, default })
    }

    fn parse_default(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        value: &JsonValue,
    ) -> Result<Vec<Item>> {
        if value.is_null() || value.as_str() == Some(kw::NULL) {
            return Ok(vec![Item::Null]);
        }
        let expanded = self
            .expander
            .expand_element(active, active_property, value, active.base(), false, &[])?;
        Ok(expanded.unwrap_or_else(|| vec![Item::Null]))
    }

    fn parse_pattern(&self, active: &ActiveContext, term: &str, value: &JsonValue) -> Result<Pattern> {
        let scoped = match active.term(term) {
            Some(def) => active.apply_scoped(def, Scope::Property, self.options)?,
            None => None,
        };
        let active = scoped.as_ref().unwrap_or(active);

        let Some(first) = as_array(value).first() else {
            return Ok(Pattern::MatchNone);
        };
        match first {
            JsonValue::Object(map) => {
                let keyword_of = |k: &str| active.expand_iri(k, false, true);
                if let Some((_, list)) = map.iter().find(|(k, _)| keyword_of(k).as_deref() == Some(kw::LIST)) {
                    let inner = match as_array(list).first() {
                        Some(inner) => Some(Box::new(self.parse_pattern(active, term, inner)?)),
                        None => None,
                    };
                    return Ok(Pattern::List(inner));
                }
                if map.keys().any(|k| keyword_of(k).as_deref() == Some(kw::VALUE)) {
                    return Ok(Pattern::Value(self.parse_value_pattern(active, map)?));
                }
                Ok(Pattern::Node(self.parse_frame(active, map, Some(term))?))
            }
            JsonValue::Array(_) => Err(invalid("nested arrays are not valid frame patterns", value)),
            scalar => match self.expander.expand_value(active, Some(term), scalar) {
                Item::Value(literal) => Ok(Pattern::Value(ValuePattern {
                    value: ValueConstraint::Values(vec![literal.value.to_json()]),
                    datatype: match literal.type_iri() {
                        Some(t) => ValueConstraint::Values(vec![t.to_string()]),
                        None => ValueConstraint::Absent,
                    },
                    language: match &literal.language {
                        Some(l) => ValueConstraint::Values(vec![l.to_ascii_lowercase()]),
                        None => ValueConstraint::Absent,
                    },
                })),
                Item::Node(node) => Ok(Pattern::Node(Frame {
                    id: Some(IdPattern::Values(node.id.into_iter().collect())),
                    ..Default::default()
                })),
                _ => Err(invalid("unsupported frame pattern", value)),
            },
        }
    }

    fn parse_value_pattern(
        &self,
        active: &ActiveContext,
        map: &Map<String, JsonValue>,
    ) -> Result<ValuePattern> {
        let mut pattern = ValuePattern {
            value: ValueConstraint::Absent,
            datatype: ValueConstraint::Absent,
            language: ValueConstraint::Absent,
        };
        for (key, value) in map {
            let values = as_array(value);
            let wildcard = values.len() == 1 && is_empty_object(&values[0]);
            match active.expand_iri(key, false, true).as_deref() {
                Some(kw::VALUE) if wildcard => pattern.value = ValueConstraint::Wildcard,
                Some(kw::VALUE) => pattern.value = ValueConstraint::Values(values.to_vec()),
                Some(kw::TYPE) if wildcard => pattern.datatype = ValueConstraint::Wildcard,
                Some(kw::TYPE) => {
                    let mut types = Vec::with_capacity(values.len());
                    for v in values {
                        let t = v
                            .as_str()
                            .and_then(|s| active.expand_iri(s, true, true))
                            .ok_or_else(|| invalid("invalid @type in value pattern", v))?;
                        types.push(t);
                    }
                    pattern.datatype = ValueConstraint::Values(types);
                }
                Some(kw::LANGUAGE) if wildcard => pattern.language = ValueConstraint::Wildcard,
                Some(kw::LANGUAGE) => {
                    let mut languages = Vec::with_capacity(values.len());
                    for v in values {
                        let l = v
                            .as_str()
                            .ok_or_else(|| invalid("invalid @language in value pattern", v))?;
                        languages.push(l.to_ascii_lowercase());
                    }
                    pattern.language = ValueConstraint::Values(languages);
                }
                _ => {}
            }
        }
        Ok(pattern)
    }
}

fn parse_embed(value: &JsonValue) -> Result<Embed> {
    let embed = match value {
        JsonValue::Bool(true) => Some(Embed::Once),
        JsonValue::Bool(false) => Some(Embed::Never),
        JsonValue::String(s) => Embed::parse(s),
        _ => None,
    };
    embed.ok_or_else(|| {
        JsonLdError::frame(ErrorKind::InvalidEmbedValue, "invalid value of @embed").with_value(value)
    })
}

fn parse_flag(key: &str, value: &JsonValue) -> Result<bool> {
    let flag = match value {
        JsonValue::Object(map) => map.get(kw::VALUE).and_then(JsonValue::as_bool),
        other => other.as_bool(),
    };
    flag.ok_or_else(|| invalid(format!("{} must be a boolean", key), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(frame: JsonValue) -> Result<FrameDocument> {
        let options = JsonLdOptions::default();
        let map = frame.as_object().cloned().unwrap_or_default();
        let active = ActiveContext::default().process(
            map.get("@context").unwrap_or(&JsonValue::Null),
            None,
            &options,
        )?;
        FrameParser::new(&options).parse_document(&active, &map)
    }

    #[test]
    fn test_parse_types_and_properties() {
        let doc = parse(json!({
            "@context": {"@vocab": "http://example.com/"},
            "@type": "Library",
            "contains": {"@type": "Book", "@embed": "@always"},
            "name": {"@default": "unnamed"},
            "tag": []
        }))
        .unwrap();

        assert!(doc.merged);
        let frame = doc.frame;
        assert_eq!(
            frame.types,
            Some(TypePattern::Values {
                iris: vec!["http://example.com/Library".to_string()],
                default: None
            })
        );
        let contains = frame.properties["http://example.com/contains"].node_frame().unwrap();
        assert_eq!(contains.flags.embed, Some(Embed::Always));
        assert_eq!(
            frame.properties["http://example.com/name"].default_value().unwrap()[0]
                .as_literal()
                .and_then(|l| l.value.as_str()),
            Some("unnamed")
        );
        assert_eq!(frame.properties["http://example.com/tag"], Pattern::MatchNone);
    }

    #[test]
    fn test_graph_only_frame_targets_default_graph() {
        let doc = parse(json!({"@graph": {"@type": "http://example.com/T"}})).unwrap();
        assert!(!doc.merged);
        assert!(doc.frame.types.is_some());
    }

    #[test]
    fn test_value_patterns() {
        let doc = parse(json!({
            "http://example.com/name": {"@value": {}, "@language": "EN"},
            "http://example.com/age": 42
        }))
        .unwrap();
        let Pattern::Value(name) = &doc.frame.properties["http://example.com/name"] else {
            panic!("expected a value pattern");
        };
        assert_eq!(name.value, ValueConstraint::Wildcard);
        assert_eq!(name.language, ValueConstraint::Values(vec!["en".to_string()]));
        let Pattern::Value(age) = &doc.frame.properties["http://example.com/age"] else {
            panic!("expected a value pattern");
        };
        assert_eq!(age.value, ValueConstraint::Values(vec![json!(42)]));
    }

    #[test]
    fn test_invalid_frames() {
        let err = parse(json!({"@id": "_:b0"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFrame);

        let err = parse(json!({"@embed": "@sometimes"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEmbedValue);

        let err = parse(json!({"@explicit": "yes"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFrame);
    }
}
