//! Expansion: compacted JSON-LD to the typed expanded form.
//!
//! Every key is resolved to an absolute IRI or keyword, every value becomes
//! an [`Item`], and contexts are dropped. Errors carry the path of the
//! offending entry inside the input document.

use crate::context::{ActiveContext, Container, Scope, TypeMapping};
use crate::error::{ErrorKind, JsonLdError, Result};
use crate::iri;
use crate::loader::LoadOptions;
use crate::model::{Direction, Item, List, Literal, LiteralValue, Node};
use crate::options::JsonLdOptions;
use jsonld_vocab::keywords::{self as kw, is_keyword};
use serde_json::{json, Map, Value as JsonValue};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

fn child(path: &[JsonValue], segment: JsonValue) -> Vec<JsonValue> {
    let mut next = path.to_vec();
    next.push(segment);
    next
}

fn err(kind: ErrorKind, message: impl Into<String>, path: &[JsonValue]) -> JsonLdError {
    JsonLdError::expand(kind, message, path)
}

fn expands_to(active: &ActiveContext, key: &str, keyword: &str) -> bool {
    active.expand_iri(key, false, true).as_deref() == Some(keyword)
}

fn as_array(value: &JsonValue) -> Vec<&JsonValue> {
    match value {
        JsonValue::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Expand a whole document.
///
/// A JSON string is treated as the URL of a remote document and fetched
/// through the configured loader. A top-level object holding only `@graph`
/// is unwrapped.
pub fn expand_document(document: &JsonValue, options: &JsonLdOptions) -> Result<Vec<Item>> {
    let remote;
    let (document, document_url, context_url) = match document {
        JsonValue::String(url) => {
            let loader = options.document_loader().ok_or_else(|| {
                JsonLdError::loader(
                    ErrorKind::LoadingDocumentFailed,
                    url.as_str(),
                    "no document loader is configured",
                )
            })?;
            tracing::debug!(url = url.as_str(), "loading remote document");
            remote = loader.load(url, &LoadOptions::default())?;
            (
                &remote.document,
                Some(remote.document_url.as_str()),
                remote.context_url.as_deref(),
            )
        }
        other => (other, None, None),
    };

    let mut active = ActiveContext::for_options(options, document_url);
    if let Some(expand_context) = &options.expand_context {
        let local = expand_context
            .as_object()
            .and_then(|m| m.get(kw::CONTEXT))
            .unwrap_or(expand_context);
        active = active.process(local, None, options)?;
    }
    if let Some(context_url) = context_url {
        active = active.process(&json!(context_url), document_url, options)?;
    }

    let base_url = options.base.as_deref().or(document_url);
    let expanded = Expander::new(options).expand_element(&active, None, document, base_url, false, &[])?;

    let mut items = expanded.unwrap_or_default();
    let only_graph = matches!(
        items.as_slice(),
        [Item::Node(node)] if node.is_simple_graph_object() && node.index.is_none()
    );
    if only_graph {
        if let Some(Item::Node(node)) = items.pop() {
            items = node.graph.unwrap_or_default();
        }
    }
    tracing::debug!(items = items.len(), "expanded document");
    Ok(items)
}

/// Borrowed state shared by the entries of one object.
#[derive(Clone, Copy)]
struct ObjectScope<'c> {
    active: &'c ActiveContext,
    /// Context before type-scoped contexts were applied; used to expand
    /// `@type` values.
    type_scoped: &'c ActiveContext,
    active_property: Option<&'c str>,
    input_type: Option<&'c str>,
    base_url: Option<&'c str>,
}

/// Keyword and property entries collected from one JSON object.
#[derive(Debug, Default)]
struct Pending {
    seen: HashSet<String>,
    id: Option<String>,
    types: Vec<String>,
    value: Option<JsonValue>,
    language: Option<String>,
    direction: Option<Direction>,
    index: Option<String>,
    list: Option<Vec<Item>>,
    set: Option<Vec<Item>>,
    graph: Option<Vec<Item>>,
    included: Option<Vec<Item>>,
    reverse: BTreeMap<String, Vec<Item>>,
    properties: BTreeMap<String, Vec<Item>>,
}

impl Pending {
    fn has_node_content(&self) -> bool {
        self.id.is_some()
            || self.graph.is_some()
            || self.included.is_some()
            || !self.reverse.is_empty()
            || !self.properties.is_empty()
    }
}

pub(crate) struct Expander<'a> {
    options: &'a JsonLdOptions,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(options: &'a JsonLdOptions) -> Self {
        Self { options }
    }

    fn entries<'m>(&self, map: &'m Map<String, JsonValue>) -> Vec<(&'m String, &'m JsonValue)> {
        let mut entries: Vec<_> = map.iter().collect();
        if self.options.ordered {
            entries.sort_by(|a, b| a.0.cmp(b.0));
        }
        entries
    }

    /// Expand `element`. None stands for JSON null (the entry is dropped);
    /// an empty vector is an empty array.
    pub(crate) fn expand_element(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &JsonValue,
        base_url: Option<&str>,
        from_map: bool,
        path: &[JsonValue],
    ) -> Result<Option<Vec<Item>>> {
        match element {
            JsonValue::Null => Ok(None),
            JsonValue::Array(values) => {
                let is_list = active.has_container(active_property, Container::List);
                let mut result = Vec::new();
                for (i, value) in values.iter().enumerate() {
                    let item_path = child(path, json!(i));
                    if is_list && value.is_array() {
                        return Err(err(
                            ErrorKind::ListOfLists,
                            "a list may not contain another list",
                            &item_path,
                        ));
                    }
                    if let Some(expanded) = self.expand_element(
                        active,
                        active_property,
                        value,
                        base_url,
                        from_map,
                        &item_path,
                    )? {
                        result.extend(expanded);
                    }
                }
                Ok(Some(result))
            }
            JsonValue::Object(map) => {
                self.expand_object(active, active_property, map, base_url, from_map, path)
            }
            scalar => {
                // free-floating scalars are dropped
                let Some(property) = active_property.filter(|p| *p != kw::GRAPH) else {
                    return Ok(None);
                };
                let scoped = match active.term(property) {
                    Some(def) => active.apply_scoped(def, Scope::Property, self.options)?,
                    None => None,
                };
                let active = scoped.as_ref().unwrap_or(active);
                Ok(Some(vec![self.expand_value(active, Some(property), scalar)]))
            }
        }
    }

    /// Value expansion of a scalar under `active_property`'s coercion.
    pub(crate) fn expand_value(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        value: &JsonValue,
    ) -> Item {
        let mapping = active.type_mapping(active_property);
        if let JsonValue::String(s) = value {
            match mapping {
                Some(TypeMapping::Id) => {
                    return Item::Node(Node {
                        id: active.expand_iri(s, true, false),
                        ..Default::default()
                    })
                }
                Some(TypeMapping::Vocab) => {
                    return Item::Node(Node {
                        id: active.expand_iri(s, true, true),
                        ..Default::default()
                    })
                }
                _ => {}
            }
        }

        let Some(mut literal) = Literal::from_scalar(value) else {
            return Item::Value(Literal::json(value.clone()));
        };
        match mapping {
            Some(TypeMapping::Iri(datatype)) => literal.datatype = Some(datatype.clone()),
            Some(TypeMapping::Json) => literal = Literal::json(value.clone()),
            _ if value.is_string() => {
                literal.language = active.language_for(active_property).map(str::to_string);
                literal.direction = active.direction_for(active_property);
            }
            _ => {}
        }
        Item::Value(literal)
    }

    fn expand_object(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        map: &Map<String, JsonValue>,
        base_url: Option<&str>,
        from_map: bool,
        path: &[JsonValue],
    ) -> Result<Option<Vec<Item>>> {
        let property_def = active_property.and_then(|p| active.term(p));

        let mut active: Cow<'_, ActiveContext> = Cow::Borrowed(active);

        // type-scoped contexts do not reach nested nodes
        if let Some(previous) = active.previous.clone() {
            let is_value = map.keys().any(|k| expands_to(&active, k, kw::VALUE));
            let is_reference =
                map.len() == 1 && map.keys().all(|k| expands_to(&active, k, kw::ID));
            if !from_map && !is_value && !is_reference {
                active = Cow::Owned((*previous).clone());
            }
        }

        if let Some(def) = property_def {
            if let Some(scoped) = active.apply_scoped(def, Scope::Property, self.options)? {
                active = Cow::Owned(scoped);
            }
        }

        if let Some(local) = map.get(kw::CONTEXT) {
            active = Cow::Owned(active.process(local, base_url, self.options)?);
        }

        let type_scoped = active.clone();

        let mut type_entries: Vec<(&String, &JsonValue)> = map
            .iter()
            .filter(|(k, _)| expands_to(&active, k, kw::TYPE))
            .collect();
        type_entries.sort_by(|a, b| a.0.cmp(b.0));
        let mut input_type = None;
        for (_, types) in type_entries {
            let mut terms: Vec<&str> = as_array(types)
                .into_iter()
                .filter_map(JsonValue::as_str)
                .collect();
            if let Some(last) = terms.last() {
                input_type = type_scoped.expand_iri(last, true, true);
            }
            terms.sort_unstable();
            for term in terms {
                if let Some(def) = type_scoped.term(term) {
                    if let Some(scoped) = active.apply_scoped(def, Scope::Type, self.options)? {
                        active = Cow::Owned(scoped);
                    }
                }
            }
        }

        let scope = ObjectScope {
            active: &active,
            type_scoped: &type_scoped,
            active_property,
            input_type: input_type.as_deref(),
            base_url,
        };
        let mut out = Pending::default();
        self.expand_entries(&mut out, scope, map, path)?;

        self.finish(out, active_property, input_type.as_deref(), path)
    }

    fn expand_entries(
        &self,
        out: &mut Pending,
        scope: ObjectScope<'_>,
        map: &Map<String, JsonValue>,
        path: &[JsonValue],
    ) -> Result<()> {
        let active = scope.active;
        let mut nests: Vec<(&String, &JsonValue)> = Vec::new();

        for (key, value) in self.entries(map) {
            if key == kw::CONTEXT {
                continue;
            }
            let key_path = child(path, json!(key));
            let Some(expanded_property) = active.expand_iri(key, false, true) else {
                continue;
            };
            if !is_keyword(&expanded_property) && !expanded_property.contains(':') {
                tracing::trace!(key = key.as_str(), "dropping key without IRI mapping");
                continue;
            }

            if is_keyword(&expanded_property) {
                if scope.active_property == Some(kw::REVERSE) {
                    return Err(err(
                        ErrorKind::InvalidReversePropertyMap,
                        format!("{} is not allowed in a @reverse map", key),
                        &key_path,
                    ));
                }
                let repeatable = !active.is_json_ld_10()
                    && (expanded_property == kw::TYPE || expanded_property == kw::INCLUDED);
                if out.seen.contains(&expanded_property) && !repeatable {
                    return Err(err(
                        ErrorKind::CollidingKeywords,
                        format!("{} appears more than once", expanded_property),
                        &key_path,
                    ));
                }
                out.seen.insert(expanded_property.clone());
                if expanded_property == kw::NEST {
                    nests.push((key, value));
                    continue;
                }
                self.expand_keyword(out, scope, &expanded_property, value, &key_path)?;
                continue;
            }

            self.expand_property(out, scope, key, &expanded_property, value, &key_path)?;
        }

        if self.options.ordered {
            nests.sort_by(|a, b| a.0.cmp(b.0));
        }
        for (nest_key, nest_value) in nests {
            let nest_path = child(path, json!(nest_key));
            for nested in as_array(nest_value) {
                let nested_map = nested
                    .as_object()
                    .filter(|m| !m.keys().any(|k| expands_to(active, k, kw::VALUE)));
                let Some(nested_map) = nested_map else {
                    return Err(err(
                        ErrorKind::InvalidNestValue,
                        "@nest values must be node objects",
                        &nest_path,
                    )
                    .with_value(nested));
                };
                self.expand_entries(out, scope, nested_map, &nest_path)?;
            }
        }
        Ok(())
    }

    fn expand_keyword(
        &self,
        out: &mut Pending,
        scope: ObjectScope<'_>,
        keyword: &str,
        value: &JsonValue,
        path: &[JsonValue],
    ) -> Result<()> {
        let active = scope.active;
        let json_ld_10 = active.is_json_ld_10();
        match keyword {
            kw::ID => {
                let Some(id) = value.as_str() else {
                    return Err(err(ErrorKind::InvalidIdValue, "@id must be a string", path)
                        .with_value(value));
                };
                out.id = active.expand_iri(id, true, false);
            }
            kw::TYPE => {
                let types = as_array(value);
                if types.iter().any(|t| !t.is_string()) {
                    return Err(err(
                        ErrorKind::InvalidTypeValue,
                        "@type must be a string or an array of strings",
                        path,
                    )
                    .with_value(value));
                }
                for t in types.into_iter().filter_map(JsonValue::as_str) {
                    if let Some(expanded) = scope.type_scoped.expand_iri(t, true, true) {
                        out.types.push(expanded);
                    }
                }
            }
            kw::GRAPH => {
                let items = self
                    .expand_element(active, Some(kw::GRAPH), value, scope.base_url, false, path)?
                    .unwrap_or_default();
                out.graph = Some(items);
            }
            kw::INCLUDED => {
                if json_ld_10 {
                    return Ok(());
                }
                let items = self
                    .expand_element(active, None, value, scope.base_url, false, path)?
                    .unwrap_or_default();
                if items.iter().any(|i| !i.is_node()) {
                    return Err(err(
                        ErrorKind::InvalidIncludedValue,
                        "@included values must be node objects",
                        path,
                    )
                    .with_value(value));
                }
                out.included.get_or_insert_with(Vec::new).extend(items);
            }
            kw::VALUE => {
                if scope.input_type == Some(kw::JSON) {
                    if json_ld_10 {
                        return Err(err(
                            ErrorKind::InvalidValueObjectValue,
                            "JSON literals require json-ld-1.1",
                            path,
                        ));
                    }
                } else if value.is_array() || value.is_object() {
                    return Err(err(
                        ErrorKind::InvalidValueObjectValue,
                        "@value must be a scalar or null",
                        path,
                    )
                    .with_value(value));
                }
                out.value = Some(value.clone());
            }
            kw::LANGUAGE => {
                let Some(language) = value.as_str() else {
                    return Err(err(
                        ErrorKind::InvalidLanguageTaggedString,
                        "@language must be a string",
                        path,
                    )
                    .with_value(value));
                };
                out.language = Some(language.to_lowercase());
            }
            kw::DIRECTION => {
                if json_ld_10 {
                    return Ok(());
                }
                let direction = value.as_str().and_then(Direction::parse).ok_or_else(|| {
                    err(ErrorKind::InvalidBaseDirection, "@direction must be ltr or rtl", path)
                        .with_value(value)
                })?;
                out.direction = Some(direction);
            }
            kw::INDEX => {
                let Some(index) = value.as_str() else {
                    return Err(err(ErrorKind::InvalidIndexValue, "@index must be a string", path)
                        .with_value(value));
                };
                out.index = Some(index.to_string());
            }
            kw::LIST => {
                let Some(property) = scope.active_property.filter(|p| *p != kw::GRAPH) else {
                    // free-floating list
                    return Ok(());
                };
                if as_array(value).iter().any(|v| v.is_array()) {
                    return Err(err(
                        ErrorKind::ListOfLists,
                        "a list may not contain another list",
                        path,
                    ));
                }
                let items = self
                    .expand_element(active, Some(property), value, scope.base_url, false, path)?
                    .unwrap_or_default();
                if items.iter().any(Item::is_list) {
                    return Err(err(
                        ErrorKind::ListOfLists,
                        "a list may not contain another list",
                        path,
                    ));
                }
                out.list = Some(items);
            }
            kw::SET => {
                let items = self
                    .expand_element(
                        active,
                        scope.active_property,
                        value,
                        scope.base_url,
                        false,
                        path,
                    )?
                    .unwrap_or_default();
                out.set = Some(items);
            }
            kw::REVERSE => {
                if !value.is_object() {
                    return Err(err(ErrorKind::InvalidReverseValue, "@reverse must be an object", path)
                        .with_value(value));
                }
                let expanded = self
                    .expand_element(active, Some(kw::REVERSE), value, scope.base_url, false, path)?
                    .unwrap_or_default();
                for item in expanded {
                    let Item::Node(node) = item else {
                        continue;
                    };
                    for (property, items) in node.reverse {
                        out.properties.entry(property).or_default().extend(items);
                    }
                    for (property, items) in node.properties {
                        if items.iter().any(|i| i.is_value() || i.is_list()) {
                            return Err(err(
                                ErrorKind::InvalidReversePropertyValue,
                                format!("reverse property <{}> must point at nodes", property),
                                path,
                            ));
                        }
                        out.reverse.entry(property).or_default().extend(items);
                    }
                }
            }
            _ => {
                // framing keywords and @context carry no data here
            }
        }
        Ok(())
    }

    fn expand_property(
        &self,
        out: &mut Pending,
        scope: ObjectScope<'_>,
        key: &str,
        property: &str,
        value: &JsonValue,
        path: &[JsonValue],
    ) -> Result<()> {
        let active = scope.active;
        let def = active.term(key);
        let has = |c: Container| def.is_some_and(|d| d.has_container(c));

        let mut expanded = if active.type_mapping(Some(key)) == Some(&TypeMapping::Json) {
            vec![Item::Value(Literal::json(value.clone()))]
        } else if has(Container::Language) && value.is_object() {
            self.expand_language_map(active, key, value, path)?
        } else if (has(Container::Index) || has(Container::Type) || has(Container::Id))
            && value.is_object()
        {
            self.expand_index_map(scope, key, value, path)?
        } else {
            match self.expand_element(active, Some(key), value, scope.base_url, false, path)? {
                Some(items) => items,
                None => return Ok(()),
            }
        };

        if has(Container::List) {
            let already_list =
                !value.is_array() && expanded.len() == 1 && expanded[0].is_list();
            if !already_list {
                if expanded.iter().any(Item::is_list) {
                    return Err(err(
                        ErrorKind::ListOfLists,
                        "a list may not contain another list",
                        path,
                    ));
                }
                expanded = vec![Item::List(List::new(expanded))];
            }
        }

        if has(Container::Graph) && !has(Container::Id) && !has(Container::Index) {
            expanded = expanded.into_iter().map(graph_object).collect();
        }

        if def.is_some_and(|d| d.reverse) {
            if expanded.iter().any(|i| i.is_value() || i.is_list()) {
                return Err(err(
                    ErrorKind::InvalidReversePropertyValue,
                    format!("reverse property '{}' must point at nodes", key),
                    path,
                ));
            }
            out.reverse.entry(property.to_string()).or_default().extend(expanded);
        } else {
            out.properties.entry(property.to_string()).or_default().extend(expanded);
        }
        Ok(())
    }

    fn expand_language_map(
        &self,
        active: &ActiveContext,
        key: &str,
        value: &JsonValue,
        path: &[JsonValue],
    ) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let direction = active.direction_for(Some(key));
        let Some(map) = value.as_object() else {
            return Ok(items);
        };
        for (language, language_value) in self.entries(map) {
            let language_path = child(path, json!(language));
            for v in as_array(language_value) {
                let s = match v {
                    JsonValue::Null => continue,
                    JsonValue::String(s) => s,
                    other => {
                        return Err(err(
                            ErrorKind::InvalidLanguageMapValue,
                            "language map values must be strings",
                            &language_path,
                        )
                        .with_value(other))
                    }
                };
                let mut literal = Literal::string(s.clone());
                let is_none = language == kw::NONE
                    || active.expand_iri(language, false, true).as_deref() == Some(kw::NONE);
                if !is_none {
                    literal.language = Some(language.to_lowercase());
                }
                literal.direction = direction;
                items.push(Item::Value(literal));
            }
        }
        Ok(items)
    }

    /// `@index`, `@id` and `@type` maps.
    fn expand_index_map(
        &self,
        scope: ObjectScope<'_>,
        key: &str,
        value: &JsonValue,
        path: &[JsonValue],
    ) -> Result<Vec<Item>> {
        let active = scope.active;
        let Some(def) = active.term(key) else {
            return Ok(Vec::new());
        };
        let Some(map) = value.as_object() else {
            return Ok(Vec::new());
        };
        let index_key = def.index.as_deref().unwrap_or(kw::INDEX);
        let by_id = def.has_container(Container::Id);
        let by_type = def.has_container(Container::Type);
        let by_index = def.has_container(Container::Index);
        let as_graph = def.has_container(Container::Graph);

        let mut items = Vec::new();
        for (index, index_value) in self.entries(map) {
            let index_path = child(path, json!(index));

            let mut map_context: Cow<'_, ActiveContext> = if by_id || by_type {
                Cow::Borrowed(active.previous().unwrap_or(active))
            } else {
                Cow::Borrowed(active)
            };
            if by_type {
                if let Some(index_def) = map_context.term(index) {
                    if let Some(scoped) =
                        map_context.apply_scoped(index_def, Scope::Type, self.options)?
                    {
                        map_context = Cow::Owned(scoped);
                    }
                }
            }

            let expanded_index = active.expand_iri(index, false, true);
            let is_none = expanded_index.as_deref() == Some(kw::NONE);

            let Some(expanded) = self.expand_element(
                &map_context,
                Some(key),
                index_value,
                scope.base_url,
                true,
                &index_path,
            )?
            else {
                continue;
            };

            for mut item in expanded {
                if as_graph && !item.is_graph_object() {
                    item = graph_object(item);
                }
                if by_index && index_key != kw::INDEX && !is_none {
                    let re_expanded = self.expand_value(active, Some(index_key), &json!(index));
                    let index_property = active.expand_iri(index_key, false, true);
                    let Item::Node(node) = &mut item else {
                        return Err(err(
                            ErrorKind::InvalidValueObject,
                            "property-valued indexes require node objects",
                            &index_path,
                        ));
                    };
                    if let Some(index_property) = index_property {
                        let values = node.properties.entry(index_property).or_default();
                        values.insert(0, re_expanded);
                    }
                } else if by_index && item.index().is_none() && !is_none {
                    set_index(&mut item, index);
                } else if by_id && !is_none {
                    if let Item::Node(node) = &mut item {
                        if node.id.is_none() {
                            node.id = active.expand_iri(index, true, false);
                        }
                    }
                } else if by_type && !is_none {
                    if let (Item::Node(node), Some(t)) = (&mut item, expanded_index.as_ref()) {
                        node.types.insert(0, t.clone());
                    }
                }
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Turn collected entries into a value, list, set or node.
    fn finish(
        &self,
        mut out: Pending,
        active_property: Option<&str>,
        input_type: Option<&str>,
        path: &[JsonValue],
    ) -> Result<Option<Vec<Item>>> {
        let free_floating = active_property.map_or(true, |p| p == kw::GRAPH);

        if let Some(value) = out.value.take() {
            if out.has_node_content() || out.list.is_some() || out.set.is_some() {
                return Err(err(
                    ErrorKind::InvalidValueObject,
                    "a value object may only contain @value, @type, @language, @direction and @index",
                    path,
                ));
            }
            if !out.types.is_empty() && (out.language.is_some() || out.direction.is_some()) {
                return Err(err(
                    ErrorKind::InvalidValueObject,
                    "a value object can not have both @type and @language or @direction",
                    path,
                ));
            }
            if out.types.len() > 1 {
                return Err(err(
                    ErrorKind::InvalidTypedValue,
                    "a value object has at most one @type",
                    path,
                ));
            }
            let datatype = out.types.pop();

            let literal = if datatype.as_deref() == Some(kw::JSON) || input_type == Some(kw::JSON)
            {
                Literal {
                    index: out.index,
                    ..Literal::json(value)
                }
            } else {
                if value.is_null() {
                    return Ok(None);
                }
                if out.language.is_some() && !value.is_string() {
                    return Err(err(
                        ErrorKind::InvalidLanguageTaggedValue,
                        "only strings can carry a language",
                        path,
                    )
                    .with_value(&value));
                }
                if let Some(dt) = &datatype {
                    if !iri::is_absolute(dt) {
                        return Err(err(
                            ErrorKind::InvalidTypedValue,
                            format!("datatype '{}' is not an absolute IRI", dt),
                            path,
                        ));
                    }
                }
                let literal_value = match value {
                    JsonValue::String(s) => LiteralValue::String(s),
                    JsonValue::Bool(b) => LiteralValue::Bool(b),
                    JsonValue::Number(n) => LiteralValue::Number(n),
                    other => {
                        return Err(err(
                            ErrorKind::InvalidValueObjectValue,
                            "@value must be a scalar",
                            path,
                        )
                        .with_value(&other))
                    }
                };
                Literal {
                    value: literal_value,
                    datatype,
                    language: out.language,
                    direction: out.direction,
                    index: out.index,
                }
            };
            if free_floating {
                return Ok(None);
            }
            return Ok(Some(vec![Item::Value(literal)]));
        }

        if out.list.is_some() || out.set.is_some() {
            let extra = out.has_node_content()
                || !out.types.is_empty()
                || (out.list.is_some() && out.set.is_some());
            if extra {
                return Err(err(
                    ErrorKind::InvalidSetOrListObject,
                    "@list and @set objects may only carry @index",
                    path,
                ));
            }
            if let Some(items) = out.set {
                return Ok(Some(items));
            }
            if free_floating {
                return Ok(None);
            }
            let list = List {
                items: out.list.unwrap_or_default(),
                index: out.index,
            };
            return Ok(Some(vec![Item::List(list)]));
        }

        let only_language = (out.language.is_some() || out.direction.is_some())
            && !out.has_node_content()
            && out.types.is_empty()
            && out.index.is_none();
        if only_language {
            return Ok(None);
        }

        let node = Node {
            id: out.id,
            types: out.types,
            index: out.index,
            graph: out.graph,
            included: out.included,
            reverse: out.reverse,
            properties: out.properties,
        };
        if free_floating && (node.is_empty() || node.is_reference()) {
            return Ok(None);
        }
        Ok(Some(vec![Item::Node(node)]))
    }
}

/// Wrap `item` in a graph object without `@id`.
fn graph_object(item: Item) -> Item {
    Item::Node(Node {
        graph: Some(vec![item]),
        ..Default::default()
    })
}

fn set_index(item: &mut Item, index: &str) {
    let index = Some(index.to_string());
    match item {
        Item::Node(node) => node.index = index,
        Item::Value(literal) => literal.index = index,
        Item::List(list) => list.index = index,
        Item::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::items_to_json;
    use pretty_assertions::assert_eq;

    fn expand(doc: JsonValue) -> Result<JsonValue> {
        expand_document(&doc, &JsonLdOptions::default()).map(|items| items_to_json(&items))
    }

    #[test]
    fn test_expand_simple_node() {
        let out = expand(json!({
            "@context": {"name": "http://schema.org/name", "knows": {"@id": "http://schema.org/knows", "@type": "@id"}},
            "@id": "http://example.com/alice",
            "name": "Alice",
            "knows": "http://example.com/bob"
        }))
        .unwrap();

        assert_eq!(
            out,
            json!([{
                "@id": "http://example.com/alice",
                "http://schema.org/knows": [{"@id": "http://example.com/bob"}],
                "http://schema.org/name": [{"@value": "Alice"}]
            }])
        );
    }

    #[test]
    fn test_expand_drops_unmapped_keys_and_free_floating_values() {
        let out = expand(json!({
            "@context": {"name": "http://schema.org/name"},
            "@graph": [
                {"name": "kept"},
                {"unmapped": "dropped"},
                {"@id": "http://example.com/ref"},
                {"@value": "free"}
            ]
        }))
        .unwrap();

        assert_eq!(out, json!([{"http://schema.org/name": [{"@value": "kept"}]}]));
    }

    #[test]
    fn test_expand_language_and_index_maps() {
        let out = expand(json!({
            "@context": {
                "label": {"@id": "http://example.com/label", "@container": "@language"},
                "post": {"@id": "http://example.com/post", "@container": "@index"}
            },
            "@id": "http://example.com/a",
            "label": {"en": "Hello", "@none": "Hallo"},
            "post": {"first": {"@id": "http://example.com/p1"}}
        }))
        .unwrap();

        assert_eq!(
            out,
            json!([{
                "@id": "http://example.com/a",
                "http://example.com/label": [
                    {"@value": "Hello", "@language": "en"},
                    {"@value": "Hallo"}
                ],
                "http://example.com/post": [{"@id": "http://example.com/p1", "@index": "first"}]
            }])
        );
    }

    #[test]
    fn test_expand_graph_container_wraps_values() {
        let out = expand(json!({
            "@context": {"input": {"@id": "https://example.com/input", "@container": "@graph"}},
            "input": {"value": "x", "@id": "https://example.com/n"}
        }))
        .unwrap();

        assert_eq!(
            out,
            json!([{
                "https://example.com/input": [{"@graph": [{"@id": "https://example.com/n"}]}]
            }])
        );
    }

    #[test]
    fn test_expand_list_of_lists_is_an_error() {
        let err = expand(json!({
            "@context": {"p": {"@id": "http://example.com/p", "@container": "@list"}},
            "p": [[1, 2], 3]
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ListOfLists);
        assert_eq!(err.path().map(|p| p.to_string()).as_deref(), Some("/p/0"));
    }

    #[test]
    fn test_expand_reverse_property() {
        let out = expand(json!({
            "@context": {"parent": {"@reverse": "http://example.com/child"}},
            "@id": "http://example.com/kid",
            "parent": {"@id": "http://example.com/mom"}
        }))
        .unwrap();

        assert_eq!(
            out,
            json!([{
                "@id": "http://example.com/kid",
                "@reverse": {"http://example.com/child": [{"@id": "http://example.com/mom"}]}
            }])
        );
    }

    #[test]
    fn test_expand_colliding_keywords() {
        let err = expand(json!({
            "@context": {"id": "@id"},
            "@id": "http://example.com/a",
            "id": "http://example.com/b"
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CollidingKeywords);
    }

    #[test]
    fn test_expand_invalid_value_object() {
        let err = expand(json!({
            "http://example.com/p": {"@value": "x", "@type": "http://example.com/t", "@language": "en"}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValueObject);

        let err = expand(json!({
            "http://example.com/p": {"@value": "x", "@direction": "up"}
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBaseDirection);
    }

    #[test]
    fn test_expand_type_scoped_context_does_not_propagate() {
        let out = expand(json!({
            "@context": {
                "@vocab": "http://example.com/",
                "Person": {"@context": {"name": "http://schema.org/name"}}
            },
            "@type": "Person",
            "name": "outer",
            "friend": {"name": "inner"}
        }))
        .unwrap();

        assert_eq!(
            out,
            json!([{
                "@type": ["http://example.com/Person"],
                "http://example.com/friend": [{"http://example.com/name": [{"@value": "inner"}]}],
                "http://schema.org/name": [{"@value": "outer"}]
            }])
        );
    }

    #[test]
    fn test_expand_json_literal_and_nest() {
        let out = expand(json!({
            "@context": {
                "@vocab": "http://example.com/",
                "data": {"@type": "@json"},
                "meta": "@nest"
            },
            "data": {"b": [1, 2], "a": null},
            "meta": {"note": "nested"}
        }))
        .unwrap();

        assert_eq!(
            out,
            json!([{
                "http://example.com/data": [{"@value": {"b": [1, 2], "a": null}, "@type": "@json"}],
                "http://example.com/note": [{"@value": "nested"}]
            }])
        );
    }
}
