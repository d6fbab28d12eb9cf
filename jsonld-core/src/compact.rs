//! Compaction: typed expanded items back to terms, compact IRIs and
//! containers of a context.
//!
//! Term selection goes through the [`InverseContext`](crate::context::InverseContext)
//! of the active context, which is built once per context and cached.

use crate::context::{ActiveContext, Container, Scope, TypeMapping};
use crate::error::{ErrorKind, JsonLdError, Result};
use crate::iri;
use crate::model::{Item, List, Literal, LiteralValue, Node};
use crate::options::JsonLdOptions;
use jsonld_vocab::keywords as kw;
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Compact `items` against `context` and wrap the result as a document.
///
/// An array result is placed under the `@graph` alias; `force_graph` does
/// the same for a single object. The context is emitted first unless it is
/// empty.
pub fn compact_document(
    items: &[Item],
    context: &JsonValue,
    options: &JsonLdOptions,
    force_graph: bool,
) -> Result<JsonValue> {
    let local = context
        .as_object()
        .and_then(|m| m.get(kw::CONTEXT))
        .unwrap_or(context);
    let active = ActiveContext::for_options(options, None).process(local, None, options)?;
    let compactor = Compactor::new(options);

    let compacted = compactor.compact_items(&active, None, items)?;
    let graph_alias = compactor.compact_iri(&active, kw::GRAPH, None, true, false)?;
    let mut body = match compacted {
        JsonValue::Array(values) if values.is_empty() && !force_graph => Map::new(),
        JsonValue::Array(values) => {
            let mut map = Map::new();
            map.insert(graph_alias, JsonValue::Array(values));
            map
        }
        JsonValue::Object(map) if force_graph => {
            let mut wrapped = Map::new();
            wrapped.insert(graph_alias, JsonValue::Array(vec![JsonValue::Object(map)]));
            wrapped
        }
        JsonValue::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert(graph_alias, other);
            map
        }
    };

    let has_context = match local {
        JsonValue::Null => false,
        JsonValue::Object(m) => !m.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        _ => true,
    };
    if !has_context {
        return Ok(JsonValue::Object(body));
    }
    let mut out = Map::new();
    out.insert(kw::CONTEXT.to_string(), local.clone());
    out.append(&mut body);
    Ok(JsonValue::Object(out))
}

/// Add `value` under `key`, turning an existing entry into an array.
/// With `as_array` the entry is always an array; a null value then adds
/// nothing but the empty array.
fn add_value(map: &mut Map<String, JsonValue>, key: &str, value: JsonValue, as_array: bool) {
    let values = match value {
        JsonValue::Array(values) => values,
        JsonValue::Null if as_array => Vec::new(),
        single => vec![single],
    };
    match map.get_mut(key) {
        Some(JsonValue::Array(existing)) => existing.extend(values),
        Some(existing) => {
            let first = existing.take();
            let mut merged = vec![first];
            merged.extend(values);
            *existing = JsonValue::Array(merged);
        }
        None if as_array || values.len() != 1 => {
            map.insert(key.to_string(), JsonValue::Array(values));
        }
        None => {
            let single = values.into_iter().next().unwrap_or(JsonValue::Null);
            map.insert(key.to_string(), single);
        }
    }
}

fn lang_dir_key(language: Option<&str>, direction: &str) -> String {
    format!("{}_{}", language.unwrap_or(""), direction)
}

pub(crate) struct Compactor<'a> {
    options: &'a JsonLdOptions,
}

impl<'a> Compactor<'a> {
    pub(crate) fn new(options: &'a JsonLdOptions) -> Self {
        Self { options }
    }

    fn alias(&self, active: &ActiveContext, keyword: &str) -> Result<String> {
        self.compact_iri(active, keyword, None, true, false)
    }

    /// Compact a sequence of items; a single result collapses to a scalar
    /// or object unless arrays must be kept.
    pub(crate) fn compact_items(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        items: &[Item],
    ) -> Result<JsonValue> {
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let compacted = self.compact_item(active, active_property, item)?;
            if !compacted.is_null() {
                result.push(compacted);
            }
        }
        let keep_array = !self.options.compact_arrays
            || matches!(active_property, Some(kw::GRAPH) | Some(kw::SET))
            || active.has_container(active_property, Container::List)
            || active.has_container(active_property, Container::Set);
        if result.len() == 1 && !keep_array {
            return Ok(result.remove(0));
        }
        Ok(JsonValue::Array(result))
    }

    pub(crate) fn compact_item(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        item: &Item,
    ) -> Result<JsonValue> {
        if matches!(item, Item::Null) {
            return Ok(JsonValue::Null);
        }
        let property_def = active_property.and_then(|p| active.term(p));

        if item.is_value() || item.is_reference() {
            let scoped = match property_def {
                Some(def) => active.apply_scoped(def, Scope::Property, self.options)?,
                None => None,
            };
            let active = scoped.as_ref().unwrap_or(active);
            return self.compact_value(active, active_property, item);
        }

        if let Item::List(list) = item {
            if active.has_container(active_property, Container::List) {
                return self.compact_items(active, active_property, &list.items);
            }
        }

        let mut active: Cow<'_, ActiveContext> = Cow::Borrowed(active);
        if let Some(previous) = active.previous.clone() {
            active = Cow::Owned((*previous).clone());
        }
        if let Some(def) = property_def {
            if let Some(scoped) = active.apply_scoped(def, Scope::Property, self.options)? {
                active = Cow::Owned(scoped);
            }
        }

        match item {
            Item::List(list) => self.compact_list_object(&active, active_property, list),
            Item::Node(node) => {
                let inside_reverse = active_property == Some(kw::REVERSE);
                self.compact_node(active, active_property, node, inside_reverse)
            }
            _ => Ok(JsonValue::Null),
        }
    }

    /// A list that is not inside a `@list` container keeps its `@list` key.
    fn compact_list_object(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        list: &List,
    ) -> Result<JsonValue> {
        let values = match self.compact_items(active, active_property, &list.items)? {
            JsonValue::Array(values) => values,
            single => vec![single],
        };
        let mut map = Map::new();
        map.insert(self.alias(active, kw::LIST)?, JsonValue::Array(values));
        if let Some(index) = &list.index {
            map.insert(self.alias(active, kw::INDEX)?, JsonValue::String(index.clone()));
        }
        Ok(JsonValue::Object(map))
    }

    fn compact_node(
        &self,
        mut active: Cow<'_, ActiveContext>,
        active_property: Option<&str>,
        node: &Node,
        inside_reverse: bool,
    ) -> Result<JsonValue> {
        let type_scoped = active.clone();
        let mut compacted_types = Vec::with_capacity(node.types.len());
        for t in &node.types {
            compacted_types.push(self.compact_iri(&type_scoped, t, None, true, false)?);
        }
        let mut sorted_types = compacted_types.clone();
        sorted_types.sort();
        for term in &sorted_types {
            if let Some(def) = type_scoped.term(term) {
                if let Some(scoped) = active.apply_scoped(def, Scope::Type, self.options)? {
                    active = Cow::Owned(scoped);
                }
            }
        }
        let active: &ActiveContext = &active;

        let mut result = Map::new();
        if let Some(id) = &node.id {
            let compacted = self.compact_iri(active, id, None, false, false)?;
            result.insert(self.alias(active, kw::ID)?, JsonValue::String(compacted));
        }
        if !compacted_types.is_empty() {
            let alias = self.alias(active, kw::TYPE)?;
            let as_array = (!active.is_json_ld_10()
                && active.has_container(Some(&alias), Container::Set))
                || !self.options.compact_arrays;
            let values = compacted_types.into_iter().map(JsonValue::String).collect();
            add_value(&mut result, &alias, JsonValue::Array(values), as_array);
        }

        if !node.reverse.is_empty() {
            let mut reverse_active = Cow::Borrowed(active);
            if let Some(def) = active.term(kw::REVERSE) {
                if let Some(scoped) = active.apply_scoped(def, Scope::Property, self.options)? {
                    reverse_active = Cow::Owned(scoped);
                }
            }
            let mut reversed = Map::new();
            self.compact_properties(&reverse_active, &mut reversed, &node.reverse, true)?;
            let mut remaining = Map::new();
            for (property, value) in reversed {
                let def = active.term(&property);
                if def.is_some_and(|d| d.reverse) {
                    let as_array = def.is_some_and(|d| d.has_container(Container::Set))
                        || !self.options.compact_arrays;
                    add_value(&mut result, &property, value, as_array);
                } else {
                    remaining.insert(property, value);
                }
            }
            if !remaining.is_empty() {
                result.insert(self.alias(active, kw::REVERSE)?, JsonValue::Object(remaining));
            }
        }

        if let Some(index) = &node.index {
            if !active.has_container(active_property, Container::Index) {
                result.insert(self.alias(active, kw::INDEX)?, JsonValue::String(index.clone()));
            }
        }

        let mut keyword_entries: BTreeMap<String, Vec<Item>> = BTreeMap::new();
        if let Some(graph) = &node.graph {
            keyword_entries.insert(kw::GRAPH.to_string(), graph.clone());
        }
        if let Some(included) = &node.included {
            keyword_entries.insert(kw::INCLUDED.to_string(), included.clone());
        }
        self.compact_properties(active, &mut result, &keyword_entries, inside_reverse)?;
        self.compact_properties(active, &mut result, &node.properties, inside_reverse)?;

        Ok(JsonValue::Object(result))
    }

    /// Map holding the values of `term`: the result itself, or the object
    /// under the term's `@nest` key.
    fn nest_target<'r>(
        &self,
        active: &ActiveContext,
        result: &'r mut Map<String, JsonValue>,
        term: &str,
    ) -> Result<&'r mut Map<String, JsonValue>> {
        let Some(nest) = active.term(term).and_then(|d| d.nest.clone()) else {
            return Ok(result);
        };
        if nest != kw::NEST && active.expand_iri(&nest, false, true).as_deref() != Some(kw::NEST) {
            return Err(JsonLdError::compact(
                ErrorKind::InvalidNestValue,
                format!("nest term '{}' of '{}' is not an alias of @nest", nest, term),
            ));
        }
        let entry = result
            .entry(nest.clone())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        match entry {
            JsonValue::Object(map) => Ok(map),
            _ => Err(JsonLdError::compact(
                ErrorKind::InvalidNestValue,
                format!("'{}' holds a non-object value", nest),
            )),
        }
    }

    fn compact_properties(
        &self,
        active: &ActiveContext,
        result: &mut Map<String, JsonValue>,
        properties: &BTreeMap<String, Vec<Item>>,
        inside_reverse: bool,
    ) -> Result<()> {
        for (property, values) in properties {
            if values.is_empty() {
                let term = self.compact_iri(active, property, None, true, inside_reverse)?;
                let target = self.nest_target(active, result, &term)?;
                add_value(target, &term, JsonValue::Array(Vec::new()), true);
                continue;
            }
            for value in values {
                self.compact_property_value(active, result, property, value, inside_reverse)?;
            }
        }
        Ok(())
    }

    fn compact_property_value(
        &self,
        active: &ActiveContext,
        result: &mut Map<String, JsonValue>,
        property: &str,
        value: &Item,
        inside_reverse: bool,
    ) -> Result<()> {
        let term = self.compact_iri(active, property, Some(value), true, inside_reverse)?;
        let def = active.term(&term);
        let has = |c: Container| def.is_some_and(|d| d.has_container(c));
        let as_array = has(Container::Set)
            || term == kw::GRAPH
            || term == kw::LIST
            || !self.options.compact_arrays;

        let mut compacted = match value {
            Item::List(list) => self.compact_items(active, Some(&term), &list.items)?,
            Item::Node(node) if node.is_graph_object() => {
                let graph = node.graph.as_deref().unwrap_or_default();
                self.compact_items(active, Some(&term), graph)?
            }
            other => self.compact_item(active, Some(&term), other)?,
        };

        let target = self.nest_target(active, result, &term)?;

        if let Item::List(list) = value {
            let values = match compacted {
                JsonValue::Array(values) => values,
                single => vec![single],
            };
            if has(Container::List) {
                // a @list container holds exactly one list per term
                if target.contains_key(&term) {
                    return Err(JsonLdError::compact(
                        ErrorKind::CompactionToListOfLists,
                        format!("term {} already holds a list", term),
                    ));
                }
                target.insert(term, JsonValue::Array(values));
                return Ok(());
            }
            let mut wrapped = Map::new();
            wrapped.insert(self.alias(active, kw::LIST)?, JsonValue::Array(values));
            if let Some(index) = &list.index {
                wrapped.insert(self.alias(active, kw::INDEX)?, JsonValue::String(index.clone()));
            }
            add_value(target, &term, JsonValue::Object(wrapped), as_array);
            return Ok(());
        }

        if let Some(node) = value.as_node().filter(|n| n.is_graph_object()) {
            if has(Container::Graph) && has(Container::Id) {
                let key = match &node.id {
                    Some(id) => self.compact_iri(active, id, None, false, false)?,
                    None => self.alias(active, kw::NONE)?,
                };
                let map = map_object(target, &term)?;
                add_value(map, &key, compacted, as_array);
            } else if has(Container::Graph) && has(Container::Index) && node.id.is_none() {
                let key = match &node.index {
                    Some(index) => index.clone(),
                    None => self.alias(active, kw::NONE)?,
                };
                let map = map_object(target, &term)?;
                add_value(map, &key, compacted, as_array);
            } else if has(Container::Graph) && node.id.is_none() {
                if matches!(&compacted, JsonValue::Array(values) if values.len() > 1) {
                    let mut included = Map::new();
                    included.insert(self.alias(active, kw::INCLUDED)?, compacted);
                    compacted = JsonValue::Object(included);
                }
                add_value(target, &term, compacted, as_array);
            } else {
                let values = match compacted {
                    JsonValue::Array(values) => values,
                    single => vec![single],
                };
                let mut wrapped = Map::new();
                wrapped.insert(self.alias(active, kw::GRAPH)?, JsonValue::Array(values));
                if let Some(id) = &node.id {
                    let id = self.compact_iri(active, id, None, false, false)?;
                    wrapped.insert(self.alias(active, kw::ID)?, JsonValue::String(id));
                }
                if let Some(index) = &node.index {
                    wrapped.insert(self.alias(active, kw::INDEX)?, JsonValue::String(index.clone()));
                }
                add_value(target, &term, JsonValue::Object(wrapped), as_array);
            }
            return Ok(());
        }

        let map_container = [Container::Language, Container::Index, Container::Id, Container::Type]
            .into_iter()
            .find(|c| has(*c))
            .filter(|_| !has(Container::Graph));
        let Some(container) = map_container else {
            add_value(target, &term, compacted, as_array);
            return Ok(());
        };

        let container_key = self.alias(active, container.as_str())?;
        let index_key = def.and_then(|d| d.index.clone()).unwrap_or_else(|| kw::INDEX.to_string());
        let mut map_key: Option<String> = None;

        match container {
            Container::Language => {
                if let Some(literal) = value.as_literal() {
                    compacted = literal.value.to_json();
                    map_key = literal.language.clone();
                }
            }
            Container::Index if index_key == kw::INDEX => {
                map_key = value.index().map(str::to_string);
            }
            Container::Index => {
                let index_property = active
                    .expand_iri(&index_key, false, true)
                    .unwrap_or_else(|| index_key.clone());
                let key = self.compact_iri(active, &index_property, None, true, false)?;
                if let JsonValue::Object(map) = &mut compacted {
                    map_key = take_first_string(map, &key);
                }
            }
            Container::Id => {
                if let JsonValue::Object(map) = &mut compacted {
                    map_key = map
                        .remove(&container_key)
                        .and_then(|v| v.as_str().map(str::to_string));
                }
            }
            Container::Type => {
                if let JsonValue::Object(map) = &mut compacted {
                    map_key = take_first_string(map, &container_key);
                    let id_alias = self.alias(active, kw::ID)?;
                    let only_id = map.len() == 1 && map.contains_key(&id_alias);
                    if only_id {
                        if let Some(id) = value.id() {
                            compacted =
                                self.compact_item(active, Some(&term), &Item::reference(id))?;
                        }
                    }
                }
            }
            _ => {}
        }

        let key = match map_key {
            Some(key) => key,
            None => self.alias(active, kw::NONE)?,
        };
        let map = map_object(target, &term)?;
        add_value(map, &key, compacted, as_array);
        Ok(())
    }

    /// Value compaction of a literal or a bare node reference.
    pub(crate) fn compact_value(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        item: &Item,
    ) -> Result<JsonValue> {
        let mapping = active.type_mapping(active_property);
        match item {
            Item::Node(node) => {
                let id = node.id.as_deref().unwrap_or_default();
                match mapping {
                    Some(TypeMapping::Id) => {
                        Ok(JsonValue::String(self.compact_iri(active, id, None, false, false)?))
                    }
                    Some(TypeMapping::Vocab) => {
                        Ok(JsonValue::String(self.compact_iri(active, id, None, true, false)?))
                    }
                    _ => {
                        let mut map = Map::new();
                        let id = self.compact_iri(active, id, None, false, false)?;
                        map.insert(self.alias(active, kw::ID)?, JsonValue::String(id));
                        Ok(JsonValue::Object(map))
                    }
                }
            }
            Item::Value(literal) => self.compact_literal(active, active_property, literal),
            _ => Ok(JsonValue::Null),
        }
    }

    fn compact_literal(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        literal: &Literal,
    ) -> Result<JsonValue> {
        let mapping = active.type_mapping(active_property);
        let preserve_index = literal.index.is_some()
            && !active.has_container(active_property, Container::Index);
        let datatype = literal.type_iri();

        let scalar = match (datatype, mapping) {
            (Some(t), Some(m)) if m.as_str() == t => !preserve_index,
            (_, Some(TypeMapping::None)) | (Some(_), _) => false,
            _ if !matches!(literal.value, LiteralValue::String(_)) => !preserve_index,
            _ => {
                let language = active.language_for(active_property);
                let direction = active.direction_for(active_property);
                let same_language = match (literal.language.as_deref(), language) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    (None, None) => true,
                    _ => false,
                };
                same_language && literal.direction == direction && !preserve_index
            }
        };
        if scalar {
            return Ok(literal.value.to_json());
        }

        let mut map = Map::new();
        if let Some(t) = datatype {
            let t = self.compact_iri(active, t, None, true, false)?;
            map.insert(self.alias(active, kw::TYPE)?, JsonValue::String(t));
        }
        if let Some(language) = &literal.language {
            map.insert(self.alias(active, kw::LANGUAGE)?, JsonValue::String(language.clone()));
        }
        if let Some(direction) = literal.direction {
            map.insert(
                self.alias(active, kw::DIRECTION)?,
                JsonValue::String(direction.as_str().to_string()),
            );
        }
        if let (Some(index), true) = (&literal.index, preserve_index) {
            map.insert(self.alias(active, kw::INDEX)?, JsonValue::String(index.clone()));
        }
        map.insert(self.alias(active, kw::VALUE)?, literal.value.to_json());
        Ok(JsonValue::Object(map))
    }

    /// IRI compaction.
    ///
    /// `value` is the item the IRI is the property of, used to pick the term
    /// whose container and coercion fit it; `vocab` selects vocabulary
    /// position; `reverse` selects reverse terms.
    pub(crate) fn compact_iri(
        &self,
        active: &ActiveContext,
        iri: &str,
        value: Option<&Item>,
        vocab: bool,
        reverse: bool,
    ) -> Result<String> {
        let value = value.filter(|v| !matches!(v, Item::Null));

        if vocab && active.inverse().contains(iri) {
            if let Some(term) = self.select_term(active, iri, value, reverse)? {
                return Ok(term);
            }
        }

        if vocab {
            if let Some(vocab_iri) = active.vocab() {
                if let Some(suffix) = iri.strip_prefix(vocab_iri) {
                    if !suffix.is_empty() && active.term(suffix).is_none() {
                        return Ok(suffix.to_string());
                    }
                }
            }
        }

        let mut best: Option<String> = None;
        for (term, def) in active.terms() {
            let Some(term_iri) = def.iri.as_deref() else {
                continue;
            };
            if !def.prefix || term_iri == iri || !iri.starts_with(term_iri) {
                continue;
            }
            let candidate = format!("{}:{}", term, &iri[term_iri.len()..]);
            let shorter = best.as_ref().map_or(true, |b| {
                candidate.len() < b.len() || (candidate.len() == b.len() && candidate < *b)
            });
            let usable = match active.term(&candidate) {
                None => true,
                Some(existing) => existing.iri.as_deref() == Some(iri) && value.is_none(),
            };
            if shorter && usable {
                best = Some(candidate);
            }
        }
        if let Some(best) = best {
            return Ok(best);
        }

        if let Some((scheme, rest)) = iri.split_once(':') {
            if active.term(scheme).is_some_and(|d| d.prefix) && !rest.starts_with("//") {
                return Err(JsonLdError::compact(
                    ErrorKind::IriConfusedWithPrefix,
                    format!("<{}> would be read back as a compact IRI", iri),
                ));
            }
        }

        if !vocab && self.options.compact_to_relative && iri::is_absolute(iri) && !iri::is_blank(iri) {
            if let Some(base) = active.base() {
                return Ok(iri::relativize(base, iri));
            }
        }
        Ok(iri.to_string())
    }

    /// Term selection through the inverse context.
    fn select_term(
        &self,
        active: &ActiveContext,
        iri: &str,
        value: Option<&Item>,
        reverse: bool,
    ) -> Result<Option<String>> {
        let default_language = match (active.default_direction(), active.default_language()) {
            (Some(d), language) => lang_dir_key(language, d.as_str()),
            (None, Some(language)) => language.to_string(),
            (None, None) => kw::NONE.to_string(),
        };

        let mut containers: Vec<String> = Vec::new();
        let mut type_language = kw::LANGUAGE;
        let mut type_language_value = kw::NULL.to_string();

        let is_graph = value.is_some_and(Item::is_graph_object);
        if let Some(v) = value {
            if v.index().is_some() && !is_graph {
                containers.push(kw::INDEX.to_string());
                containers.push("@index@set".to_string());
            }
        }

        match value {
            _ if reverse => {
                type_language = kw::TYPE;
                type_language_value = kw::REVERSE.to_string();
                containers.push(kw::SET.to_string());
            }
            Some(Item::List(list)) => {
                if list.index.is_none() {
                    containers.push(kw::LIST.to_string());
                }
                let mut common_type: Option<String> = None;
                let mut common_language: Option<String> =
                    list.items.is_empty().then(|| default_language.clone());
                for item in &list.items {
                    let (item_language, item_type) = match item {
                        Item::Value(lit) => match (&lit.language, lit.direction) {
                            (language, Some(d)) => {
                                (lang_dir_key(language.as_deref(), d.as_str()), kw::NONE.to_string())
                            }
                            (Some(language), None) => (language.clone(), kw::NONE.to_string()),
                            (None, None) => match lit.type_iri() {
                                Some(t) => (kw::NONE.to_string(), t.to_string()),
                                None => (kw::NULL.to_string(), kw::NONE.to_string()),
                            },
                        },
                        _ => (kw::NONE.to_string(), kw::ID.to_string()),
                    };
                    match &common_language {
                        None => common_language = Some(item_language),
                        Some(c) if *c != item_language && item.is_value() => {
                            common_language = Some(kw::NONE.to_string())
                        }
                        _ => {}
                    }
                    match &common_type {
                        None => common_type = Some(item_type),
                        Some(c) if *c != item_type => common_type = Some(kw::NONE.to_string()),
                        _ => {}
                    }
                    if common_language.as_deref() == Some(kw::NONE)
                        && common_type.as_deref() == Some(kw::NONE)
                    {
                        break;
                    }
                }
                let common_language = common_language.unwrap_or_else(|| kw::NONE.to_string());
                let common_type = common_type.unwrap_or_else(|| kw::NONE.to_string());
                if common_type != kw::NONE {
                    type_language = kw::TYPE;
                    type_language_value = common_type;
                } else {
                    type_language_value = common_language;
                }
            }
            Some(Item::Node(node)) if is_graph => {
                if node.index.is_some() {
                    containers.extend(["@graph@index", "@graph@index@set"].map(String::from));
                }
                if node.id.is_some() {
                    containers.extend(["@graph@id", "@graph@id@set"].map(String::from));
                }
                containers.extend(["@graph", "@graph@set", "@set"].map(String::from));
                if node.index.is_none() {
                    containers.extend(["@graph@index", "@graph@index@set"].map(String::from));
                }
                if node.id.is_none() {
                    containers.extend(["@graph@id", "@graph@id@set"].map(String::from));
                }
                containers.extend(["@index", "@index@set"].map(String::from));
                type_language = kw::TYPE;
                type_language_value = kw::ID.to_string();
            }
            Some(Item::Value(lit)) => {
                if let (Some(d), None) = (lit.direction, &lit.index) {
                    type_language_value = lang_dir_key(lit.language.as_deref(), d.as_str());
                    containers.extend(["@language", "@language@set"].map(String::from));
                } else if let (Some(language), None) = (&lit.language, &lit.index) {
                    type_language_value = language.clone();
                    containers.extend(["@language", "@language@set"].map(String::from));
                } else if let Some(t) = lit.type_iri() {
                    type_language = kw::TYPE;
                    type_language_value = t.to_string();
                }
                containers.push(kw::SET.to_string());
            }
            _ => {
                type_language = kw::TYPE;
                type_language_value = kw::ID.to_string();
                containers.extend(["@id", "@id@set", "@type", "@set@type", "@set"].map(String::from));
            }
        }

        containers.push(kw::NONE.to_string());
        let value_has_index = value.is_some_and(|v| v.index().is_some());
        if !active.is_json_ld_10() && !value_has_index {
            containers.extend(["@index", "@index@set"].map(String::from));
        }
        if !active.is_json_ld_10() {
            let only_value = matches!(value, Some(Item::Value(lit))
                if lit.datatype.is_none() && lit.language.is_none()
                    && lit.direction.is_none() && lit.index.is_none() && !lit.is_json());
            if only_value {
                containers.extend(["@language", "@language@set"].map(String::from));
            }
        }

        let mut preferred: Vec<String> = Vec::new();
        if type_language_value == kw::REVERSE {
            preferred.push(kw::REVERSE.to_string());
        }
        let node_id = value.and_then(Item::as_node).and_then(|n| n.id.as_deref());
        if (type_language_value == kw::ID || type_language_value == kw::REVERSE) && node_id.is_some() {
            let id = node_id.unwrap_or_default();
            let compacted = self.compact_iri(active, id, None, true, false)?;
            let is_term_for_id = active
                .term(&compacted)
                .and_then(|d| d.iri.as_deref())
                == Some(id);
            if is_term_for_id {
                preferred.extend(["@vocab", "@id", "@none"].map(String::from));
            } else {
                preferred.extend(["@id", "@vocab", "@none"].map(String::from));
            }
        } else {
            let empty_list = matches!(value, Some(Item::List(l)) if l.items.is_empty());
            if empty_list {
                type_language = kw::ANY;
            }
            preferred.push(type_language_value.clone());
            preferred.push(kw::NONE.to_string());
        }
        preferred.push(kw::ANY.to_string());
        if let Some(pos) = preferred.iter().find_map(|p| p.find('_').map(|i| p[i..].to_string())) {
            preferred.push(pos);
        }

        Ok(active
            .inverse()
            .select_term(iri, &containers, type_language, &preferred)
            .map(str::to_string))
    }
}

/// The map under `term`, created on first use.
fn map_object<'m>(
    target: &'m mut Map<String, JsonValue>,
    term: &str,
) -> Result<&'m mut Map<String, JsonValue>> {
    let entry = target
        .entry(term.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    match entry {
        JsonValue::Object(map) => Ok(map),
        _ => Err(JsonLdError::compact(
            ErrorKind::InvalidContainerMapping,
            format!("'{}' is both a map container and a plain value", term),
        )),
    }
}

/// Remove and return the first string under `key`; other values stay.
fn take_first_string(map: &mut Map<String, JsonValue>, key: &str) -> Option<String> {
    match map.remove(key)? {
        JsonValue::String(s) => Some(s),
        JsonValue::Array(mut values) => {
            let first = (!values.is_empty()).then(|| values.remove(0));
            match values.len() {
                0 => {}
                1 => {
                    map.insert(key.to_string(), values.remove(0));
                }
                _ => {
                    map.insert(key.to_string(), JsonValue::Array(values));
                }
            }
            first.and_then(|v| v.as_str().map(str::to_string))
        }
        other => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand_document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compact(doc: JsonValue, context: JsonValue) -> Result<JsonValue> {
        let options = JsonLdOptions::default();
        let items = expand_document(&doc, &options)?;
        compact_document(&items, &context, &options, false)
    }

    #[test]
    fn test_compact_terms_and_prefixes() {
        let out = compact(
            json!({
                "@id": "http://example.com/alice",
                "@type": "http://schema.org/Person",
                "http://schema.org/name": "Alice",
                "http://schema.org/knows": {"@id": "http://example.com/bob"}
            }),
            json!({
                "schema": "http://schema.org/",
                "name": "schema:name",
                "knows": {"@id": "schema:knows", "@type": "@id"}
            }),
        )
        .unwrap();

        assert_eq!(
            out,
            json!({
                "@context": {
                    "schema": "http://schema.org/",
                    "name": "schema:name",
                    "knows": {"@id": "schema:knows", "@type": "@id"}
                },
                "@id": "http://example.com/alice",
                "@type": "schema:Person",
                "knows": "http://example.com/bob",
                "name": "Alice"
            })
        );
    }

    #[test]
    fn test_compact_arrays_and_set_container() {
        let ctx = json!({"tags": {"@id": "http://example.com/tag", "@container": "@set"}});
        let out = compact(
            json!({"http://example.com/tag": "one"}),
            ctx.clone(),
        )
        .unwrap();
        assert_eq!(out, json!({"@context": ctx, "tags": ["one"]}));
    }

    #[test]
    fn test_compact_language_map() {
        let ctx = json!({"label": {"@id": "http://example.com/label", "@container": "@language"}});
        let out = compact(
            json!({"http://example.com/label": [
                {"@value": "Hello", "@language": "en"},
                {"@value": "Bonjour", "@language": "fr"}
            ]}),
            ctx.clone(),
        )
        .unwrap();
        assert_eq!(
            out,
            json!({"@context": ctx, "label": {"en": "Hello", "fr": "Bonjour"}})
        );
    }

    #[test]
    fn test_compact_graph_set_container() {
        let ctx = json!({"input": {"@id": "https://example.com/input", "@container": ["@graph", "@set"]}});
        let out = compact(
            json!({"https://example.com/input": {"@graph": {"https://example.com/value": "x"}}}),
            ctx.clone(),
        )
        .unwrap();
        assert_eq!(
            out,
            json!({
                "@context": ctx,
                "input": [{"https://example.com/value": "x"}]
            })
        );
    }

    #[test]
    fn test_compact_multiple_nodes_uses_graph_and_relative_ids() {
        let options = JsonLdOptions::default().with_base("http://example.com/");
        let items = expand_document(
            &json!([
                {"@id": "http://example.com/a", "http://example.com/p": "1"},
                {"@id": "http://example.com/b", "http://example.com/p": "2"}
            ]),
            &options,
        )
        .unwrap();
        let out = compact_document(&items, &json!({"p": "http://example.com/p"}), &options, false)
            .unwrap();
        assert_eq!(
            out,
            json!({
                "@context": {"p": "http://example.com/p"},
                "@graph": [{"@id": "a", "p": "1"}, {"@id": "b", "p": "2"}]
            })
        );
    }

    #[test]
    fn test_compact_reverse_term_and_list() {
        let ctx = json!({
            "children": {"@reverse": "http://example.com/parent"},
            "steps": {"@id": "http://example.com/steps", "@container": "@list"}
        });
        let out = compact(
            json!({
                "@id": "http://example.com/mom",
                "@reverse": {"http://example.com/parent": {"@id": "http://example.com/kid"}},
                "http://example.com/steps": {"@list": ["a", "b"]}
            }),
            ctx.clone(),
        )
        .unwrap();
        assert_eq!(
            out,
            json!({
                "@context": ctx,
                "@id": "http://example.com/mom",
                "children": {"@id": "http://example.com/kid"},
                "steps": ["a", "b"]
            })
        );
    }

    #[test]
    fn test_iri_confused_with_prefix() {
        let out = compact(
            json!({"@id": "http://example.com/a", "http://example.com/thing": "x"}),
            json!({"ex": "http://example.com/"}),
        )
        .unwrap();
        assert_eq!(out["ex:thing"], json!("x"));

        let options = JsonLdOptions::default();
        let active = ActiveContext::default()
            .process(&json!({"tel": {"@id": "http://example.com/tel", "@prefix": true}}), None, &options)
            .unwrap();
        let err = Compactor::new(&options)
            .compact_iri(&active, "tel:123", None, true, false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IriConfusedWithPrefix);
    }

    #[test]
    fn test_list_container_holds_one_list() {
        let context = json!({"p": {"@id": "http://example.com/p", "@container": "@list"}});
        let out = compact(json!({"http://example.com/p": {"@list": [1, 2]}}), context.clone()).unwrap();
        assert_eq!(out["p"], json!([1, 2]));

        let err = compact(
            json!({"http://example.com/p": [{"@list": [1]}, {"@list": [2]}]}),
            context,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CompactionToListOfLists);
    }

    #[test]
    fn test_empty_context_is_omitted() {
        let out = compact(json!({"http://example.com/p": "v"}), json!({})).unwrap();
        assert_eq!(out, json!({"http://example.com/p": "v"}));
    }
}
