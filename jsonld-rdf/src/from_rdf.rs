//! RDF dataset to expanded JSON-LD conversion
//!
//! Quads are grouped into per-graph subject maps; well-formed
//! `rdf:first`/`rdf:rest` chains are folded back into `@list` objects.

use crate::error::{RdfError, Result};
use crate::quad::{Dataset, Literal, Term};
use jsonld_core::node_map::DEFAULT_GRAPH;
use jsonld_core::{Direction, Item, JsonLdOptions, List, LiteralValue, Node, RdfDirection};
use jsonld_vocab::{i18n, rdf, xsd};
use serde_json::{Number, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};

type Graph = BTreeMap<String, Node>;

/// Where a blank node is referenced from: `property` of `node`, at position
/// `index` of its values.
#[derive(Debug, Clone)]
struct Usage {
    node: String,
    property: String,
    index: usize,
}

/// How often a blank node object has been seen.
#[derive(Debug, Clone)]
enum Reference {
    Once(Usage),
    Many,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: Graph,
    /// Subjects whose `rdf:rest` (or any property) points at `rdf:nil`
    nil_usages: Vec<Usage>,
    referenced: HashMap<String, Reference>,
}

fn is_integer_lexical(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_double_lexical(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    if matches!(chars.peek(), Some('+' | '-')) {
        chars.next();
    }
    let body: String = chars.collect();
    let (mantissa, exponent) = match body.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (body.as_str(), None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            (!int.is_empty() || !frac.is_empty())
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    };
    let exponent_ok = exponent.map_or(true, is_integer_lexical);
    mantissa_ok && exponent_ok
}

/// Converts quads back into expanded node objects.
pub struct RdfDeserializer<'a> {
    options: &'a JsonLdOptions,
}

impl<'a> RdfDeserializer<'a> {
    pub fn new(options: &'a JsonLdOptions) -> Self {
        Self { options }
    }

    pub fn deserialize(&self, dataset: &Dataset) -> Result<Vec<Item>> {
        let mut graphs: BTreeMap<String, GraphState> = BTreeMap::new();
        graphs.insert(DEFAULT_GRAPH.to_string(), GraphState::default());

        for quad in dataset {
            let name = match &quad.graph {
                None => DEFAULT_GRAPH.to_string(),
                Some(term) => match term.as_id() {
                    Some(id) => id.to_string(),
                    None => continue,
                },
            };
            if name != DEFAULT_GRAPH {
                if let Some(default) = graphs.get_mut(DEFAULT_GRAPH) {
                    default
                        .nodes
                        .entry(name.clone())
                        .or_insert_with(|| Node::with_id(name.clone()));
                }
            }
            let state = graphs.entry(name).or_default();

            let (Some(subject), Some(predicate)) = (quad.subject.as_id(), quad.predicate.as_id())
            else {
                continue;
            };
            state
                .nodes
                .entry(subject.to_string())
                .or_insert_with(|| Node::with_id(subject));

            if let Some(object) = quad.object.as_id() {
                state
                    .nodes
                    .entry(object.to_string())
                    .or_insert_with(|| Node::with_id(object));
                if predicate == rdf::TYPE && !self.options.use_rdf_type {
                    if let Some(node) = state.nodes.get_mut(subject) {
                        node.add_type(object);
                    }
                    continue;
                }
            }

            let value = self.object_to_item(&quad.object)?;
            let Some(node) = state.nodes.get_mut(subject) else {
                continue;
            };
            node.add_unique(predicate, value.clone());
            let index = node
                .properties
                .get(predicate)
                .and_then(|values| values.iter().position(|v| v.same_value(&value)))
                .unwrap_or_default();
            let usage = Usage {
                node: subject.to_string(),
                property: predicate.to_string(),
                index,
            };

            match &quad.object {
                Term::Iri(iri) if iri == rdf::NIL => state.nil_usages.push(usage),
                Term::Blank(label) => {
                    state
                        .referenced
                        .entry(label.clone())
                        .and_modify(|r| *r = Reference::Many)
                        .or_insert(Reference::Once(usage));
                }
                _ => {}
            }
        }

        for state in graphs.values_mut() {
            fold_lists(state);
        }

        let mut graphs: BTreeMap<String, Graph> =
            graphs.into_iter().map(|(name, state)| (name, state.nodes)).collect();
        let default = graphs.remove(DEFAULT_GRAPH).unwrap_or_default();

        let mut result = Vec::new();
        for (id, mut node) in default {
            if let Some(graph) = graphs.remove(&id) {
                node.graph = Some(
                    graph
                        .into_values()
                        .filter(|n| !n.is_reference())
                        .map(Item::Node)
                        .collect(),
                );
            }
            if !node.is_reference() {
                result.push(Item::Node(node));
            }
        }
        tracing::debug!(quads = dataset.len(), nodes = result.len(), "converted dataset");
        Ok(result)
    }

    fn object_to_item(&self, object: &Term) -> Result<Item> {
        match object {
            Term::Iri(id) | Term::Blank(id) => Ok(Item::reference(id.clone())),
            Term::Literal(literal) => Ok(Item::Value(self.literal_to_value(literal)?)),
        }
    }

    fn literal_to_value(&self, literal: &Literal) -> Result<jsonld_core::Literal> {
        let lexical = literal.lexical.as_str();
        let datatype = literal.datatype.as_str();

        if let Some(language) = &literal.language {
            return Ok(jsonld_core::Literal::lang_string(lexical, language.clone()));
        }

        if self.options.use_native_types {
            match datatype {
                xsd::STRING => return Ok(jsonld_core::Literal::string(lexical)),
                xsd::BOOLEAN if lexical == "true" || lexical == "false" => {
                    return Ok(native(LiteralValue::Bool(lexical == "true")));
                }
                xsd::INTEGER if is_integer_lexical(lexical) => {
                    if let Ok(n) = lexical.trim_start_matches('+').parse::<i64>() {
                        return Ok(native(LiteralValue::Number(n.into())));
                    }
                }
                xsd::DOUBLE if is_double_lexical(lexical) => {
                    if let Some(n) = lexical.parse::<f64>().ok().and_then(Number::from_f64) {
                        return Ok(native(LiteralValue::Number(n)));
                    }
                }
                _ => {}
            }
        }

        if datatype == rdf::JSON && !self.options.is_json_ld_10() {
            let value: JsonValue = serde_json::from_str(lexical)
                .map_err(|e| RdfError::InvalidJsonLiteral(format!("{}: {}", lexical, e)))?;
            return Ok(jsonld_core::Literal::json(value));
        }

        if let (Some(suffix), Some(RdfDirection::I18nDatatype)) =
            (datatype.strip_prefix(i18n::BASE), self.options.rdf_direction)
        {
            let (language, direction) = suffix.split_once('_').unwrap_or((suffix, ""));
            let mut value = jsonld_core::Literal::string(lexical);
            if !language.is_empty() {
                value.language = Some(language.to_string());
            }
            value.direction = Direction::parse(direction);
            return Ok(value);
        }

        if datatype == xsd::STRING {
            Ok(jsonld_core::Literal::string(lexical))
        } else {
            Ok(jsonld_core::Literal::typed(
                LiteralValue::String(lexical.to_string()),
                datatype,
            ))
        }
    }
}

fn native(value: LiteralValue) -> jsonld_core::Literal {
    jsonld_core::Literal {
        value,
        datatype: None,
        language: None,
        direction: None,
        index: None,
    }
}

/// A blank node that holds exactly one `rdf:first`, one `rdf:rest` and at
/// most an `rdf:List` type.
fn is_list_node(node: &Node) -> bool {
    let well_typed = node.types.is_empty() || node.types == [rdf::LIST];
    let single = |p: &str| node.properties.get(p).is_some_and(|v| v.len() == 1);
    well_typed
        && node.properties.len() == 2
        && single(rdf::FIRST)
        && single(rdf::REST)
        && node.index.is_none()
        && node.graph.is_none()
}

/// Replace each list head reference with an `@list` object and drop the
/// folded list nodes.
fn fold_lists(state: &mut GraphState) {
    let usages = std::mem::take(&mut state.nil_usages);
    for start in usages {
        let mut usage = start;
        let mut items = Vec::new();
        let mut folded = Vec::new();

        loop {
            if usage.property != rdf::REST || !usage.node.starts_with("_:") {
                break;
            }
            let Some(Reference::Once(next)) = state.referenced.get(&usage.node).cloned() else {
                break;
            };
            let Some(node) = state.nodes.get(&usage.node) else {
                break;
            };
            if !is_list_node(node) {
                break;
            }
            if let Some(first) = node.properties.get(rdf::FIRST).and_then(|v| v.first()) {
                items.push(first.clone());
            }
            folded.push(usage.node.clone());
            usage = next;
            if !usage.node.starts_with("_:") {
                break;
            }
        }

        items.reverse();
        let head = state
            .nodes
            .get_mut(&usage.node)
            .and_then(|node| node.properties.get_mut(&usage.property))
            .and_then(|values| values.get_mut(usage.index));
        if let Some(head) = head {
            *head = Item::List(List::new(items));
        }
        for id in folded {
            state.nodes.remove(&id);
        }
    }
}
