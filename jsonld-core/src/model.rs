//! Typed expanded form.
//!
//! Expansion produces [`Item`]s instead of untyped JSON maps, so node, value
//! and list objects can not be confused with each other. The shapes the
//! JSON-LD grammar names separately are predicates over these types:
//!
//! - a *node reference* is a [`Node`] carrying only `@id` ([`Node::is_reference`])
//! - a *graph object* is a [`Node`] carrying `@graph` and at most `@id` / `@index`
//!   ([`Node::is_graph_object`])
//!
//! Node properties live in sorted maps, which gives every algorithm that walks
//! them a deterministic order.

use jsonld_vocab::keywords as kw;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::BTreeMap;

/// Base direction of a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// The `@value` of a value object.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Bool(bool),
    Number(Number),
    /// A JSON literal (`"@type": "@json"`); may hold any JSON, including null.
    Json(JsonValue),
}

impl LiteralValue {
    pub fn to_json(&self) -> JsonValue {
        match self {
            LiteralValue::String(s) => JsonValue::String(s.clone()),
            LiteralValue::Bool(b) => JsonValue::Bool(*b),
            LiteralValue::Number(n) => JsonValue::Number(n.clone()),
            LiteralValue::Json(v) => v.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A value object.
///
/// `datatype` and `language` are never both set; `direction` only appears on
/// untyped values.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub datatype: Option<String>,
    pub language: Option<String>,
    pub direction: Option<Direction>,
    pub index: Option<String>,
}

impl Literal {
    fn bare(value: LiteralValue) -> Self {
        Self {
            value,
            datatype: None,
            language: None,
            direction: None,
            index: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::bare(LiteralValue::String(value.into()))
    }

    pub fn typed(value: LiteralValue, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::bare(value)
        }
    }

    pub fn lang_string(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::bare(LiteralValue::String(value.into()))
        }
    }

    pub fn json(value: JsonValue) -> Self {
        Self::bare(LiteralValue::Json(value))
    }

    /// Wrap a JSON scalar; None for arrays, objects and null.
    pub fn from_scalar(value: &JsonValue) -> Option<Self> {
        let value = match value {
            JsonValue::String(s) => LiteralValue::String(s.clone()),
            JsonValue::Bool(b) => LiteralValue::Bool(*b),
            JsonValue::Number(n) => LiteralValue::Number(n.clone()),
            _ => return None,
        };
        Some(Self::bare(value))
    }

    pub fn is_json(&self) -> bool {
        matches!(self.value, LiteralValue::Json(_))
    }

    /// The `@type` as it appears in expanded output: the datatype IRI, or
    /// `@json` for JSON literals.
    pub fn type_iri(&self) -> Option<&str> {
        if self.is_json() {
            Some(kw::JSON)
        } else {
            self.datatype.as_deref()
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert(kw::VALUE.to_string(), self.value.to_json());
        if let Some(t) = self.type_iri() {
            obj.insert(kw::TYPE.to_string(), JsonValue::String(t.to_string()));
        }
        if let Some(lang) = &self.language {
            obj.insert(kw::LANGUAGE.to_string(), JsonValue::String(lang.clone()));
        }
        if let Some(dir) = self.direction {
            obj.insert(kw::DIRECTION.to_string(), JsonValue::String(dir.as_str().to_string()));
        }
        if let Some(index) = &self.index {
            obj.insert(kw::INDEX.to_string(), JsonValue::String(index.clone()));
        }
        JsonValue::Object(obj)
    }
}

/// A node object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub id: Option<String>,
    pub types: Vec<String>,
    pub index: Option<String>,
    pub graph: Option<Vec<Item>>,
    pub included: Option<Vec<Item>>,
    /// Reverse property IRI to the nodes that point at this node.
    pub reverse: BTreeMap<String, Vec<Item>>,
    pub properties: BTreeMap<String, Vec<Item>>,
}

impl Node {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Only `@id`.
    pub fn is_reference(&self) -> bool {
        self.id.is_some() && self.index.is_none() && self.has_no_content()
    }

    /// Only `@id`, optionally with `@index`.
    pub fn is_indexed_reference(&self) -> bool {
        self.id.is_some() && self.has_no_content()
    }

    /// Carries `@graph` and nothing but `@id` / `@index` besides.
    pub fn is_graph_object(&self) -> bool {
        self.graph.is_some()
            && self.types.is_empty()
            && self.included.is_none()
            && self.reverse.is_empty()
            && self.properties.is_empty()
    }

    /// A graph object without `@id`.
    pub fn is_simple_graph_object(&self) -> bool {
        self.is_graph_object() && self.id.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.index.is_none() && self.has_no_content()
    }

    fn has_no_content(&self) -> bool {
        self.types.is_empty()
            && self.graph.is_none()
            && self.included.is_none()
            && self.reverse.is_empty()
            && self.properties.is_empty()
    }

    /// Append `item` to `property` unless an equal value is already present.
    /// Lists are always appended.
    pub fn add_unique(&mut self, property: &str, item: Item) {
        add_unique(self.properties.entry(property.to_string()).or_default(), item);
    }

    pub fn add_type(&mut self, iri: &str) {
        if !self.types.iter().any(|t| t == iri) {
            self.types.push(iri.to_string());
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        if let Some(id) = &self.id {
            obj.insert(kw::ID.to_string(), JsonValue::String(id.clone()));
        }
        if !self.types.is_empty() {
            obj.insert(
                kw::TYPE.to_string(),
                JsonValue::Array(self.types.iter().cloned().map(JsonValue::String).collect()),
            );
        }
        if let Some(index) = &self.index {
            obj.insert(kw::INDEX.to_string(), JsonValue::String(index.clone()));
        }
        if let Some(graph) = &self.graph {
            obj.insert(kw::GRAPH.to_string(), items_to_json(graph));
        }
        if let Some(included) = &self.included {
            obj.insert(kw::INCLUDED.to_string(), items_to_json(included));
        }
        if !self.reverse.is_empty() {
            let reverse: Map<String, JsonValue> = self
                .reverse
                .iter()
                .map(|(p, items)| (p.clone(), items_to_json(items)))
                .collect();
            obj.insert(kw::REVERSE.to_string(), JsonValue::Object(reverse));
        }
        for (property, items) in &self.properties {
            obj.insert(property.clone(), items_to_json(items));
        }
        JsonValue::Object(obj)
    }
}

/// A list object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    pub items: Vec<Item>,
    pub index: Option<String>,
}

impl List {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, index: None }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert(kw::LIST.to_string(), items_to_json(&self.items));
        if let Some(index) = &self.index {
            obj.insert(kw::INDEX.to_string(), JsonValue::String(index.clone()));
        }
        JsonValue::Object(obj)
    }
}

/// One value of an expanded property.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Node(Node),
    Value(Literal),
    List(List),
    /// Placeholder for a missing value; produced by framing defaults and
    /// compacted to JSON `null`.
    Null,
}

impl Item {
    pub fn reference(id: impl Into<String>) -> Self {
        Item::Node(Node::with_id(id))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Item::Value(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Item::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Item::Value(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Item::List(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Item::Node(node) if node.is_reference())
    }

    pub fn is_graph_object(&self) -> bool {
        matches!(self, Item::Node(node) if node.is_graph_object())
    }

    /// `@id` of a node item.
    pub fn id(&self) -> Option<&str> {
        match self {
            Item::Node(node) => node.id.as_deref(),
            _ => None,
        }
    }

    pub fn index(&self) -> Option<&str> {
        match self {
            Item::Node(node) => node.index.as_deref(),
            Item::Value(lit) => lit.index.as_deref(),
            Item::List(list) => list.index.as_deref(),
            Item::Null => None,
        }
    }

    /// Value identity used when merging node maps: equal literals, or nodes
    /// with the same `@id`. Lists never compare equal.
    pub fn same_value(&self, other: &Item) -> bool {
        match (self, other) {
            (Item::Value(a), Item::Value(b)) => a == b,
            (Item::Node(a), Item::Node(b)) => a.id.is_some() && a.id == b.id,
            _ => false,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Item::Node(node) => node.to_json(),
            Item::Value(lit) => lit.to_json(),
            Item::List(list) => list.to_json(),
            Item::Null => JsonValue::Null,
        }
    }
}

impl From<Node> for Item {
    fn from(node: Node) -> Self {
        Item::Node(node)
    }
}

impl From<Literal> for Item {
    fn from(lit: Literal) -> Self {
        Item::Value(lit)
    }
}

/// Push `item` unless an equal value is present; lists are always pushed.
pub fn add_unique(items: &mut Vec<Item>, item: Item) {
    if item.is_list() || !items.iter().any(|existing| existing.same_value(&item)) {
        items.push(item);
    }
}

/// Serialize a sequence of items as an expanded JSON-LD array.
pub fn items_to_json(items: &[Item]) -> JsonValue {
    JsonValue::Array(items.iter().map(Item::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_predicates() {
        let reference = Node::with_id("http://example.com/a");
        assert!(reference.is_reference());
        assert!(!reference.is_graph_object());

        let graph = Node {
            id: Some("http://example.com/g".to_string()),
            graph: Some(vec![]),
            ..Default::default()
        };
        assert!(graph.is_graph_object());
        assert!(!graph.is_simple_graph_object());
        assert!(!graph.is_reference());

        assert!(Node::default().is_empty());
    }

    #[test]
    fn test_same_value() {
        let a = Item::Value(Literal::string("x"));
        let b = Item::Value(Literal::string("x"));
        let c = Item::Value(Literal::lang_string("x", "en"));
        assert!(a.same_value(&b));
        assert!(!a.same_value(&c));

        assert!(Item::reference("_:b0").same_value(&Item::reference("_:b0")));
        assert!(!Item::List(List::default()).same_value(&Item::List(List::default())));
    }

    #[test]
    fn test_add_unique() {
        let mut items = vec![Item::Value(Literal::string("x"))];
        add_unique(&mut items, Item::Value(Literal::string("x")));
        add_unique(&mut items, Item::List(List::default()));
        add_unique(&mut items, Item::List(List::default()));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_to_json() {
        let mut node = Node::with_id("http://example.com/a");
        node.types.push("http://example.com/T".to_string());
        node.add_unique(
            "http://example.com/p",
            Item::Value(Literal::json(json!({"b": [1, null]}))),
        );
        node.add_unique(
            "http://example.com/q",
            Item::List(List::new(vec![Item::reference("http://example.com/b")])),
        );

        assert_eq!(
            Item::Node(node).to_json(),
            json!({
                "@id": "http://example.com/a",
                "@type": ["http://example.com/T"],
                "http://example.com/p": [{"@value": {"b": [1, null]}, "@type": "@json"}],
                "http://example.com/q": [{"@list": [{"@id": "http://example.com/b"}]}]
            })
        );
    }
}
