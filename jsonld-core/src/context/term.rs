use crate::model::Direction;
use jsonld_vocab::keywords as kw;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

/// Container types for JSON-LD `@container` values.
///
/// Variant order follows the keyword spelling, so iterating a
/// `BTreeSet<Container>` yields keywords in lexicographic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Container {
    Graph,
    Id,
    Index,
    Language,
    List,
    Set,
    Type,
}

impl Container {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            kw::GRAPH => Some(Container::Graph),
            kw::ID => Some(Container::Id),
            kw::INDEX => Some(Container::Index),
            kw::LANGUAGE => Some(Container::Language),
            kw::LIST => Some(Container::List),
            kw::SET => Some(Container::Set),
            kw::TYPE => Some(Container::Type),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Graph => kw::GRAPH,
            Container::Id => kw::ID,
            Container::Index => kw::INDEX,
            Container::Language => kw::LANGUAGE,
            Container::List => kw::LIST,
            Container::Set => kw::SET,
            Container::Type => kw::TYPE,
        }
    }
}

/// Type coercion of a term (`@type` in a term definition)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMapping {
    /// `@id`: string values are IRIs resolved against the base
    Id,
    /// `@vocab`: string values are terms or vocabulary-relative IRIs
    Vocab,
    /// `@json`: values are JSON literals
    Json,
    /// `@none`: disables value compaction
    None,
    /// A datatype IRI
    Iri(String),
}

impl TypeMapping {
    pub fn as_str(&self) -> &str {
        match self {
            TypeMapping::Id => kw::ID,
            TypeMapping::Vocab => kw::VOCAB,
            TypeMapping::Json => kw::JSON,
            TypeMapping::None => kw::NONE,
            TypeMapping::Iri(iri) => iri,
        }
    }
}

/// A term definition. Pure data; created by the context processor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermDefinition {
    /// IRI mapping; None decouples the term from any IRI.
    pub iri: Option<String>,
    /// May be used as the prefix of a compact IRI.
    pub prefix: bool,
    pub protected: bool,
    pub reverse: bool,
    /// URL of the document the scoped context was defined in.
    pub base_url: Option<String>,
    /// Scoped context, kept unprocessed until the term is used.
    pub context: Option<JsonValue>,
    pub container: BTreeSet<Container>,
    /// Some(None) means explicitly cleared.
    pub direction: Option<Option<Direction>>,
    /// Property used by a property-valued `@index` container.
    pub index: Option<String>,
    /// Some(None) means explicitly cleared.
    pub language: Option<Option<String>>,
    pub nest: Option<String>,
    pub type_mapping: Option<TypeMapping>,
}

impl TermDefinition {
    pub fn has_container(&self, container: Container) -> bool {
        self.container.contains(&container)
    }

    /// Sorted concatenation of the container keywords, or `@none`.
    pub fn container_key(&self) -> String {
        if self.container.is_empty() {
            return kw::NONE.to_string();
        }
        self.container.iter().map(Container::as_str).collect()
    }

    /// Definitions are interchangeable when everything but the
    /// protection flag and the defining document agree.
    pub fn same_as(&self, other: &TermDefinition) -> bool {
        self.iri == other.iri
            && self.prefix == other.prefix
            && self.reverse == other.reverse
            && self.context == other.context
            && self.container == other.container
            && self.direction == other.direction
            && self.index == other.index
            && self.language == other.language
            && self.nest == other.nest
            && self.type_mapping == other.type_mapping
    }
}
