//! RDF terms, quads and datasets
//!
//! A term is one of:
//! - An IRI (always absolute unless generalized RDF was requested)
//! - A blank node, labelled with its `_:` prefix as JSON-LD writes it
//! - A literal (lexical form + explicit datatype + optional language tag)

use jsonld_vocab::{rdf, xsd};
use serde_json::{json, Map, Value as JsonValue};
use std::fmt;

/// An RDF literal.
///
/// The datatype is always explicit: plain strings carry `xsd:string` and
/// language-tagged strings carry `rdf:langString`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub lexical: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    /// Plain string literal (`xsd:string`)
    pub fn string(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, xsd::STRING)
    }

    /// Literal with an explicit datatype IRI
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Language-tagged string (`rdf:langString`)
    pub fn lang_string(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: rdf::LANG_STRING.to_string(),
            language: Some(language.into()),
        }
    }

    pub fn is_xsd_string(&self) -> bool {
        self.datatype == xsd::STRING
    }
}

/// An RDF term in subject, predicate, object or graph position.
///
/// Ordering is blank nodes, then IRIs, then literals.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Blank node label including the `_:` prefix
    Blank(String),
    /// Expanded IRI
    Iri(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Blank node term; `label` may be given with or without `_:`.
    pub fn blank(label: impl AsRef<str>) -> Self {
        let label = label.as_ref();
        if label.starts_with("_:") {
            Term::Blank(label.to_string())
        } else {
            Term::Blank(format!("_:{}", label))
        }
    }

    /// Blank node for a JSON-LD identifier, IRI otherwise.
    pub fn from_id(id: &str) -> Self {
        if id.starts_with("_:") {
            Term::Blank(id.to_string())
        } else {
            Term::Iri(id.to_string())
        }
    }

    pub fn string(lexical: impl Into<String>) -> Self {
        Term::Literal(Literal::string(lexical))
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// IRI or blank node label, as used for `@id`.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Term::Iri(s) | Term::Blank(s) => Some(s),
            Term::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// `{type, value, datatype?, language?}` object.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Term::Iri(iri) => json!({"type": "IRI", "value": iri}),
            Term::Blank(label) => json!({"type": "blank node", "value": label}),
            Term::Literal(lit) => {
                let mut obj = Map::new();
                obj.insert("type".to_string(), json!("literal"));
                obj.insert("value".to_string(), json!(lit.lexical));
                obj.insert("datatype".to_string(), json!(lit.datatype));
                if let Some(language) = &lit.language {
                    obj.insert("language".to_string(), json!(language));
                }
                JsonValue::Object(obj)
            }
        }
    }
}

/// Escape a literal's lexical form for N-Quads output.
fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{0008}' => f.write_str("\\b")?,
            '\u{000C}' => f.write_str("\\f")?,
            c if c < '\u{0020}' || c == '\u{007F}' => write!(f, "\\u{:04X}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Blank(label) => f.write_str(label),
            Term::Literal(lit) => {
                f.write_str("\"")?;
                write_escaped(f, &lit.lexical)?;
                f.write_str("\"")?;
                if let Some(language) = &lit.language {
                    write!(f, "@{}", language)
                } else if !lit.is_xsd_string() {
                    write!(f, "^^<{}>", lit.datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A triple, optionally placed in a named graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    /// `None` for the default graph
    pub graph: Option<Term>,
}

impl Quad {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Option<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// `{subject, predicate, object, graph?}` object.
    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("subject".to_string(), self.subject.to_json());
        obj.insert("predicate".to_string(), self.predicate.to_json());
        obj.insert("object".to_string(), self.object.to_json());
        if let Some(graph) = &self.graph {
            obj.insert("graph".to_string(), graph.to_json());
        }
        JsonValue::Object(obj)
    }
}

/// One N-Quads statement, without the trailing newline.
impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {}", graph)?;
        }
        f.write_str(" .")
    }
}

/// A collection of quads.
///
/// Storage is a `Vec`, so duplicates are kept until `dedupe` or
/// `canonicalize` is called.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    quads: Vec<Quad>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Sort and remove duplicates
    pub fn canonicalize(&mut self) {
        self.quads.sort();
        self.quads.dedup();
    }

    /// Quads of one graph (`None` is the default graph)
    pub fn graph<'a>(&'a self, name: Option<&'a Term>) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads.iter().filter(move |q| q.graph.as_ref() == name)
    }

    /// Array of quad objects.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.quads.iter().map(Quad::to_json).collect())
    }
}

impl IntoIterator for Dataset {
    type Item = Quad;
    type IntoIter = std::vec::IntoIter<Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Quad;
    type IntoIter = std::slice::Iter<'a, Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.iter()
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self {
            quads: iter.into_iter().collect(),
        }
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        self.quads.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_term_display() {
        assert_eq!(Term::iri("http://example.org").to_string(), "<http://example.org>");
        assert_eq!(Term::blank("b0").to_string(), "_:b0");
        assert_eq!(Term::blank("_:b0").to_string(), "_:b0");
        assert_eq!(Term::string("hello").to_string(), "\"hello\"");
        assert_eq!(
            Term::Literal(Literal::lang_string("bonjour", "fr")).to_string(),
            "\"bonjour\"@fr"
        );
        assert_eq!(
            Term::Literal(Literal::typed("42", xsd::INTEGER)).to_string(),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn test_literal_escaping() {
        let term = Term::string("say \"hi\"\\\n\ttab\u{1}");
        assert_eq!(term.to_string(), "\"say \\\"hi\\\"\\\\\\n\\ttab\\u0001\"");
    }

    #[test]
    fn test_term_ordering() {
        let blank = Term::blank("b0");
        let iri = Term::iri("http://example.org");
        let lit = Term::string("hello");
        assert!(blank < iri);
        assert!(iri < lit);
        assert!(Term::iri("http://a.org") < Term::iri("http://b.org"));
    }

    #[test]
    fn test_quad_display_and_json() {
        let quad = Quad::new(
            Term::iri("http://example.org/s"),
            Term::iri("http://example.org/p"),
            Term::Literal(Literal::lang_string("x", "en")),
            Some(Term::blank("g")),
        );
        assert_eq!(
            quad.to_string(),
            "<http://example.org/s> <http://example.org/p> \"x\"@en _:g ."
        );
        assert_eq!(
            quad.to_json(),
            json!({
                "subject": {"type": "IRI", "value": "http://example.org/s"},
                "predicate": {"type": "IRI", "value": "http://example.org/p"},
                "object": {
                    "type": "literal",
                    "value": "x",
                    "datatype": rdf::LANG_STRING,
                    "language": "en"
                },
                "graph": {"type": "blank node", "value": "_:g"}
            })
        );
    }

    #[test]
    fn test_dataset_canonicalize() {
        let quad = Quad::new(
            Term::iri("http://example.org/s"),
            Term::iri("http://example.org/p"),
            Term::string("o"),
            None,
        );
        let mut dataset: Dataset = vec![quad.clone(), quad.clone()].into_iter().collect();
        assert_eq!(dataset.len(), 2);
        dataset.canonicalize();
        assert_eq!(dataset.quads(), &[quad]);
        assert_eq!(dataset.graph(None).count(), 1);
    }
}
