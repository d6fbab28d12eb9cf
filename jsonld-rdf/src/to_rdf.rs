//! Node map to RDF dataset conversion

use crate::canonical::canonical_json;
use crate::quad::{Dataset, Literal, Quad, Term};
use jsonld_core::iri;
use jsonld_core::node_map::DEFAULT_GRAPH;
use jsonld_core::{BlankNodeIssuer, Item, JsonLdOptions, LiteralValue, NodeMap, RdfDirection};
use jsonld_vocab::{i18n, rdf, xsd};
use serde_json::Number;

fn is_well_formed_iri(value: &str) -> bool {
    iri::is_absolute(value)
}

fn id_term(id: &str) -> Option<Term> {
    if iri::is_blank(id) {
        Some(Term::Blank(id.to_string()))
    } else if is_well_formed_iri(id) {
        Some(Term::Iri(id.to_string()))
    } else {
        None
    }
}

/// BCP47-shaped language tag check
fn is_well_formed_language(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let first_ok = parts
        .next()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphabetic()));
    first_ok && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// `xsd:double` canonical lexical form, e.g. `1.1E0` or `1.0E21`.
pub(crate) fn canonical_xsd_double(value: f64) -> String {
    let formatted = format!("{:.15e}", value);
    let (mantissa, exponent) = formatted
        .split_once('e')
        .unwrap_or((formatted.as_str(), "0"));
    let mut mantissa = mantissa.trim_end_matches('0').to_string();
    if mantissa.ends_with('.') {
        mantissa.push('0');
    }
    format!("{}E{}", mantissa, exponent)
}

fn number_literal(n: &Number, datatype: Option<&str>) -> Literal {
    let integral = n.is_i64() || n.is_u64();
    let as_f64 = n.as_f64().unwrap_or_default();
    let is_double = datatype == Some(xsd::DOUBLE)
        || (!integral && (as_f64.fract() != 0.0 || as_f64.abs() >= 1e21));
    if is_double {
        return Literal::typed(canonical_xsd_double(as_f64), datatype.unwrap_or(xsd::DOUBLE));
    }
    let lexical = if integral {
        n.to_string()
    } else {
        format!("{:.0}", as_f64)
    };
    Literal::typed(lexical, datatype.unwrap_or(xsd::INTEGER))
}

/// Serializes one node map into quads.
pub struct RdfSerializer<'a> {
    options: &'a JsonLdOptions,
}

impl<'a> RdfSerializer<'a> {
    pub fn new(options: &'a JsonLdOptions) -> Self {
        Self { options }
    }

    /// Quads for every graph of `node_map`, graphs and subjects in key order.
    ///
    /// Triples with relative IRIs are skipped; blank-node predicates are
    /// only kept when generalized RDF is requested.
    pub fn serialize(&self, node_map: &NodeMap, issuer: &mut BlankNodeIssuer) -> Dataset {
        let mut dataset = Dataset::new();
        for (graph_name, graph) in node_map.graphs() {
            let graph_term = if graph_name == DEFAULT_GRAPH {
                None
            } else {
                match id_term(graph_name) {
                    Some(term) => Some(term),
                    None => {
                        tracing::debug!(graph = graph_name, "skipping graph with relative name");
                        continue;
                    }
                }
            };

            for (id, node) in graph {
                let Some(subject) = id_term(id) else {
                    continue;
                };

                for ty in &node.types {
                    if let Some(object) = id_term(ty) {
                        dataset.add(Quad::new(
                            subject.clone(),
                            Term::iri(rdf::TYPE),
                            object,
                            graph_term.clone(),
                        ));
                    }
                }

                for (property, items) in &node.properties {
                    let Some(predicate) = id_term(property) else {
                        continue;
                    };
                    if predicate.is_blank() && !self.options.produce_generalized_rdf {
                        continue;
                    }
                    for item in items {
                        let mut triples = Vec::new();
                        if let Some(object) = self.object_to_rdf(item, issuer, &mut triples) {
                            triples.push((subject.clone(), predicate.clone(), object));
                        }
                        dataset.extend(triples.into_iter().map(|(s, p, o)| {
                            Quad::new(s, p, o, graph_term.clone())
                        }));
                    }
                }
            }
        }
        dataset
    }

    /// RDF term for `item`; the triples of a list chain are pushed to
    /// `triples` before the term is returned.
    fn object_to_rdf(
        &self,
        item: &Item,
        issuer: &mut BlankNodeIssuer,
        triples: &mut Vec<(Term, Term, Term)>,
    ) -> Option<Term> {
        match item {
            Item::Node(node) => node.id.as_deref().and_then(id_term),
            Item::List(list) => Some(self.list_to_rdf(&list.items, issuer, triples)),
            Item::Value(literal) => self.literal_to_rdf(literal),
            Item::Null => None,
        }
    }

    fn list_to_rdf(
        &self,
        items: &[Item],
        issuer: &mut BlankNodeIssuer,
        triples: &mut Vec<(Term, Term, Term)>,
    ) -> Term {
        if items.is_empty() {
            return Term::iri(rdf::NIL);
        }
        let bnodes: Vec<Term> = items.iter().map(|_| Term::Blank(issuer.issue(None))).collect();
        for (i, item) in items.iter().enumerate() {
            let subject = bnodes[i].clone();
            let mut embedded = Vec::new();
            if let Some(object) = self.object_to_rdf(item, issuer, &mut embedded) {
                triples.push((subject.clone(), Term::iri(rdf::FIRST), object));
            }
            triples.extend(embedded);
            let rest = bnodes
                .get(i + 1)
                .cloned()
                .unwrap_or_else(|| Term::iri(rdf::NIL));
            triples.push((subject, Term::iri(rdf::REST), rest));
        }
        bnodes[0].clone()
    }

    fn literal_to_rdf(&self, literal: &jsonld_core::Literal) -> Option<Term> {
        let datatype = literal.datatype.as_deref();
        if datatype.is_some_and(|dt| !is_well_formed_iri(dt)) {
            return None;
        }
        if literal
            .language
            .as_deref()
            .is_some_and(|lang| !is_well_formed_language(lang))
        {
            tracing::debug!(language = ?literal.language, "skipping literal with malformed language tag");
            return None;
        }

        let converted = match &literal.value {
            LiteralValue::Json(value) => Literal::typed(canonical_json(value), rdf::JSON),
            LiteralValue::Bool(b) => Literal::typed(b.to_string(), datatype.unwrap_or(xsd::BOOLEAN)),
            LiteralValue::Number(n) => number_literal(n, datatype),
            LiteralValue::String(s) => {
                if let (Some(direction), Some(RdfDirection::I18nDatatype)) =
                    (literal.direction, self.options.rdf_direction)
                {
                    let language = literal.language.as_deref().unwrap_or_default().to_lowercase();
                    Literal::typed(
                        s.clone(),
                        format!("{}{}_{}", i18n::BASE, language, direction.as_str()),
                    )
                } else if let Some(language) = &literal.language {
                    Literal::lang_string(s.clone(), language.clone())
                } else {
                    Literal::typed(s.clone(), datatype.unwrap_or(xsd::STRING))
                }
            }
        };
        Some(Term::Literal(converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonld_core::{build_node_map, expand_items};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn to_lines(doc: JsonValue, options: &JsonLdOptions) -> Vec<String> {
        let items = expand_items(&doc, options).unwrap();
        let mut issuer = BlankNodeIssuer::default();
        let node_map = build_node_map(&items, &mut issuer).unwrap();
        let dataset = RdfSerializer::new(options).serialize(&node_map, &mut issuer);
        dataset.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_canonical_xsd_double() {
        assert_eq!(canonical_xsd_double(1.1), "1.1E0");
        assert_eq!(canonical_xsd_double(1.0), "1.0E0");
        assert_eq!(canonical_xsd_double(1.5e21), "1.5E21");
        assert_eq!(canonical_xsd_double(-0.001), "-1.0E-3");
    }

    #[test]
    fn test_native_values() {
        let lines = to_lines(
            json!({
                "@id": "http://ex/s",
                "http://ex/b": true,
                "http://ex/i": 5,
                "http://ex/d": 5.5
            }),
            &JsonLdOptions::default(),
        );
        assert_eq!(
            lines,
            vec![
                "<http://ex/s> <http://ex/b> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> .",
                "<http://ex/s> <http://ex/d> \"5.5E0\"^^<http://www.w3.org/2001/XMLSchema#double> .",
                "<http://ex/s> <http://ex/i> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> .",
            ]
        );
    }

    #[test]
    fn test_list_chain() {
        let lines = to_lines(
            json!({"@id": "http://ex/s", "http://ex/p": {"@list": ["a", "b"]}}),
            &JsonLdOptions::default(),
        );
        assert_eq!(
            lines,
            vec![
                "_:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"a\" .",
                "_:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> _:b1 .",
                "_:b1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"b\" .",
                "_:b1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> .",
                "<http://ex/s> <http://ex/p> _:b0 .",
            ]
        );
    }

    #[test]
    fn test_relative_iris_and_bad_languages_skipped() {
        let lines = to_lines(
            json!({
                "@id": "relative",
                "http://ex/p": "x"
            }),
            &JsonLdOptions::default(),
        );
        assert!(lines.is_empty());

        let lines = to_lines(
            json!({
                "@id": "http://ex/s",
                "http://ex/p": {"@value": "x", "@language": "not a tag"}
            }),
            &JsonLdOptions::default(),
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn test_i18n_direction_datatype() {
        let options = JsonLdOptions::default().with_rdf_direction(RdfDirection::I18nDatatype);
        let lines = to_lines(
            json!({
                "@id": "http://ex/s",
                "http://ex/p": {"@value": "x", "@language": "en-US", "@direction": "rtl"}
            }),
            &options,
        );
        assert_eq!(
            lines,
            vec!["<http://ex/s> <http://ex/p> \"x\"^^<https://www.w3.org/ns/i18n#en-us_rtl> ."]
        );
    }

    #[test]
    fn test_json_literal_is_canonical() {
        let lines = to_lines(
            json!({
                "@id": "http://ex/s",
                "http://ex/p": {"@value": {"b": [1, 2.0], "a": null}, "@type": "@json"}
            }),
            &JsonLdOptions::default(),
        );
        assert_eq!(
            lines,
            vec![
                "<http://ex/s> <http://ex/p> \"{\\\"a\\\":null,\\\"b\\\":[1,2]}\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON> ."
            ]
        );
    }
}
