//! Subject selection: does a node of the node map satisfy a frame?

use super::pattern::{Frame, IdPattern, Pattern, TypePattern, ValueConstraint, ValuePattern};
use crate::model::{Item, Literal};
use std::collections::BTreeMap;

/// Subjects of one graph, by id.
pub(crate) type Subjects = BTreeMap<String, crate::model::Node>;

fn constraint_matches<T, F>(constraint: &ValueConstraint<T>, present: Option<F>) -> bool
where
    F: Fn(&T) -> bool,
{
    match (constraint, present) {
        (ValueConstraint::Absent, None) => true,
        (ValueConstraint::Absent, Some(_)) => false,
        (ValueConstraint::Wildcard, found) => found.is_some(),
        (ValueConstraint::Values(values), Some(eq)) => values.iter().any(eq),
        (ValueConstraint::Values(_), None) => false,
    }
}

/// Literal against a value pattern; `@value`, `@type` and `@language` all
/// have to agree.
pub(crate) fn literal_matches(pattern: &ValuePattern, literal: &Literal) -> bool {
    if pattern.is_unconstrained() {
        return true;
    }
    let value = literal.value.to_json();
    let value_ok = match &pattern.value {
        ValueConstraint::Absent => false,
        ValueConstraint::Wildcard => true,
        ValueConstraint::Values(values) => values.contains(&value),
    };
    let datatype = literal.type_iri();
    let datatype_ok =
        constraint_matches(&pattern.datatype, datatype.map(|t| move |p: &String| p == t));
    let language = literal.language.as_deref();
    let language_ok = constraint_matches(
        &pattern.language,
        language.map(|l| move |p: &String| p.eq_ignore_ascii_case(l)),
    );
    value_ok && datatype_ok && language_ok
}

/// Whether a non-reference value is copied into the output under a
/// property whose pattern is `pattern` (`None` for implicit frames).
pub(crate) fn value_matches(pattern: Option<&Pattern>, item: &Item) -> bool {
    match pattern {
        None | Some(Pattern::List(_)) => true,
        Some(Pattern::MatchNone) => false,
        Some(Pattern::Node(frame)) => frame.types.is_none(),
        Some(Pattern::Value(value)) => match item {
            Item::Value(literal) => literal_matches(value, literal),
            _ => value.is_unconstrained(),
        },
    }
}

/// A reference matches a node pattern when the subject it points to does.
fn node_matches(subjects: &Subjects, frame: &Frame, item: &Item, require_all: bool) -> bool {
    let Some(id) = item.id() else {
        return false;
    };
    subjects
        .get(id)
        .is_some_and(|node| filter_subject(subjects, id, node, frame, require_all))
}

fn pattern_matches(subjects: &Subjects, pattern: &Pattern, values: &[Item], require_all: bool) -> bool {
    match pattern {
        Pattern::MatchNone => values.is_empty(),
        Pattern::List(inner) => {
            let Some(list) = values.first().and_then(Item::as_list) else {
                return false;
            };
            match inner.as_deref() {
                Some(Pattern::Value(vp)) => list
                    .items
                    .iter()
                    .any(|v| v.as_literal().is_some_and(|l| literal_matches(vp, l))),
                Some(Pattern::Node(frame)) => list
                    .items
                    .iter()
                    .any(|v| node_matches(subjects, frame, v, require_all)),
                _ => false,
            }
        }
        Pattern::Value(vp) => values
            .iter()
            .any(|v| v.as_literal().is_some_and(|l| literal_matches(vp, l))),
        Pattern::Node(frame) if frame.is_reference_pattern() => values
            .iter()
            .any(|v| node_matches(subjects, frame, v, require_all)),
        Pattern::Node(_) => !values.is_empty(),
    }
}

/// Frame matching for one subject.
///
/// `@id` and `@type` constraints decide alone unless `require_all` is set;
/// property constraints are OR-ed, or AND-ed under `require_all`. A frame
/// without type or property constraints matches everything.
pub(crate) fn filter_subject(
    subjects: &Subjects,
    id: &str,
    node: &crate::model::Node,
    frame: &Frame,
    require_all: bool,
) -> bool {
    let mut wildcard = true;
    let mut matches_some = false;

    if let Some(pattern) = &frame.id {
        let matched = match pattern {
            IdPattern::Wildcard => true,
            IdPattern::Values(ids) => ids.iter().any(|i| i == id),
        };
        if !require_all {
            return matched;
        }
        if !matched {
            return false;
        }
        matches_some = true;
    }

    if let Some(pattern) = &frame.types {
        wildcard = false;
        let matched = match pattern {
            TypePattern::MatchNone => {
                if !node.types.is_empty() {
                    return false;
                }
                true
            }
            TypePattern::Wildcard => !node.types.is_empty(),
            TypePattern::Values { iris, default } => {
                let matched = default.is_some() || node.types.iter().any(|t| iris.contains(t));
                if !require_all {
                    return matched;
                }
                matched
            }
        };
        if !matched && require_all {
            return false;
        }
        matches_some |= matched;
    }

    const NO_VALUES: &[Item] = &[];
    for (property, pattern) in &frame.properties {
        wildcard = false;
        let values = node.properties.get(property).map_or(NO_VALUES, Vec::as_slice);
        if values.is_empty() && pattern.default_value().is_some() {
            continue;
        }
        if !values.is_empty() && *pattern == Pattern::MatchNone {
            return false;
        }
        let matched = pattern_matches(subjects, pattern, values, require_all);
        if !matched && require_all {
            return false;
        }
        matches_some |= matched;
    }

    wildcard || matches_some
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{List, Node};
    use serde_json::json;

    const P: &str = "http://example.com/p";
    const Q: &str = "http://example.com/q";

    fn subjects() -> Subjects {
        let mut a = Node::with_id("http://example.com/a");
        a.types.push("http://example.com/T".to_string());
        a.properties.insert(P.to_string(), vec![Item::Value(Literal::lang_string("hi", "en"))]);
        a.properties.insert(Q.to_string(), vec![Item::reference("http://example.com/b")]);

        let mut b = Node::with_id("http://example.com/b");
        b.properties.insert(
            P.to_string(),
            vec![Item::List(List::new(vec![Item::Value(Literal::string("x"))]))],
        );

        let mut map = Subjects::new();
        map.insert("http://example.com/a".to_string(), a);
        map.insert("http://example.com/b".to_string(), b);
        map
    }

    fn matches(frame: &Frame, id: &str, require_all: bool) -> bool {
        let subjects = subjects();
        filter_subject(&subjects, id, &subjects[id], frame, require_all)
    }

    #[test]
    fn test_wildcard_and_type_constraints() {
        let frame = Frame::default();
        assert!(matches(&frame, "http://example.com/a", false));

        let typed = Frame {
            types: Some(TypePattern::Values {
                iris: vec!["http://example.com/T".to_string()],
                default: None,
            }),
            ..Default::default()
        };
        assert!(matches(&typed, "http://example.com/a", false));
        assert!(!matches(&typed, "http://example.com/b", false));

        let untyped = Frame {
            types: Some(TypePattern::MatchNone),
            ..Default::default()
        };
        assert!(!matches(&untyped, "http://example.com/a", false));
        assert!(matches(&untyped, "http://example.com/b", false));
    }

    #[test]
    fn test_property_constraints_and_require_all() {
        let mut frame = Frame::default();
        frame.properties.insert(
            P.to_string(),
            Pattern::Value(ValuePattern {
                value: ValueConstraint::Wildcard,
                datatype: ValueConstraint::Absent,
                language: ValueConstraint::Values(vec!["en".to_string()]),
            }),
        );
        frame.properties.insert(
            Q.to_string(),
            Pattern::Node(Frame {
                id: Some(IdPattern::Values(vec!["http://example.com/b".to_string()])),
                ..Default::default()
            }),
        );
        assert!(matches(&frame, "http://example.com/a", true));
        assert!(!matches(&frame, "http://example.com/b", false));

        frame.properties.insert(Q.to_string(), Pattern::MatchNone);
        assert!(!matches(&frame, "http://example.com/a", false));
    }

    #[test]
    fn test_list_patterns() {
        let mut frame = Frame::default();
        frame.properties.insert(
            P.to_string(),
            Pattern::List(Some(Box::new(Pattern::Value(ValuePattern {
                value: ValueConstraint::Values(vec![json!("x")]),
                datatype: ValueConstraint::Absent,
                language: ValueConstraint::Absent,
            })))),
        );
        assert!(matches(&frame, "http://example.com/b", false));
        assert!(!matches(&frame, "http://example.com/a", false));
    }
}
