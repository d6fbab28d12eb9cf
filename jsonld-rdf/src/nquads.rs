//! N-Quads serialization and parsing
//!
//! The parser works one line at a time with winnow and fails fast on the
//! first malformed statement, reporting its 1-indexed line number.

use crate::error::{RdfError, Result};
use crate::quad::{Dataset, Literal, Quad, Term};
use jsonld_vocab::{rdf, xsd};
use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::stream::AsChar;
use winnow::token::{any, take_while};
use winnow::{ModalResult, Parser};

/// Serialize `dataset` as N-Quads: one statement per line, lines sorted
/// and deduplicated.
pub fn to_nquads(dataset: &Dataset) -> String {
    let mut lines: Vec<String> = dataset.iter().map(|q| format!("{}\n", q)).collect();
    lines.sort();
    lines.dedup();
    lines.concat()
}

/// Parse N-Quads text into a dataset; duplicate statements are dropped.
pub fn parse_nquads(input: &str) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    for (i, line) in input.lines().enumerate() {
        let line_no = i + 1;
        let mut rest = line;
        match statement.parse_next(&mut rest) {
            Ok(Some(quad)) => dataset.add(quad),
            Ok(None) => {}
            Err(e) => return Err(syntax_error(line_no, line, rest, e)),
        }
    }
    dataset.canonicalize();
    tracing::debug!(quads = dataset.len(), "parsed N-Quads");
    Ok(dataset)
}

fn syntax_error(line_no: usize, line: &str, rest: &str, error: ErrMode<ContextError>) -> RdfError {
    let column = line.len() - rest.len() + 1;
    let expected = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.to_string(),
        ErrMode::Incomplete(_) => String::new(),
    };
    let message = if expected.is_empty() {
        format!("unexpected input at column {}", column)
    } else {
        format!("{} at column {}", expected, column)
    };
    RdfError::syntax(line_no, message)
}

fn expected(description: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(description))
}

/// One line: a statement, or nothing but whitespace and a comment.
fn statement(input: &mut &str) -> ModalResult<Option<Quad>> {
    space0.parse_next(input)?;
    if input.is_empty() || input.starts_with('#') {
        *input = "";
        return Ok(None);
    }

    let subject = alt((iri, blank_node))
        .context(expected("subject"))
        .parse_next(input)?;
    space0.parse_next(input)?;
    let predicate = iri.context(expected("predicate IRI")).parse_next(input)?;
    space0.parse_next(input)?;
    let object = alt((iri, blank_node, literal))
        .context(expected("object"))
        .parse_next(input)?;
    space0.parse_next(input)?;
    let graph = opt(alt((iri, blank_node))).parse_next(input)?;
    space0.parse_next(input)?;
    '.'.context(expected("'.'")).parse_next(input)?;
    space0.parse_next(input)?;
    if !input.is_empty() && !input.starts_with('#') {
        return Err(ErrMode::Cut(ContextError::new()));
    }
    *input = "";

    Ok(Some(Quad::new(subject, predicate, object, graph)))
}

fn iri(input: &mut &str) -> ModalResult<Term> {
    delimited('<', iri_content, '>')
        .map(Term::Iri)
        .parse_next(input)
}

fn iri_content(input: &mut &str) -> ModalResult<String> {
    let mut result = String::new();
    loop {
        let chunk = take_while(0.., |c: char| {
            !matches!(c, '>' | '\\' | '<' | '"' | '{' | '}' | '|' | '^' | '`') && c > ' '
        })
        .parse_next(input)?;
        result.push_str(chunk);
        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            result.push(unicode_escape(input)?);
        } else {
            return Ok(result);
        }
    }
}

fn blank_node(input: &mut &str) -> ModalResult<Term> {
    preceded(
        "_:",
        take_while(1.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
        }),
    )
    .verify(|label: &str| !label.ends_with('.'))
    .map(|label: &str| Term::Blank(format!("_:{}", label)))
    .parse_next(input)
}

fn literal(input: &mut &str) -> ModalResult<Term> {
    let lexical = delimited('"', string_content, '"').parse_next(input)?;
    if input.starts_with('@') {
        let language = preceded(
            '@',
            take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-'),
        )
        .parse_next(input)?;
        return Ok(Term::Literal(Literal {
            lexical,
            datatype: rdf::LANG_STRING.to_string(),
            language: Some(language.to_string()),
        }));
    }
    let datatype = opt(preceded("^^", iri)).parse_next(input)?;
    let datatype = match datatype {
        Some(Term::Iri(iri)) => iri,
        _ => xsd::STRING.to_string(),
    };
    Ok(Term::Literal(Literal::typed(lexical, datatype)))
}

fn string_content(input: &mut &str) -> ModalResult<String> {
    let mut result = String::new();
    loop {
        let chunk = take_while(0.., |c: char| !matches!(c, '"' | '\\' | '\n' | '\r'))
            .parse_next(input)?;
        result.push_str(chunk);
        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            result.push(escape_char(input)?);
        } else {
            return Ok(result);
        }
    }
}

fn escape_char(input: &mut &str) -> ModalResult<char> {
    if input.starts_with(['u', 'U']) {
        return unicode_escape(input);
    }
    let c: char = any.parse_next(input)?;
    match c {
        't' => Ok('\t'),
        'b' => Ok('\x08'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        'f' => Ok('\x0C'),
        '"' => Ok('"'),
        '\'' => Ok('\''),
        '\\' => Ok('\\'),
        _ => Err(ErrMode::Backtrack(ContextError::new())),
    }
}

/// `uXXXX` or `UXXXXXXXX`, after the backslash.
fn unicode_escape(input: &mut &str) -> ModalResult<char> {
    let width = match any.parse_next(input)? {
        'u' => 4,
        'U' => 8,
        _ => return Err(ErrMode::Backtrack(ContextError::new())),
    };
    let hex = take_while(width..=width, AsChar::is_hex_digit).parse_next(input)?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| ErrMode::Backtrack(ContextError::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_statements() {
        let input = r#"
# a comment
<http://ex/s> <http://ex/p> "plain" .
<http://ex/s> <http://ex/p> "hallo"@de-AT <http://ex/g> .
_:b0 <http://ex/p> "5"^^<http://www.w3.org/2001/XMLSchema#integer> . # trailing
<http://ex/s> <http://ex/q> _:b0 .
"#;
        let dataset = parse_nquads(input).unwrap();
        assert_eq!(dataset.len(), 4);
        assert!(dataset.iter().any(|q| q.object
            == Term::Literal(Literal::lang_string("hallo", "de-AT"))
            && q.graph == Some(Term::iri("http://ex/g"))));
        assert!(dataset
            .iter()
            .any(|q| q.subject == Term::blank("b0")
                && q.object == Term::Literal(Literal::typed("5", xsd::INTEGER))));
    }

    #[test]
    fn test_escapes() {
        let dataset =
            parse_nquads(r#"<http://ex/sA> <http://ex/p> "a\"b\\c\ndé" ."#).unwrap();
        let quad = &dataset.quads()[0];
        assert_eq!(quad.subject, Term::iri("http://ex/sA"));
        assert_eq!(quad.object, Term::string("a\"b\\c\nd\u{e9}"));
    }

    #[test]
    fn test_duplicates_removed() {
        let line = "<http://ex/s> <http://ex/p> <http://ex/o> .\n";
        let dataset = parse_nquads(&line.repeat(3)).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let input = "<http://ex/s> <http://ex/p> <http://ex/o> .\n<http://ex/s> \"lit\" <http://ex/o> .\n";
        match parse_nquads(input) {
            Err(RdfError::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {:?}", other),
        }

        let missing_dot = parse_nquads("<http://ex/s> <http://ex/p> <http://ex/o>").unwrap_err();
        assert!(matches!(missing_dot, RdfError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_serialize_round_trip() {
        let input = "<http://ex/s> <http://ex/p> \"x\\ny\" .\n_:b0 <http://ex/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> <http://ex/g> .\n";
        let dataset = parse_nquads(input).unwrap();
        let output = to_nquads(&dataset);
        assert_eq!(
            output,
            "<http://ex/s> <http://ex/p> \"x\\ny\" .\n_:b0 <http://ex/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> <http://ex/g> .\n"
        );
    }
}
