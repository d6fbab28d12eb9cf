//! HTTP `Link` header parsing (RFC 8288)

use std::collections::HashMap;

/// One link-value: target IRI plus its parameters (`rel`, `type`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub params: HashMap<String, String>,
}

impl Link {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// True when `rel` lists `relation` (space separated).
    pub fn has_rel(&self, relation: &str) -> bool {
        self.param("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r == relation))
    }
}

/// Parse a `Link` header value into its link-values.
///
/// Malformed link-values are skipped.
pub fn parse_link_header(header: &str) -> Vec<Link> {
    split_outside_quotes(header, ',')
        .into_iter()
        .filter_map(parse_link_value)
        .collect()
}

fn parse_link_value(value: &str) -> Option<Link> {
    let value = value.trim();
    let rest = value.strip_prefix('<')?;
    let (target, params) = rest.split_once('>')?;

    let mut map = HashMap::new();
    for param in split_outside_quotes(params, ';') {
        let Some((name, raw)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(raw);
        map.entry(name).or_insert_with(|| unquoted.to_string());
    }

    Some(Link {
        target: target.trim().to_string(),
        params: map,
    })
}

fn split_outside_quotes(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut in_target = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_target = true,
            '>' if !in_quotes => in_target = false,
            c if c == separator && !in_quotes && !in_target => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_link() {
        let links = parse_link_header(
            r#"<https://example.org/ctx.jsonld>; rel="http://www.w3.org/ns/json-ld#context"; type="application/ld+json""#,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "https://example.org/ctx.jsonld");
        assert!(links[0].has_rel("http://www.w3.org/ns/json-ld#context"));
        assert_eq!(links[0].param("type"), Some("application/ld+json"));
    }

    #[test]
    fn test_multiple_links_and_quoted_separators() {
        let links = parse_link_header(
            r#"<a.jsonld>; rel="alternate"; type="application/ld+json", <b;c,d>; title="x, y; z"; rel=next"#,
        );
        assert_eq!(links.len(), 2);
        assert!(links[0].has_rel("alternate"));
        assert_eq!(links[1].target, "b;c,d");
        assert_eq!(links[1].param("title"), Some("x, y; z"));
        assert!(links[1].has_rel("next"));
    }

    #[test]
    fn test_malformed_values_skipped() {
        assert!(parse_link_header("no-angle-brackets; rel=x").is_empty());
    }
}
