//! IRI helpers: compact IRI splitting, absolute/blank checks, RFC 3986
//! reference resolution and the inverse (relative IRI computation).

use std::collections::VecDeque;

/// Split a compact IRI like "schema:name" into (prefix, suffix).
///
/// Returns None when there is no colon, the prefix is empty, or the
/// suffix starts with `//` (an absolute IRI such as `http://...`).
pub fn parse_prefix(s: &str) -> Option<(&str, &str)> {
    let colon_pos = s.find(':')?;
    let prefix = &s[..colon_pos];
    let suffix = &s[colon_pos + 1..];

    if prefix.is_empty() || suffix.starts_with("//") {
        return None;
    }
    Some((prefix, suffix))
}

/// Returns true if the IRI is absolute (has an RFC 3986 scheme).
///
/// An absolute IRI starts with a scheme: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
pub fn is_absolute(iri: &str) -> bool {
    scheme_len(iri).is_some()
}

/// Returns true for blank node identifiers (`_:label`).
pub fn is_blank(s: &str) -> bool {
    s.starts_with("_:")
}

/// Returns true if the IRI ends with an RFC 3986 gen-delim character.
pub fn ends_with_gen_delim(iri: &str) -> bool {
    matches!(
        iri.chars().last(),
        Some(':' | '/' | '?' | '#' | '[' | ']' | '@')
    )
}

fn scheme_len(iri: &str) -> Option<usize> {
    let colon_pos = iri.find(':')?;
    let scheme = &iri[..colon_pos];
    let valid = !scheme.is_empty()
        && scheme.as_bytes()[0].is_ascii_alphabetic()
        && scheme
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.');
    valid.then_some(colon_pos)
}

/// The five RFC 3986 components of an IRI reference.
#[derive(Debug, Default, PartialEq)]
struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

fn split(iri: &str) -> Parts<'_> {
    let (rest, fragment) = match iri.find('#') {
        Some(i) => (&iri[..i], Some(&iri[i + 1..])),
        None => (iri, None),
    };
    let (rest, query) = match rest.find('?') {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let (scheme, rest) = match scheme_len(rest) {
        Some(len) => (Some(&rest[..len]), &rest[len + 1..]),
        None => (None, rest),
    };
    let (authority, path) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after.find('/').unwrap_or(after.len());
            (Some(&after[..end]), &after[end..])
        }
        None => (None, rest),
    };
    Parts {
        scheme,
        authority,
        path,
        query,
        fragment,
    }
}

fn recompose(
    scheme: Option<&str>,
    authority: Option<&str>,
    path: &str,
    query: Option<&str>,
    fragment: Option<&str>,
) -> String {
    let mut out = String::with_capacity(path.len() + 32);
    if let Some(scheme) = scheme {
        out.push_str(scheme);
        out.push(':');
    }
    if let Some(authority) = authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.push_str(path);
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// RFC 3986 section 5.2.4.
pub fn remove_dot_segments(path: &str) -> String {
    fn pop_segment(out: &mut String) {
        match out.rfind('/') {
            Some(i) => out.truncate(i),
            None => out.clear(),
        }
    }

    let mut input = path.to_string();
    let mut out = String::with_capacity(path.len());
    while !input.is_empty() {
        if input.starts_with("../") {
            input.drain(..3);
        } else if input.starts_with("./") {
            input.drain(..2);
        } else if input.starts_with("/./") {
            input.replace_range(..3, "/");
        } else if input == "/." {
            input = "/".to_string();
        } else if input.starts_with("/../") {
            input.replace_range(..4, "/");
            pop_segment(&mut out);
        } else if input == "/.." {
            input = "/".to_string();
            pop_segment(&mut out);
        } else if input == "." || input == ".." {
            input.clear();
        } else {
            let start = usize::from(input.starts_with('/'));
            let end = input[start..]
                .find('/')
                .map(|i| i + start)
                .unwrap_or(input.len());
            out.push_str(&input[..end]);
            input.drain(..end);
        }
    }
    out
}

/// Resolve `reference` against `base` (RFC 3986 section 5.2.2).
///
/// Without a base the reference is returned unchanged.
pub fn resolve(base: Option<&str>, reference: &str) -> String {
    let Some(base) = base else {
        return reference.to_string();
    };
    let r = split(reference);
    if r.scheme.is_some() {
        return recompose(
            r.scheme,
            r.authority,
            &remove_dot_segments(r.path),
            r.query,
            r.fragment,
        );
    }

    let b = split(base);
    let (authority, path, query) = if r.authority.is_some() {
        (r.authority, remove_dot_segments(r.path), r.query)
    } else if r.path.is_empty() {
        (b.authority, b.path.to_string(), r.query.or(b.query))
    } else if r.path.starts_with('/') {
        (b.authority, remove_dot_segments(r.path), r.query)
    } else {
        let merged = if b.authority.is_some() && b.path.is_empty() {
            format!("/{}", r.path)
        } else {
            match b.path.rfind('/') {
                Some(i) => format!("{}{}", &b.path[..=i], r.path),
                None => r.path.to_string(),
            }
        };
        (b.authority, remove_dot_segments(&merged), r.query)
    };
    recompose(b.scheme, authority, &path, query, r.fragment)
}

/// Express `iri` relative to `base`, or return it unchanged when it does not
/// share the base's scheme and authority.
pub fn relativize(base: &str, iri: &str) -> String {
    let b = split(base);
    let root = if base.is_empty() {
        String::new()
    } else {
        format!(
            "{}//{}",
            b.scheme.map(|s| format!("{}:", s)).unwrap_or_default(),
            b.authority.unwrap_or("")
        )
    };
    let Some(remainder) = iri.strip_prefix(root.as_str()) else {
        return iri.to_string();
    };
    let rel = split(remainder);

    let base_path = remove_dot_segments(b.path);
    let rel_path = remove_dot_segments(rel.path);
    let mut base_segments: VecDeque<&str> = base_path.split('/').collect();
    let mut iri_segments: VecDeque<&str> = rel_path.split('/').collect();

    // the last segment is kept unless a query or fragment follows it
    let last = usize::from(rel.fragment.is_none() && rel.query.is_none());
    while !base_segments.is_empty() && iri_segments.len() > last {
        if base_segments[0] != iri_segments[0] {
            break;
        }
        base_segments.pop_front();
        iri_segments.pop_front();
    }

    let mut out = String::new();
    if !base_segments.is_empty() {
        base_segments.pop_back();
        for _ in &base_segments {
            out.push_str("../");
        }
    }
    out.push_str(&Vec::from(iri_segments).join("/"));
    if let Some(query) = rel.query {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = rel.fragment {
        out.push('#');
        out.push_str(fragment);
    }
    if out.is_empty() {
        out.push_str("./");
    }
    out
}
