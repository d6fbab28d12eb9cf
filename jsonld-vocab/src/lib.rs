//! Keyword and vocabulary constants for JSON-LD processing
//!
//! Constants are organized by vocabulary:
//! - `keywords` - JSON-LD 1.1 keywords and keyword predicates
//! - `rdf` - RDF vocabulary (http://www.w3.org/1999/02/22-rdf-syntax-ns#)
//! - `xsd` - XSD vocabulary (http://www.w3.org/2001/XMLSchema#)
//! - `i18n` - base of the `i18n-datatype` direction encoding
//! - `media` - media types used by document loaders and format registries

/// JSON-LD keywords
pub mod keywords {
    pub const ANY: &str = "@any";
    pub const BASE: &str = "@base";
    pub const CONTAINER: &str = "@container";
    pub const CONTEXT: &str = "@context";
    pub const DEFAULT: &str = "@default";
    pub const DIRECTION: &str = "@direction";
    pub const EMBED: &str = "@embed";
    pub const EXPLICIT: &str = "@explicit";
    pub const GRAPH: &str = "@graph";
    pub const ID: &str = "@id";
    pub const IMPORT: &str = "@import";
    pub const INCLUDED: &str = "@included";
    pub const INDEX: &str = "@index";
    pub const JSON: &str = "@json";
    pub const LANGUAGE: &str = "@language";
    pub const LIST: &str = "@list";
    pub const NEST: &str = "@nest";
    pub const NONE: &str = "@none";
    pub const NULL: &str = "@null";
    pub const OMIT_DEFAULT: &str = "@omitDefault";
    pub const PREFIX: &str = "@prefix";
    pub const PRESERVE: &str = "@preserve";
    pub const PROPAGATE: &str = "@propagate";
    pub const PROTECTED: &str = "@protected";
    pub const REQUIRE_ALL: &str = "@requireAll";
    pub const REVERSE: &str = "@reverse";
    pub const SET: &str = "@set";
    pub const TYPE: &str = "@type";
    pub const VALUE: &str = "@value";
    pub const VERSION: &str = "@version";
    pub const VOCAB: &str = "@vocab";

    /// Every keyword the expansion and context algorithms recognize.
    pub const ALL: &[&str] = &[
        BASE, CONTAINER, CONTEXT, DEFAULT, DIRECTION, EMBED, EXPLICIT, GRAPH, ID, IMPORT,
        INCLUDED, INDEX, JSON, LANGUAGE, LIST, NEST, NONE, OMIT_DEFAULT, PREFIX, PRESERVE,
        PROPAGATE, PROTECTED, REQUIRE_ALL, REVERSE, SET, TYPE, VALUE, VERSION, VOCAB,
    ];

    /// Returns true for a JSON-LD keyword.
    pub fn is_keyword(s: &str) -> bool {
        s.starts_with('@') && ALL.contains(&s)
    }

    /// Returns true for strings of the form `@` followed by one or more ASCII
    /// letters. Such strings are reserved and are ignored when they are not
    /// keywords.
    pub fn looks_like_keyword(s: &str) -> bool {
        s.len() > 1
            && s.starts_with('@')
            && s[1..].bytes().all(|b| b.is_ascii_alphabetic())
    }
}

/// RDF vocabulary constants
pub mod rdf {
    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    /// rdf:langString IRI
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

    /// rdf:JSON IRI
    pub const JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";

    /// rdf:first IRI (RDF list head)
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";

    /// rdf:rest IRI (RDF list tail)
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";

    /// rdf:nil IRI (RDF list terminator)
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

    /// rdf:List IRI
    pub const LIST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#List";

    /// rdf:value IRI
    pub const VALUE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#value";
}

/// XSD vocabulary constants
pub mod xsd {
    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:boolean IRI
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:double IRI
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
}

/// Datatype base for literals carrying a base direction
/// (`rdfDirection: i18n-datatype`).
pub mod i18n {
    pub const BASE: &str = "https://www.w3.org/ns/i18n#";
}

/// Media types
pub mod media {
    pub const JSON_LD: &str = "application/ld+json";
    pub const JSON: &str = "application/json";
    pub const N_QUADS: &str = "application/n-quads";

    /// `rel` value of an HTTP `Link` header that names a JSON-LD context.
    pub const CONTEXT_LINK_REL: &str = "http://www.w3.org/ns/json-ld#context";
}

#[cfg(test)]
mod tests {
    use super::keywords::*;

    #[test]
    fn test_keyword_predicates() {
        assert!(is_keyword("@id"));
        assert!(is_keyword("@nest"));
        assert!(!is_keyword("@ignoreMe"));
        assert!(!is_keyword("id"));

        assert!(looks_like_keyword("@ignoreMe"));
        assert!(!looks_like_keyword("@"));
        assert!(!looks_like_keyword("@foo.bar"));
        assert!(!looks_like_keyword("foo"));
    }
}
