//! Active contexts and the context processing algorithm.
//!
//! An [`ActiveContext`] is an immutable snapshot: processing a local context
//! never mutates its input, it returns a new context. Non-propagated
//! (type-scoped) contexts keep a pointer to the context they replaced so
//! that nested node objects can revert to it.

mod inverse;
mod process;
mod term;

pub use inverse::InverseContext;
pub use process::MAX_CONTEXT_RECURSION;
pub(crate) use process::ContextProcessor;
pub use term::{Container, TermDefinition, TypeMapping};

use crate::error::Result;
use crate::iri;
use crate::model::Direction;
use crate::options::{JsonLdOptions, ProcessingMode};
use jsonld_vocab::keywords::{is_keyword, looks_like_keyword};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Where a scoped context comes from.
///
/// Property-scoped contexts may redefine protected terms. Type-scoped
/// contexts do not propagate into nested node objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Property,
    Type,
}

#[derive(Debug)]
pub struct ActiveContext {
    pub(crate) base: Option<String>,
    pub(crate) original_base: Option<String>,
    pub(crate) vocab: Option<String>,
    pub(crate) default_language: Option<String>,
    pub(crate) default_direction: Option<Direction>,
    pub(crate) processing_mode: ProcessingMode,
    pub(crate) terms: HashMap<String, TermDefinition>,
    pub(crate) previous: Option<Arc<ActiveContext>>,
    inverse: OnceLock<InverseContext>,
}

// The inverse context is derived data; a clone starts without it because
// clones are made in order to be modified.
impl Clone for ActiveContext {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            original_base: self.original_base.clone(),
            vocab: self.vocab.clone(),
            default_language: self.default_language.clone(),
            default_direction: self.default_direction,
            processing_mode: self.processing_mode,
            terms: self.terms.clone(),
            previous: self.previous.clone(),
            inverse: OnceLock::new(),
        }
    }
}

impl Default for ActiveContext {
    fn default() -> Self {
        Self::new(None, ProcessingMode::default())
    }
}

impl ActiveContext {
    /// An empty context whose base IRI is `base`.
    pub fn new(base: Option<String>, processing_mode: ProcessingMode) -> Self {
        Self {
            base: base.clone(),
            original_base: base,
            vocab: None,
            default_language: None,
            default_direction: None,
            processing_mode,
            terms: HashMap::new(),
            previous: None,
            inverse: OnceLock::new(),
        }
    }

    /// Initial context for a call: base from the options, falling back to the
    /// document URL.
    pub fn for_options(options: &JsonLdOptions, document_url: Option<&str>) -> Self {
        let base = options.base.clone().or_else(|| document_url.map(str::to_string));
        Self::new(base, options.processing_mode)
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    pub fn default_language(&self) -> Option<&str> {
        self.default_language.as_deref()
    }

    pub fn default_direction(&self) -> Option<Direction> {
        self.default_direction
    }

    pub fn processing_mode(&self) -> ProcessingMode {
        self.processing_mode
    }

    pub fn is_json_ld_10(&self) -> bool {
        self.processing_mode == ProcessingMode::JsonLd10
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermDefinition)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Context to revert to for nested node objects, if this one was not
    /// propagated.
    pub fn previous(&self) -> Option<&ActiveContext> {
        self.previous.as_deref()
    }

    pub fn has_protected_terms(&self) -> bool {
        self.terms.values().any(|def| def.protected)
    }

    /// Containers of `term`; empty for undefined terms.
    pub(crate) fn has_container(&self, term: Option<&str>, container: Container) -> bool {
        term.and_then(|t| self.terms.get(t))
            .is_some_and(|def| def.has_container(container))
    }

    pub(crate) fn type_mapping(&self, term: Option<&str>) -> Option<&TypeMapping> {
        term.and_then(|t| self.terms.get(t))
            .and_then(|def| def.type_mapping.as_ref())
    }

    /// Language mapping of `term`, falling back to the default language.
    pub(crate) fn language_for(&self, term: Option<&str>) -> Option<&str> {
        match term.and_then(|t| self.terms.get(t)).and_then(|d| d.language.as_ref()) {
            Some(explicit) => explicit.as_deref(),
            None => self.default_language.as_deref(),
        }
    }

    /// Direction mapping of `term`, falling back to the default direction.
    pub(crate) fn direction_for(&self, term: Option<&str>) -> Option<Direction> {
        match term.and_then(|t| self.terms.get(t)).and_then(|d| d.direction.as_ref()) {
            Some(explicit) => *explicit,
            None => self.default_direction,
        }
    }

    /// IRI expansion.
    ///
    /// `vocab` selects vocabulary-relative expansion (property names, types);
    /// `document_relative` resolves remaining relative references against
    /// the base IRI. Returns None for null-mapped terms and for reserved
    /// keyword-like strings.
    pub fn expand_iri(&self, value: &str, document_relative: bool, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if looks_like_keyword(value) {
            tracing::warn!(value, "ignoring reserved keyword-like value");
            return None;
        }

        if let Some(def) = self.terms.get(value) {
            if def.iri.as_deref().is_some_and(is_keyword) {
                return def.iri.clone();
            }
            if vocab {
                return def.iri.clone();
            }
        }

        if let Some(colon) = value.find(':').filter(|&i| i > 0) {
            let (prefix, suffix) = (&value[..colon], &value[colon + 1..]);
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(def) = self.terms.get(prefix) {
                if let (Some(prefix_iri), true) = (&def.iri, def.prefix) {
                    return Some(format!("{}{}", prefix_iri, suffix));
                }
            }
            if iri::is_absolute(value) {
                return Some(value.to_string());
            }
        }

        if vocab {
            if let Some(v) = &self.vocab {
                return Some(format!("{}{}", v, value));
            }
        }
        if document_relative {
            return Some(iri::resolve(self.base.as_deref(), value));
        }
        Some(value.to_string())
    }

    /// Inverse context used for term selection; computed on first use.
    pub fn inverse(&self) -> &InverseContext {
        self.inverse.get_or_init(|| InverseContext::build(self))
    }

    /// Process `local` on top of this context.
    ///
    /// `base_url` is the URL of the document the local context came from;
    /// remote context references are resolved against it.
    pub fn process(
        &self,
        local: &JsonValue,
        base_url: Option<&str>,
        options: &JsonLdOptions,
    ) -> Result<ActiveContext> {
        ContextProcessor::new(options).process_context(self, local, base_url)
    }

    /// Apply the scoped context carried by `def`, if it has one.
    pub(crate) fn apply_scoped(
        &self,
        def: &TermDefinition,
        scope: Scope,
        options: &JsonLdOptions,
    ) -> Result<Option<ActiveContext>> {
        let Some(scoped) = &def.context else {
            return Ok(None);
        };
        tracing::trace!(?scope, "applying scoped context");
        let (override_protected, propagate) = match scope {
            Scope::Property => (true, true),
            Scope::Type => (false, false),
        };
        ContextProcessor::new(options)
            .process_scoped(self, scoped, def.base_url.as_deref(), override_protected, propagate)
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(local: JsonValue) -> ActiveContext {
        ActiveContext::new(Some("http://example.com/doc".to_string()), ProcessingMode::JsonLd11)
            .process(&local, None, &JsonLdOptions::default())
            .unwrap()
    }

    #[test]
    fn test_expand_iri_terms_and_prefixes() {
        let active = ctx(json!({
            "schema": "http://schema.org/",
            "name": "schema:name",
            "@vocab": "http://vocab.example/"
        }));

        assert_eq!(active.expand_iri("name", false, true).as_deref(), Some("http://schema.org/name"));
        assert_eq!(
            active.expand_iri("schema:Person", false, true).as_deref(),
            Some("http://schema.org/Person")
        );
        assert_eq!(
            active.expand_iri("other", false, true).as_deref(),
            Some("http://vocab.example/other")
        );
        assert_eq!(
            active.expand_iri("other", true, false).as_deref(),
            Some("http://example.com/other")
        );
        assert_eq!(active.expand_iri("_:b0", true, true).as_deref(), Some("_:b0"));
        assert_eq!(active.expand_iri("@type", false, true).as_deref(), Some("@type"));
        assert_eq!(active.expand_iri("@ignored", false, true), None);
    }

    #[test]
    fn test_clone_drops_inverse() {
        let active = ctx(json!({"name": "http://schema.org/name"}));
        let _ = active.inverse();
        let copy = active.clone();
        assert!(copy.inverse.get().is_none());
        assert_eq!(copy.term("name"), active.term("name"));
    }
}
