use super::term::{Container, TermDefinition, TypeMapping};
use super::ActiveContext;
use crate::error::{ErrorKind, JsonLdError, Result};
use crate::iri;
use crate::loader::LoadOptions;
use crate::model::Direction;
use crate::options::{JsonLdOptions, ProcessingMode};
use jsonld_vocab::keywords::{self as kw, is_keyword, looks_like_keyword};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Maximum nesting of remote context references.
pub const MAX_CONTEXT_RECURSION: usize = 16;

/// Context entries that are not term definitions.
const CONTEXT_KEYWORDS: &[&str] = &[
    kw::BASE,
    kw::DIRECTION,
    kw::IMPORT,
    kw::LANGUAGE,
    kw::PROPAGATE,
    kw::PROTECTED,
    kw::VERSION,
    kw::VOCAB,
];

/// Keys allowed in an expanded term definition.
const TERM_DEFINITION_KEYS: &[&str] = &[
    kw::CONTAINER,
    kw::CONTEXT,
    kw::DIRECTION,
    kw::ID,
    kw::INDEX,
    kw::LANGUAGE,
    kw::NEST,
    kw::PREFIX,
    kw::PROTECTED,
    kw::REVERSE,
    kw::TYPE,
];

fn err(kind: ErrorKind, message: impl Into<String>) -> JsonLdError {
    JsonLdError::context(kind, message)
}

/// Flags of one context processing run.
#[derive(Debug, Clone, Copy)]
struct Flags {
    override_protected: bool,
    propagate: bool,
    validate_scoped: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            override_protected: false,
            propagate: true,
            validate_scoped: true,
        }
    }
}

pub(crate) struct ContextProcessor<'a> {
    options: &'a JsonLdOptions,
}

impl<'a> ContextProcessor<'a> {
    pub(crate) fn new(options: &'a JsonLdOptions) -> Self {
        Self { options }
    }

    /// Process a local context found in a document.
    pub(crate) fn process_context(
        &self,
        active: &ActiveContext,
        local: &JsonValue,
        base_url: Option<&str>,
    ) -> Result<ActiveContext> {
        let base_url = base_url.or(active.original_base.as_deref());
        self.process(active, local, base_url, &mut Vec::new(), Flags::default())
    }

    /// Process a term's scoped context.
    pub(crate) fn process_scoped(
        &self,
        active: &ActiveContext,
        local: &JsonValue,
        base_url: Option<&str>,
        override_protected: bool,
        propagate: bool,
    ) -> Result<ActiveContext> {
        let flags = Flags {
            override_protected,
            propagate,
            validate_scoped: true,
        };
        self.process(active, local, base_url, &mut Vec::new(), flags)
    }

    fn process(
        &self,
        active: &ActiveContext,
        local: &JsonValue,
        base_url: Option<&str>,
        remote: &mut Vec<String>,
        mut flags: Flags,
    ) -> Result<ActiveContext> {
        let mut result = active.clone();

        if let Some(propagate) = local.as_object().and_then(|m| m.get(kw::PROPAGATE)) {
            flags.propagate = propagate.as_bool().ok_or_else(|| {
                err(ErrorKind::InvalidPropagateValue, "@propagate must be a boolean")
                    .with_value(propagate)
            })?;
        }
        if !flags.propagate && result.previous.is_none() {
            result.previous = Some(Arc::new(active.clone()));
        }

        let contexts: Vec<&JsonValue> = match local {
            JsonValue::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        for context in contexts {
            match context {
                JsonValue::Null => {
                    if !flags.override_protected && result.has_protected_terms() {
                        return Err(err(
                            ErrorKind::InvalidContextNullification,
                            "cannot nullify a context that contains protected terms",
                        ));
                    }
                    let mut fresh =
                        ActiveContext::new(active.original_base.clone(), result.processing_mode);
                    if !flags.propagate {
                        fresh.previous = Some(Arc::new(result.clone()));
                    }
                    result = fresh;
                }
                JsonValue::String(reference) => {
                    let url = iri::resolve(base_url, reference);
                    if remote.contains(&url) {
                        if !flags.validate_scoped {
                            continue;
                        }
                        return Err(err(
                            ErrorKind::RecursiveContextInclusion,
                            format!("context <{}> includes itself", url),
                        ));
                    }
                    if remote.len() >= MAX_CONTEXT_RECURSION {
                        return Err(err(
                            ErrorKind::ContextOverflow,
                            format!("more than {} nested remote contexts", MAX_CONTEXT_RECURSION),
                        ));
                    }
                    let (document_url, loaded) = self.load_context(&url)?;
                    remote.push(url);
                    let nested = Flags {
                        override_protected: false,
                        propagate: true,
                        validate_scoped: flags.validate_scoped,
                    };
                    let processed =
                        self.process(&result, &loaded, Some(&document_url), remote, nested);
                    remote.pop();
                    result = processed?;
                }
                JsonValue::Object(definition) => {
                    self.process_definition(&mut result, definition, base_url, remote, flags)?;
                }
                other => {
                    return Err(err(
                        ErrorKind::InvalidLocalContext,
                        "a local context must be an object, a string, null or an array",
                    )
                    .with_value(other));
                }
            }
        }

        Ok(result)
    }

    /// Fetch a remote context; returns the final document URL and the value
    /// of its `@context` entry.
    fn load_context(&self, url: &str) -> Result<(String, JsonValue)> {
        let loader = self.options.document_loader().ok_or_else(|| {
            JsonLdError::loader(
                ErrorKind::LoadingRemoteContextFailed,
                url,
                "no document loader is configured",
            )
        })?;
        tracing::debug!(url, "loading remote context");
        let remote = loader.load(url, &LoadOptions::context()).map_err(|e| {
            JsonLdError::loader(ErrorKind::LoadingRemoteContextFailed, url, e.to_string())
        })?;
        let context = remote
            .document
            .as_object()
            .and_then(|doc| doc.get(kw::CONTEXT))
            .cloned()
            .ok_or_else(|| {
                err(
                    ErrorKind::InvalidRemoteContext,
                    format!("<{}> has no top-level @context", url),
                )
            })?;
        Ok((remote.document_url, context))
    }

    fn process_definition(
        &self,
        result: &mut ActiveContext,
        definition: &Map<String, JsonValue>,
        base_url: Option<&str>,
        remote: &mut Vec<String>,
        flags: Flags,
    ) -> Result<()> {
        if let Some(version) = definition.get(kw::VERSION) {
            if version.as_f64() != Some(1.1) {
                return Err(err(ErrorKind::InvalidVersionValue, "@version must be 1.1")
                    .with_value(version));
            }
            if result.is_json_ld_10() {
                return Err(err(
                    ErrorKind::ProcessingModeConflict,
                    "@version 1.1 used in json-ld-1.0 mode",
                ));
            }
        }

        let imported;
        let definition = match definition.get(kw::IMPORT) {
            Some(import) => {
                imported = self.import(result, definition, import, base_url)?;
                &imported
            }
            None => definition,
        };

        if let Some(base) = definition.get(kw::BASE) {
            if remote.is_empty() {
                result.base = match base {
                    JsonValue::Null => None,
                    JsonValue::String(s) if iri::is_absolute(s) => Some(s.clone()),
                    JsonValue::String(s) if result.base.is_some() => {
                        Some(iri::resolve(result.base.as_deref(), s))
                    }
                    other => {
                        return Err(err(ErrorKind::InvalidBaseIri, "invalid @base value")
                            .with_value(other))
                    }
                };
            }
        }

        if let Some(vocab) = definition.get(kw::VOCAB) {
            result.vocab = match vocab {
                JsonValue::Null => None,
                JsonValue::String(s)
                    if iri::is_absolute(s) || iri::is_blank(s) || !result.is_json_ld_10() =>
                {
                    result.expand_iri(s, true, true)
                }
                other => {
                    return Err(err(
                        ErrorKind::InvalidVocabMapping,
                        "@vocab must be an IRI or blank node identifier",
                    )
                    .with_value(other))
                }
            };
        }

        if let Some(language) = definition.get(kw::LANGUAGE) {
            result.default_language = match language {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.to_lowercase()),
                other => {
                    return Err(err(ErrorKind::InvalidDefaultLanguage, "@language must be a string")
                        .with_value(other))
                }
            };
        }

        if let Some(direction) = definition.get(kw::DIRECTION) {
            if result.is_json_ld_10() {
                return Err(err(ErrorKind::InvalidContextEntry, "@direction requires json-ld-1.1"));
            }
            result.default_direction = match direction {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(Direction::parse(s).ok_or_else(|| {
                    err(ErrorKind::InvalidBaseDirection, "@direction must be ltr or rtl")
                        .with_value(direction)
                })?),
                other => {
                    return Err(err(ErrorKind::InvalidBaseDirection, "@direction must be a string")
                        .with_value(other))
                }
            };
        }

        if definition.contains_key(kw::PROPAGATE) && result.is_json_ld_10() {
            return Err(err(ErrorKind::InvalidContextEntry, "@propagate requires json-ld-1.1"));
        }

        let protected = match definition.get(kw::PROTECTED) {
            None => false,
            Some(JsonValue::Bool(b)) => *b,
            Some(other) => {
                return Err(err(ErrorKind::InvalidProtectedValue, "@protected must be a boolean")
                    .with_value(other))
            }
        };

        let mut creator = TermCreator {
            processor: self,
            result,
            local: definition,
            defined: HashMap::new(),
            base_url,
            remote,
            override_protected: flags.override_protected,
            protected,
        };
        for term in definition.keys() {
            if CONTEXT_KEYWORDS.contains(&term.as_str()) {
                continue;
            }
            creator.create(term)?;
        }
        Ok(())
    }

    /// Merge the context named by `@import` under `definition`.
    fn import(
        &self,
        result: &ActiveContext,
        definition: &Map<String, JsonValue>,
        import: &JsonValue,
        base_url: Option<&str>,
    ) -> Result<Map<String, JsonValue>> {
        if result.is_json_ld_10() {
            return Err(err(ErrorKind::InvalidContextEntry, "@import requires json-ld-1.1"));
        }
        let reference = import.as_str().ok_or_else(|| {
            err(ErrorKind::InvalidImportValue, "@import must be a string").with_value(import)
        })?;
        let url = iri::resolve(base_url, reference);
        let (_, loaded) = self.load_context(&url)?;
        let JsonValue::Object(imported) = loaded else {
            return Err(err(
                ErrorKind::InvalidRemoteContext,
                format!("imported context <{}> must be an object", url),
            ));
        };
        if imported.contains_key(kw::IMPORT) {
            return Err(err(
                ErrorKind::InvalidContextEntry,
                format!("imported context <{}> must not contain @import", url),
            ));
        }
        let mut merged = imported;
        for (key, value) in definition {
            merged.insert(key.clone(), value.clone());
        }
        Ok(merged)
    }
}

/// State of the create-term-definition recursion over one local context.
struct TermCreator<'p, 'c> {
    processor: &'p ContextProcessor<'p>,
    result: &'c mut ActiveContext,
    local: &'c Map<String, JsonValue>,
    /// false while a term is being defined, true once done.
    defined: HashMap<String, bool>,
    base_url: Option<&'c str>,
    remote: &'c mut Vec<String>,
    override_protected: bool,
    /// Default protection from the context's `@protected` entry.
    protected: bool,
}

impl TermCreator<'_, '_> {
    fn is_json_ld_10(&self) -> bool {
        self.result.processing_mode == ProcessingMode::JsonLd10
    }

    fn create(&mut self, term: &str) -> Result<()> {
        match self.defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(err(
                    ErrorKind::CyclicIriMapping,
                    format!("term '{}' is defined in terms of itself", term),
                ))
            }
            None => {}
        }
        if term.is_empty() {
            return Err(err(ErrorKind::InvalidTermDefinition, "the empty string is not a valid term"));
        }
        let local = self.local;
        let Some(value) = local.get(term) else {
            return Ok(());
        };
        self.defined.insert(term.to_string(), false);

        if is_keyword(term) {
            if !self.is_type_redefinition(term, value) {
                return Err(err(
                    ErrorKind::KeywordRedefinition,
                    format!("keyword {} can not be redefined", term),
                ));
            }
        } else if looks_like_keyword(term) {
            tracing::warn!(term, "ignoring reserved keyword-like term");
            self.defined.insert(term.to_string(), true);
            return Ok(());
        }

        let previous = self.result.terms.remove(term);
        let definition = self.build(term, value)?;
        self.defined.insert(term.to_string(), true);
        let Some(mut definition) = definition else {
            return Ok(());
        };

        if !self.override_protected {
            if let Some(previous) = previous.filter(|p| p.protected) {
                if !previous.same_as(&definition) {
                    return Err(err(
                        ErrorKind::ProtectedTermRedefinition,
                        format!("protected term '{}' can not be redefined", term),
                    )
                    .with_value(value));
                }
                definition = previous;
            }
        }

        self.result.terms.insert(term.to_string(), definition);
        Ok(())
    }

    /// `"@type": {"@container": "@set", "@protected": ...}` is the only keyword
    /// redefinition allowed.
    fn is_type_redefinition(&self, term: &str, value: &JsonValue) -> bool {
        if term != kw::TYPE || self.is_json_ld_10() {
            return false;
        }
        let Some(map) = value.as_object() else {
            return false;
        };
        map.keys().all(|k| k == kw::CONTAINER || k == kw::PROTECTED)
            && map
                .get(kw::CONTAINER)
                .map_or(true, |c| c.as_str() == Some(kw::SET))
    }

    /// IRI expansion that defines terms of the local context on demand.
    fn expand_iri(
        &mut self,
        value: &str,
        document_relative: bool,
        vocab: bool,
    ) -> Result<Option<String>> {
        if !is_keyword(value) && !looks_like_keyword(value) {
            if self.local.contains_key(value) && self.defined.get(value) != Some(&true) {
                self.create(value)?;
            }
            if let Some(colon) = value.find(':').filter(|&i| i > 0) {
                let prefix = &value[..colon];
                if self.local.contains_key(prefix) && self.defined.get(prefix) != Some(&true) {
                    self.create(prefix)?;
                }
            }
        }
        Ok(self.result.expand_iri(value, document_relative, vocab))
    }

    /// Build the definition of `term`; None when the term is ignored.
    fn build(&mut self, term: &str, value: &JsonValue) -> Result<Option<TermDefinition>> {
        let (map, simple) = match value {
            JsonValue::Null => {
                let mut map = Map::new();
                map.insert(kw::ID.to_string(), JsonValue::Null);
                (map, false)
            }
            JsonValue::String(s) => {
                let mut map = Map::new();
                map.insert(kw::ID.to_string(), JsonValue::String(s.clone()));
                (map, true)
            }
            JsonValue::Object(map) => (map.clone(), false),
            other => {
                return Err(err(
                    ErrorKind::InvalidTermDefinition,
                    format!("definition of '{}' must be a string, object or null", term),
                )
                .with_value(other))
            }
        };

        if let Some(key) = map.keys().find(|k| !TERM_DEFINITION_KEYS.contains(&k.as_str())) {
            return Err(err(
                ErrorKind::InvalidTermDefinition,
                format!("unexpected entry {} in definition of '{}'", key, term),
            ));
        }

        let mut def = TermDefinition {
            protected: self.protected,
            ..Default::default()
        };

        if let Some(protected) = map.get(kw::PROTECTED) {
            if self.is_json_ld_10() {
                return Err(err(ErrorKind::InvalidTermDefinition, "@protected requires json-ld-1.1"));
            }
            def.protected = protected.as_bool().ok_or_else(|| {
                err(ErrorKind::InvalidProtectedValue, "@protected must be a boolean")
                    .with_value(protected)
            })?;
        }

        if let Some(type_value) = map.get(kw::TYPE) {
            def.type_mapping = Some(self.type_mapping(type_value)?);
        }

        if let Some(reverse) = map.get(kw::REVERSE) {
            if map.contains_key(kw::ID) || map.contains_key(kw::NEST) {
                return Err(err(
                    ErrorKind::InvalidReverseProperty,
                    format!("reverse term '{}' can not have @id or @nest", term),
                ));
            }
            let Some(reverse) = reverse.as_str() else {
                return Err(err(ErrorKind::InvalidIriMapping, "@reverse must be a string")
                    .with_value(reverse));
            };
            if looks_like_keyword(reverse) && !is_keyword(reverse) {
                tracing::warn!(term, reverse, "ignoring reverse term mapped to a reserved value");
                return Ok(None);
            }
            match self.expand_iri(reverse, false, true)? {
                Some(iri) if iri::is_absolute(&iri) || iri::is_blank(&iri) => def.iri = Some(iri),
                _ => {
                    return Err(err(
                        ErrorKind::InvalidIriMapping,
                        format!("@reverse of '{}' must expand to an IRI", term),
                    ))
                }
            }
            if let Some(container) = map.get(kw::CONTAINER) {
                match container {
                    JsonValue::Null => {}
                    JsonValue::String(s) if s == kw::SET || s == kw::INDEX => {
                        def.container.extend(Container::parse(s));
                    }
                    other => {
                        return Err(err(
                            ErrorKind::InvalidReverseProperty,
                            "reverse terms only allow @set or @index containers",
                        )
                        .with_value(other))
                    }
                }
            }
            def.reverse = true;
            return Ok(Some(def));
        }

        match map.get(kw::ID).filter(|id| id.as_str() != Some(term)) {
            Some(JsonValue::Null) => {}
            Some(JsonValue::String(id)) => {
                if !is_keyword(id) && looks_like_keyword(id) {
                    tracing::warn!(term, id = id.as_str(), "ignoring term mapped to a reserved value");
                    return Ok(None);
                }
                let iri = match self.expand_iri(id, false, true)? {
                    Some(iri)
                        if is_keyword(&iri) || iri::is_absolute(&iri) || iri::is_blank(&iri) =>
                    {
                        iri
                    }
                    _ => {
                        return Err(err(
                            ErrorKind::InvalidIriMapping,
                            format!("'{}' does not map to an IRI, blank node or keyword", term),
                        ))
                    }
                };
                if iri == kw::CONTEXT {
                    return Err(err(ErrorKind::InvalidIriMapping, "@context can not be aliased"));
                }
                // a colon counts only when it is neither the first nor the last character
                let looks_like_iri = term
                    .char_indices()
                    .any(|(i, c)| c == ':' && i > 0 && i + 1 < term.len())
                    || term.contains('/');
                if looks_like_iri {
                    self.defined.insert(term.to_string(), true);
                    if self.expand_iri(term, false, true)?.as_deref() != Some(iri.as_str()) {
                        return Err(err(
                            ErrorKind::InvalidIriMapping,
                            format!("term '{}' looks like an IRI but maps to <{}>", term, iri),
                        ));
                    }
                }
                if !looks_like_iri
                    && simple
                    && (iri::ends_with_gen_delim(&iri) || iri::is_blank(&iri))
                {
                    def.prefix = true;
                }
                def.iri = Some(iri);
            }
            Some(other) => {
                return Err(err(ErrorKind::InvalidIriMapping, "@id must be a string or null")
                    .with_value(other))
            }
            None => def.iri = Some(self.implicit_iri(term)?),
        }

        if let Some(container) = map.get(kw::CONTAINER) {
            def.container = self.container(container)?;
            if def.has_container(Container::Type) {
                match &def.type_mapping {
                    None => def.type_mapping = Some(TypeMapping::Id),
                    Some(TypeMapping::Id | TypeMapping::Vocab) => {}
                    Some(_) => {
                        return Err(err(
                            ErrorKind::InvalidTypeMapping,
                            "@type containers require @id or @vocab coercion",
                        ))
                    }
                }
            }
        }

        if let Some(index) = map.get(kw::INDEX) {
            if self.is_json_ld_10() || !def.has_container(Container::Index) {
                return Err(err(
                    ErrorKind::InvalidTermDefinition,
                    "@index requires json-ld-1.1 and an @index container",
                ));
            }
            let Some(index) = index.as_str() else {
                return Err(err(ErrorKind::InvalidTermDefinition, "@index must be a string")
                    .with_value(index));
            };
            match self.expand_iri(index, false, true)? {
                Some(expanded) if iri::is_absolute(&expanded) => {}
                _ => {
                    return Err(err(
                        ErrorKind::InvalidTermDefinition,
                        format!("@index '{}' does not expand to an IRI", index),
                    ))
                }
            }
            def.index = Some(index.to_string());
        }

        if let Some(scoped) = map.get(kw::CONTEXT) {
            if self.is_json_ld_10() {
                return Err(err(ErrorKind::InvalidTermDefinition, "scoped contexts require json-ld-1.1"));
            }
            let mut remote = self.remote.clone();
            let flags = Flags {
                override_protected: true,
                propagate: true,
                validate_scoped: false,
            };
            self.processor
                .process(self.result, scoped, self.base_url, &mut remote, flags)
                .map_err(|e| {
                    err(
                        ErrorKind::InvalidScopedContext,
                        format!("scoped context of '{}' is invalid: {}", term, e),
                    )
                })?;
            def.context = Some(scoped.clone());
            def.base_url = self.base_url.map(str::to_string);
        }

        if !map.contains_key(kw::TYPE) {
            if let Some(language) = map.get(kw::LANGUAGE) {
                def.language = Some(match language {
                    JsonValue::Null => None,
                    JsonValue::String(s) => Some(s.to_lowercase()),
                    other => {
                        return Err(err(
                            ErrorKind::InvalidLanguageMapping,
                            "@language must be a string or null",
                        )
                        .with_value(other))
                    }
                });
            }
            if let Some(direction) = map.get(kw::DIRECTION) {
                if self.is_json_ld_10() {
                    return Err(err(ErrorKind::InvalidTermDefinition, "@direction requires json-ld-1.1"));
                }
                def.direction = Some(match direction {
                    JsonValue::Null => None,
                    JsonValue::String(s) => Some(Direction::parse(s).ok_or_else(|| {
                        err(ErrorKind::InvalidBaseDirection, "@direction must be ltr or rtl")
                            .with_value(direction)
                    })?),
                    other => {
                        return Err(err(ErrorKind::InvalidBaseDirection, "@direction must be a string")
                            .with_value(other))
                    }
                });
            }
        }

        if let Some(nest) = map.get(kw::NEST) {
            if self.is_json_ld_10() {
                return Err(err(ErrorKind::InvalidTermDefinition, "@nest requires json-ld-1.1"));
            }
            match nest.as_str() {
                Some(s) if !is_keyword(s) || s == kw::NEST => def.nest = Some(s.to_string()),
                _ => {
                    return Err(err(ErrorKind::InvalidNestValue, "@nest must be a term or @nest")
                        .with_value(nest))
                }
            }
        }

        if let Some(prefix) = map.get(kw::PREFIX) {
            if self.is_json_ld_10() || term.contains(':') || term.contains('/') {
                return Err(err(
                    ErrorKind::InvalidTermDefinition,
                    format!("@prefix is not allowed on '{}'", term),
                ));
            }
            def.prefix = prefix.as_bool().ok_or_else(|| {
                err(ErrorKind::InvalidPrefixValue, "@prefix must be a boolean").with_value(prefix)
            })?;
            if def.prefix && def.iri.as_deref().is_some_and(is_keyword) {
                return Err(err(
                    ErrorKind::InvalidTermDefinition,
                    "a keyword alias can not be a prefix",
                ));
            }
        }

        Ok(Some(def))
    }

    /// IRI of a term without an explicit `@id`.
    fn implicit_iri(&mut self, term: &str) -> Result<String> {
        if let Some(colon) = term.find(':').filter(|&i| i > 0) {
            let (prefix, suffix) = (&term[..colon], &term[colon + 1..]);
            if !suffix.starts_with("//") {
                if self.local.contains_key(prefix) {
                    self.create(prefix)?;
                }
                if let Some(prefix_iri) = self.result.terms.get(prefix).and_then(|d| d.iri.clone()) {
                    return Ok(format!("{}{}", prefix_iri, suffix));
                }
            }
            return Ok(term.to_string());
        }
        if term.contains('/') {
            return match self.expand_iri(term, false, true)? {
                Some(iri) if iri::is_absolute(&iri) => Ok(iri),
                _ => Err(err(
                    ErrorKind::InvalidIriMapping,
                    format!("relative term '{}' does not expand to an IRI", term),
                )),
            };
        }
        if term == kw::TYPE {
            return Ok(kw::TYPE.to_string());
        }
        match &self.result.vocab {
            Some(vocab) => Ok(format!("{}{}", vocab, term)),
            None => Err(err(
                ErrorKind::InvalidIriMapping,
                format!("term '{}' has no IRI mapping and no @vocab is set", term),
            )),
        }
    }

    fn type_mapping(&mut self, value: &JsonValue) -> Result<TypeMapping> {
        let Some(s) = value.as_str() else {
            return Err(err(ErrorKind::InvalidTypeMapping, "@type must be a string").with_value(value));
        };
        let expanded = self.expand_iri(s, false, true)?;
        let json_ld_11 = !self.is_json_ld_10();
        match expanded.as_deref() {
            Some(kw::ID) => Ok(TypeMapping::Id),
            Some(kw::VOCAB) => Ok(TypeMapping::Vocab),
            Some(kw::JSON) if json_ld_11 => Ok(TypeMapping::Json),
            Some(kw::NONE) if json_ld_11 => Ok(TypeMapping::None),
            Some(iri) if iri::is_absolute(iri) => Ok(TypeMapping::Iri(iri.to_string())),
            _ => Err(err(ErrorKind::InvalidTypeMapping, format!("invalid type mapping '{}'", s))
                .with_value(value)),
        }
    }

    fn container(&self, value: &JsonValue) -> Result<BTreeSet<Container>> {
        let invalid = || {
            err(ErrorKind::InvalidContainerMapping, "invalid @container value").with_value(value)
        };
        let values: Vec<&JsonValue> = match value {
            JsonValue::Array(items) if !self.is_json_ld_10() => items.iter().collect(),
            JsonValue::String(_) => vec![value],
            _ => return Err(invalid()),
        };
        let mut set = BTreeSet::new();
        for v in values {
            let c = v.as_str().and_then(Container::parse).ok_or_else(invalid)?;
            set.insert(c);
        }

        let valid = if self.is_json_ld_10() {
            set.len() == 1
                && !set.contains(&Container::Graph)
                && !set.contains(&Container::Id)
                && !set.contains(&Container::Type)
        } else if set.contains(&Container::List) {
            set.len() == 1
        } else if set.contains(&Container::Graph) {
            let others: Vec<Container> = set
                .iter()
                .copied()
                .filter(|c| *c != Container::Graph && *c != Container::Set)
                .collect();
            others.len() <= 1 && others.iter().all(|c| matches!(c, Container::Id | Container::Index))
        } else {
            let others = set.iter().filter(|c| **c != Container::Set).count();
            !set.is_empty() && others <= 1
        };
        if !valid {
            return Err(invalid());
        }
        Ok(set)
    }
}
