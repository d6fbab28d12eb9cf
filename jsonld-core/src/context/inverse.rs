use super::term::TypeMapping;
use super::ActiveContext;
use jsonld_vocab::keywords as kw;
use std::collections::HashMap;

/// Terms keyed by `@language`, `@type` or `@any` selector value.
#[derive(Debug, Clone, Default)]
struct TypeLanguageMap {
    language: HashMap<String, String>,
    type_: HashMap<String, String>,
    any: HashMap<String, String>,
}

impl TypeLanguageMap {
    fn for_selector(&self, selector: &str) -> Option<&HashMap<String, String>> {
        match selector {
            kw::LANGUAGE => Some(&self.language),
            kw::TYPE => Some(&self.type_),
            kw::ANY => Some(&self.any),
            _ => None,
        }
    }
}

/// Lookup table from IRI to the terms that can compact it, keyed by
/// container and by type or language.
#[derive(Debug, Clone, Default)]
pub struct InverseContext {
    entries: HashMap<String, HashMap<String, TypeLanguageMap>>,
}

fn set_if_absent(map: &mut HashMap<String, String>, key: impl Into<String>, term: &str) {
    map.entry(key.into()).or_insert_with(|| term.to_string());
}

impl InverseContext {
    pub fn build(active: &ActiveContext) -> Self {
        let default_language = active
            .default_language
            .clone()
            .unwrap_or_else(|| kw::NONE.to_string());

        let mut terms: Vec<_> = active.terms().collect();
        terms.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut entries: HashMap<String, HashMap<String, TypeLanguageMap>> = HashMap::new();
        for (term, def) in terms {
            let Some(iri) = &def.iri else {
                continue;
            };
            let maps = entries
                .entry(iri.clone())
                .or_default()
                .entry(def.container_key())
                .or_insert_with(|| {
                    let mut m = TypeLanguageMap::default();
                    m.any.insert(kw::NONE.to_string(), term.to_string());
                    m
                });

            if def.reverse {
                set_if_absent(&mut maps.type_, kw::REVERSE, term);
                continue;
            }
            match &def.type_mapping {
                Some(TypeMapping::None) => {
                    set_if_absent(&mut maps.language, kw::ANY, term);
                    set_if_absent(&mut maps.type_, kw::ANY, term);
                    continue;
                }
                Some(mapping) => {
                    set_if_absent(&mut maps.type_, mapping.as_str(), term);
                    continue;
                }
                None => {}
            }

            match (&def.language, &def.direction) {
                (Some(language), Some(direction)) => {
                    let key = match (language, direction) {
                        (Some(l), Some(d)) => format!("{}_{}", l, d.as_str()),
                        (Some(l), None) => l.clone(),
                        (None, Some(d)) => format!("_{}", d.as_str()),
                        (None, None) => kw::NULL.to_string(),
                    };
                    set_if_absent(&mut maps.language, key, term);
                }
                (Some(language), None) => {
                    let key = language.clone().unwrap_or_else(|| kw::NULL.to_string());
                    set_if_absent(&mut maps.language, key, term);
                }
                (None, Some(direction)) => {
                    let key = match direction {
                        Some(d) => format!("_{}", d.as_str()),
                        None => kw::NONE.to_string(),
                    };
                    set_if_absent(&mut maps.language, key, term);
                }
                (None, None) => {
                    match active.default_direction {
                        Some(d) => {
                            let key = format!(
                                "{}_{}",
                                active.default_language.as_deref().unwrap_or(""),
                                d.as_str()
                            );
                            set_if_absent(&mut maps.language, key, term);
                        }
                        None => set_if_absent(&mut maps.language, default_language.clone(), term),
                    }
                    set_if_absent(&mut maps.language, kw::NONE, term);
                    set_if_absent(&mut maps.type_, kw::NONE, term);
                }
            }
        }

        InverseContext { entries }
    }

    /// Whether any term maps to `iri`.
    pub fn contains(&self, iri: &str) -> bool {
        self.entries.contains_key(iri)
    }

    /// Term selection: the first term for `iri` whose container is in
    /// `containers` and whose type/language entry under `selector`
    /// (`@language`, `@type` or `@any`) matches one of `preferred`, tried
    /// in order.
    pub fn select_term(
        &self,
        iri: &str,
        containers: &[String],
        selector: &str,
        preferred: &[String],
    ) -> Option<&str> {
        let by_container = self.entries.get(iri)?;
        for container in containers {
            let Some(maps) = by_container.get(container) else {
                continue;
            };
            let Some(values) = maps.for_selector(selector) else {
                continue;
            };
            if let Some(term) = preferred.iter().find_map(|p| values.get(p)) {
                return Some(term);
            }
        }
        None
    }
}
