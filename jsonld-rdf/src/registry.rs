//! Registry of RDF input formats
//!
//! Maps a format identifier (a media type) to the parser that turns text in
//! that format into a [`Dataset`]. N-Quads is registered by default; other
//! formats are added at start-up with [`FormatRegistry::register`].

use crate::error::{RdfError, Result};
use crate::nquads::parse_nquads;
use crate::quad::Dataset;
use jsonld_vocab::media;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Legacy identifier still sent by some clients for N-Quads.
pub const N_QUADS_ALIAS: &str = "application/nquads";

/// Parses text in one RDF format.
pub trait RdfParser: Send + Sync {
    fn parse(&self, input: &str) -> Result<Dataset>;
}

impl<F> RdfParser for F
where
    F: Fn(&str) -> Result<Dataset> + Send + Sync,
{
    fn parse(&self, input: &str) -> Result<Dataset> {
        self(input)
    }
}

/// Format id to parser table.
#[derive(Clone)]
pub struct FormatRegistry {
    parsers: HashMap<String, Arc<dyn RdfParser>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(media::N_QUADS, parse_nquads);
        registry.register(N_QUADS_ALIAS, parse_nquads);
        registry
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        formats.sort_unstable();
        f.debug_struct("FormatRegistry").field("formats", &formats).finish()
    }
}

impl FormatRegistry {
    /// Registry with the built-in formats
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without any formats
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Add or replace the parser for `format`
    pub fn register<P>(&mut self, format: impl Into<String>, parser: P)
    where
        P: RdfParser + 'static,
    {
        self.parsers.insert(format.into(), Arc::new(parser));
    }

    pub fn get(&self, format: &str) -> Option<Arc<dyn RdfParser>> {
        self.parsers.get(format).cloned()
    }

    pub fn contains(&self, format: &str) -> bool {
        self.parsers.contains_key(format)
    }

    /// Parse `input` with the parser registered for `format`.
    pub fn parse(&self, format: &str, input: &str) -> Result<Dataset> {
        let parser = self
            .parsers
            .get(format)
            .ok_or_else(|| RdfError::UnknownFormat(format.to_string()))?;
        parser.parse(input)
    }
}
