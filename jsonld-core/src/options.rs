//! Processing options shared by every entry point.

use crate::loader::DocumentLoader;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// `processingMode` option and `@version` handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    #[serde(rename = "json-ld-1.0")]
    JsonLd10,
    #[default]
    #[serde(rename = "json-ld-1.1")]
    JsonLd11,
}

/// Embedding policy used by framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Embed {
    /// Embed every occurrence (subject to the circular reference guard).
    #[serde(rename = "@always")]
    Always,
    /// Only ever output references.
    #[serde(rename = "@never")]
    Never,
    /// Embed the first occurrence, reference the rest.
    #[default]
    #[serde(rename = "@once")]
    Once,
    /// Embed the last occurrence; earlier embeds become references.
    #[serde(rename = "@last")]
    Last,
    /// Share one output node between all occurrences.
    #[serde(rename = "@link")]
    Link,
}

impl Embed {
    /// Parse a keyword value of `@embed`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "@always" => Some(Embed::Always),
            "@never" => Some(Embed::Never),
            "@once" => Some(Embed::Once),
            "@last" => Some(Embed::Last),
            "@link" => Some(Embed::Link),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Embed::Always => "@always",
            Embed::Never => "@never",
            Embed::Once => "@once",
            Embed::Last => "@last",
            Embed::Link => "@link",
        }
    }
}

/// How `@direction` is represented in RDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfDirection {
    /// Encode language and direction in an `https://www.w3.org/ns/i18n#` datatype.
    #[serde(rename = "i18n-datatype")]
    I18nDatatype,
}

/// Options for expansion, compaction, flattening, framing and RDF conversion.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonLdOptions {
    /// Base IRI; overrides the document URL.
    pub base: Option<String>,
    /// Context applied before expanding the input.
    pub expand_context: Option<JsonValue>,
    pub compact_arrays: bool,
    pub compact_to_relative: bool,
    pub processing_mode: ProcessingMode,
    /// Sort object keys while expanding.
    pub ordered: bool,

    pub produce_generalized_rdf: bool,
    pub use_native_types: bool,
    pub use_rdf_type: bool,
    pub rdf_direction: Option<RdfDirection>,
    /// Output format of `to_rdf` (`application/n-quads`) or input format of
    /// `from_rdf`.
    pub format: Option<String>,

    // framing defaults
    pub embed: Embed,
    pub explicit: bool,
    pub require_all: bool,
    pub omit_default: bool,
    /// Unset means "omit in 1.1 mode".
    pub omit_graph: Option<bool>,

    #[serde(skip)]
    document_loader: Option<Arc<dyn DocumentLoader>>,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        Self {
            base: None,
            expand_context: None,
            compact_arrays: true,
            compact_to_relative: true,
            processing_mode: ProcessingMode::default(),
            ordered: false,
            produce_generalized_rdf: false,
            use_native_types: false,
            use_rdf_type: false,
            rdf_direction: None,
            format: None,
            embed: Embed::default(),
            explicit: false,
            require_all: false,
            omit_default: false,
            omit_graph: None,
            document_loader: None,
        }
    }
}

impl std::fmt::Debug for JsonLdOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLdOptions")
            .field("base", &self.base)
            .field("expand_context", &self.expand_context)
            .field("compact_arrays", &self.compact_arrays)
            .field("compact_to_relative", &self.compact_to_relative)
            .field("processing_mode", &self.processing_mode)
            .field("ordered", &self.ordered)
            .field("produce_generalized_rdf", &self.produce_generalized_rdf)
            .field("use_native_types", &self.use_native_types)
            .field("use_rdf_type", &self.use_rdf_type)
            .field("rdf_direction", &self.rdf_direction)
            .field("format", &self.format)
            .field("embed", &self.embed)
            .field("explicit", &self.explicit)
            .field("require_all", &self.require_all)
            .field("omit_default", &self.omit_default)
            .field("omit_graph", &self.omit_graph)
            .field("document_loader", &self.document_loader.as_ref().map(|_| "<loader>"))
            .finish()
    }
}

impl JsonLdOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_expand_context(mut self, context: JsonValue) -> Self {
        self.expand_context = Some(context);
        self
    }

    pub fn with_compact_arrays(mut self, enabled: bool) -> Self {
        self.compact_arrays = enabled;
        self
    }

    pub fn with_compact_to_relative(mut self, enabled: bool) -> Self {
        self.compact_to_relative = enabled;
        self
    }

    pub fn with_processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.processing_mode = mode;
        self
    }

    pub fn with_ordered(mut self, enabled: bool) -> Self {
        self.ordered = enabled;
        self
    }

    pub fn with_produce_generalized_rdf(mut self, enabled: bool) -> Self {
        self.produce_generalized_rdf = enabled;
        self
    }

    pub fn with_use_native_types(mut self, enabled: bool) -> Self {
        self.use_native_types = enabled;
        self
    }

    pub fn with_use_rdf_type(mut self, enabled: bool) -> Self {
        self.use_rdf_type = enabled;
        self
    }

    pub fn with_rdf_direction(mut self, direction: RdfDirection) -> Self {
        self.rdf_direction = Some(direction);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_explicit(mut self, enabled: bool) -> Self {
        self.explicit = enabled;
        self
    }

    pub fn with_require_all(mut self, enabled: bool) -> Self {
        self.require_all = enabled;
        self
    }

    pub fn with_omit_default(mut self, enabled: bool) -> Self {
        self.omit_default = enabled;
        self
    }

    pub fn with_omit_graph(mut self, enabled: bool) -> Self {
        self.omit_graph = Some(enabled);
        self
    }

    /// Set the loader used for remote documents and contexts
    pub fn with_document_loader<L>(mut self, loader: L) -> Self
    where
        L: DocumentLoader + 'static,
    {
        self.document_loader = Some(Arc::new(loader));
        self
    }

    /// Share an existing loader (and whatever cache it owns)
    pub fn with_shared_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.document_loader = Some(loader);
        self
    }

    pub fn document_loader(&self) -> Option<&dyn DocumentLoader> {
        self.document_loader.as_deref()
    }

    pub fn is_json_ld_10(&self) -> bool {
        self.processing_mode == ProcessingMode::JsonLd10
    }

    /// Effective `omitGraph` flag.
    pub fn omit_graph(&self) -> bool {
        self.omit_graph.unwrap_or(!self.is_json_ld_10())
    }
}
