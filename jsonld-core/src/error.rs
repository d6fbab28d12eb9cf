use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

/// Stable error codes, named after the JSON-LD 1.1 error code registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // context processing
    InvalidVocabMapping,
    InvalidBaseIri,
    InvalidDefaultLanguage,
    InvalidBaseDirection,
    InvalidVersionValue,
    InvalidPropagateValue,
    InvalidImportValue,
    InvalidContextEntry,
    KeywordRedefinition,
    ProtectedTermRedefinition,
    InvalidContextNullification,
    CyclicIriMapping,
    InvalidTermDefinition,
    InvalidIriMapping,
    InvalidTypeMapping,
    InvalidContainerMapping,
    InvalidReverseProperty,
    InvalidScopedContext,
    InvalidPrefixValue,
    InvalidNestValue,
    InvalidProtectedValue,
    InvalidLanguageMapping,
    InvalidLocalContext,
    InvalidRemoteContext,
    RecursiveContextInclusion,
    ContextOverflow,
    LoadingRemoteContextFailed,
    ProcessingModeConflict,
    // expansion
    InvalidIdValue,
    InvalidTypeValue,
    InvalidIndexValue,
    InvalidIncludedValue,
    InvalidReverseValue,
    CollidingKeywords,
    InvalidValueObject,
    InvalidValueObjectValue,
    InvalidTypedValue,
    InvalidLanguageTaggedString,
    InvalidLanguageTaggedValue,
    InvalidLanguageMapValue,
    ListOfLists,
    InvalidReversePropertyMap,
    InvalidReversePropertyValue,
    InvalidSetOrListObject,
    // flattening
    ConflictingIndexes,
    // compaction
    IriConfusedWithPrefix,
    CompactionToListOfLists,
    // framing
    InvalidFrame,
    InvalidEmbedValue,
    FrameStackTooDeep,
    // document loading
    LoadingDocumentFailed,
    MultipleContextLinkHeaders,
}

impl ErrorKind {
    /// The registry code, e.g. `"protected term redefinition"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidVocabMapping => "invalid vocab mapping",
            ErrorKind::InvalidBaseIri => "invalid base IRI",
            ErrorKind::InvalidDefaultLanguage => "invalid default language",
            ErrorKind::InvalidBaseDirection => "invalid base direction",
            ErrorKind::InvalidVersionValue => "invalid @version value",
            ErrorKind::InvalidPropagateValue => "invalid @propagate value",
            ErrorKind::InvalidImportValue => "invalid @import value",
            ErrorKind::InvalidContextEntry => "invalid context entry",
            ErrorKind::KeywordRedefinition => "keyword redefinition",
            ErrorKind::ProtectedTermRedefinition => "protected term redefinition",
            ErrorKind::InvalidContextNullification => "invalid context nullification",
            ErrorKind::CyclicIriMapping => "cyclic IRI mapping",
            ErrorKind::InvalidTermDefinition => "invalid term definition",
            ErrorKind::InvalidIriMapping => "invalid IRI mapping",
            ErrorKind::InvalidTypeMapping => "invalid type mapping",
            ErrorKind::InvalidContainerMapping => "invalid container mapping",
            ErrorKind::InvalidReverseProperty => "invalid reverse property",
            ErrorKind::InvalidScopedContext => "invalid scoped context",
            ErrorKind::InvalidPrefixValue => "invalid @prefix value",
            ErrorKind::InvalidNestValue => "invalid @nest value",
            ErrorKind::InvalidProtectedValue => "invalid @protected value",
            ErrorKind::InvalidLanguageMapping => "invalid language mapping",
            ErrorKind::InvalidLocalContext => "invalid local context",
            ErrorKind::InvalidRemoteContext => "invalid remote context",
            ErrorKind::RecursiveContextInclusion => "recursive context inclusion",
            ErrorKind::ContextOverflow => "context overflow",
            ErrorKind::LoadingRemoteContextFailed => "loading remote context failed",
            ErrorKind::ProcessingModeConflict => "processing mode conflict",
            ErrorKind::InvalidIdValue => "invalid @id value",
            ErrorKind::InvalidTypeValue => "invalid type value",
            ErrorKind::InvalidIndexValue => "invalid @index value",
            ErrorKind::InvalidIncludedValue => "invalid @included value",
            ErrorKind::InvalidReverseValue => "invalid @reverse value",
            ErrorKind::CollidingKeywords => "colliding keywords",
            ErrorKind::InvalidValueObject => "invalid value object",
            ErrorKind::InvalidValueObjectValue => "invalid value object value",
            ErrorKind::InvalidTypedValue => "invalid typed value",
            ErrorKind::InvalidLanguageTaggedString => "invalid language-tagged string",
            ErrorKind::InvalidLanguageTaggedValue => "invalid language-tagged value",
            ErrorKind::InvalidLanguageMapValue => "invalid language map value",
            ErrorKind::ListOfLists => "list of lists",
            ErrorKind::InvalidReversePropertyMap => "invalid reverse property map",
            ErrorKind::InvalidReversePropertyValue => "invalid reverse property value",
            ErrorKind::InvalidSetOrListObject => "invalid set or list object",
            ErrorKind::ConflictingIndexes => "conflicting indexes",
            ErrorKind::IriConfusedWithPrefix => "IRI confused with prefix",
            ErrorKind::CompactionToListOfLists => "compaction to list of lists",
            ErrorKind::InvalidFrame => "invalid frame",
            ErrorKind::InvalidEmbedValue => "invalid @embed value",
            ErrorKind::FrameStackTooDeep => "frame stack too deep",
            ErrorKind::LoadingDocumentFailed => "loading document failed",
            ErrorKind::MultipleContextLinkHeaders => "multiple context link headers",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a value inside the input document: object keys and array
/// indexes from the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocPath(pub Vec<JsonValue>);

impl DocPath {
    pub fn new(segments: &[JsonValue]) -> Self {
        DocPath(segments.to_vec())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            match segment {
                JsonValue::String(s) => write!(f, "/{}", s)?,
                other => write!(f, "/{}", other)?,
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone)]
pub enum JsonLdError {
    #[error("Invalid context ({kind}): {message}")]
    Context {
        kind: ErrorKind,
        message: String,
        value: Option<JsonValue>,
    },

    #[error("Expansion failed ({kind}) at {path}: {message}")]
    Expand {
        kind: ErrorKind,
        message: String,
        value: Option<JsonValue>,
        path: DocPath,
    },

    #[error("Flattening failed ({kind}): {message}")]
    Flatten {
        kind: ErrorKind,
        message: String,
        value: Option<JsonValue>,
    },

    #[error("Compaction failed ({kind}): {message}")]
    Compact {
        kind: ErrorKind,
        message: String,
        value: Option<JsonValue>,
    },

    #[error("Framing failed ({kind}): {message}")]
    Frame {
        kind: ErrorKind,
        message: String,
        value: Option<JsonValue>,
    },

    #[error("Could not load <{url}> ({kind}): {message}")]
    Loader {
        kind: ErrorKind,
        url: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, JsonLdError>;

impl JsonLdError {
    /// Create a context processing error
    pub fn context(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsonLdError::Context {
            kind,
            message: message.into(),
            value: None,
        }
    }

    /// Create an expansion error located at `path`
    pub fn expand(kind: ErrorKind, message: impl Into<String>, path: &[JsonValue]) -> Self {
        JsonLdError::Expand {
            kind,
            message: message.into(),
            value: None,
            path: DocPath::new(path),
        }
    }

    pub fn flatten(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsonLdError::Flatten {
            kind,
            message: message.into(),
            value: None,
        }
    }

    pub fn compact(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsonLdError::Compact {
            kind,
            message: message.into(),
            value: None,
        }
    }

    pub fn frame(kind: ErrorKind, message: impl Into<String>) -> Self {
        JsonLdError::Frame {
            kind,
            message: message.into(),
            value: None,
        }
    }

    /// Create a document loading error
    pub fn loader(kind: ErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        JsonLdError::Loader {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Attach the offending value.
    pub fn with_value(mut self, offending: &JsonValue) -> Self {
        match &mut self {
            JsonLdError::Context { value, .. }
            | JsonLdError::Expand { value, .. }
            | JsonLdError::Flatten { value, .. }
            | JsonLdError::Compact { value, .. }
            | JsonLdError::Frame { value, .. } => *value = Some(offending.clone()),
            JsonLdError::Loader { .. } => {}
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            JsonLdError::Context { kind, .. }
            | JsonLdError::Expand { kind, .. }
            | JsonLdError::Flatten { kind, .. }
            | JsonLdError::Compact { kind, .. }
            | JsonLdError::Frame { kind, .. }
            | JsonLdError::Loader { kind, .. } => *kind,
        }
    }

    pub fn value(&self) -> Option<&JsonValue> {
        match self {
            JsonLdError::Context { value, .. }
            | JsonLdError::Expand { value, .. }
            | JsonLdError::Flatten { value, .. }
            | JsonLdError::Compact { value, .. }
            | JsonLdError::Frame { value, .. } => value.as_ref(),
            JsonLdError::Loader { .. } => None,
        }
    }

    /// Document path of an expansion error.
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            JsonLdError::Expand { path, .. } => Some(path),
            _ => None,
        }
    }
}
