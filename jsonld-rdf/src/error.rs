//! Error types for RDF conversion and N-Quads handling

use jsonld_core::JsonLdError;

/// Error type for RDF operations
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    /// Malformed N-Quads statement
    #[error("N-Quads syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// No parser or serializer is registered for the requested format
    #[error("unknown RDF format: {0}")]
    UnknownFormat(String),

    /// An `rdf:JSON` literal whose lexical form is not valid JSON
    #[error("invalid JSON literal: {0}")]
    InvalidJsonLiteral(String),

    /// Failure inside the JSON-LD algorithms
    #[error(transparent)]
    JsonLd(#[from] JsonLdError),
}

/// Result type for RDF operations
pub type Result<T> = std::result::Result<T, RdfError>;

impl RdfError {
    /// Create a syntax error for a 1-indexed line
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}
