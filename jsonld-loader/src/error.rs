//! Error types for loader construction

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors raised while setting up a loader. Failures while loading a
/// document are reported as `JsonLdError::Loader` instead.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Invalid loader configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
