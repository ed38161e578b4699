//! Error types for poem generation.
//!
//! Everything the library can fail on is a [`PoetryError`]. Empty lookups
//! (no rhyme, no related words) are not errors; they come back as empty
//! collections or `None` and the composition code degrades around them.

use std::io;

use thiserror::Error;

/// The main error type for the library.
#[derive(Error, Debug)]
pub enum PoetryError {
    /// A word contains whitespace, digits, hyphens or apostrophes, or is empty.
    #[error("Invalid word {word:?}: {reason}")]
    InvalidWord { word: String, reason: String },

    /// A caller-supplied argument is out of range or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A document URL does not point at the expected host.
    #[error("Invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Word-association or document download failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PoetryError {
    pub fn invalid_word<S: Into<String>, R: Into<String>>(word: S, reason: R) -> Self {
        PoetryError::InvalidWord {
            word: word.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        PoetryError::InvalidInput(msg.into())
    }

    pub fn invalid_url<S: Into<String>, R: Into<String>>(url: S, reason: R) -> Self {
        PoetryError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        PoetryError::Config(msg.into())
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PoetryError>;
