//! Error types for precis operations.
//!
//! This module defines the main error type [`PrecisError`]. Extraction itself
//! never fails: bad selectors, missing roots and empty trees all normalize to an
//! empty string. The errors here come from the surrounding I/O: fetching pages,
//! reading and writing the settings and capture stores, editing the prompt
//! library and talking to the Ollama server.
//!
//! # Example
//!
//! ```rust
//! use precis_core::{PrecisError, Result};
//!
//! fn pick_prompt(ids: &[&str]) -> Result<String> {
//!     ids.first().map(|id| id.to_string()).ok_or(PrecisError::NoPrompts)
//! }
//! # assert!(pick_prompt(&[]).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for precis.
#[derive(Error, Debug)]
pub enum PrecisError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid CSS selector passed to [`crate::Document::select`].
    ///
    /// Ignore selectors never surface this; they are dropped and logged instead.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The Ollama server answered with a non-success status.
    #[error("Ollama API Error: {status} {reason}")]
    Api { status: u16, reason: String },

    /// The Ollama server answered 2xx but reported an error in the body.
    #[error("{0}")]
    Model(String),

    /// A prompt is missing its title or content.
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    /// A prompt id does not exist in the library.
    #[error("Unknown prompt id: {0}")]
    UnknownPrompt(String),

    /// The library has no prompts to choose from.
    #[error("No system prompts configured")]
    NoPrompts,

    /// Unknown settings key passed to [`crate::Settings::set`].
    #[error("Unknown settings key: {0}")]
    UnknownSetting(String),

    /// File not found.
    ///
    /// Returned when attempting to read a file that doesn't exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read and write errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or capture store content could not be (de)serialized.
    #[error("Malformed store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No default location for the settings or capture store on this platform.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for PrecisError.
///
/// This is a convenience alias for `std::result::Result<T, PrecisError>`.
pub type Result<T> = std::result::Result<T, PrecisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrecisError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_api_error_message() {
        let err = PrecisError::Api { status: 404, reason: "Not Found".to_string() };
        assert_eq!(err.to_string(), "Ollama API Error: 404 Not Found");
    }

    #[test]
    fn test_model_error_is_verbatim() {
        let err = PrecisError::Model("model 'llama9' not found".to_string());
        assert_eq!(err.to_string(), "model 'llama9' not found");
    }

    #[test]
    fn test_timeout_error() {
        let err = PrecisError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
