// src/error.rs

//! Unified error handling for the catalog crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level failure: unreachable host, timeout, non-2xx status
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Malformed document, unknown type discriminator or unparseable version
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// The leaf processor reported a failure
    #[error("Processor error for {leaf}: {message}")]
    Processor { leaf: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a processor error for a leaf.
    pub fn processor(leaf: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Processor {
            leaf: leaf.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this is a transport failure.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Http(_))
    }

    /// Whether this is a document or version parse failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_classify() {
        assert!(AppError::fetch("https://x/index.json", "503").is_fetch());
        assert!(AppError::parse("page", "bad").is_parse());
        assert!(!AppError::processor("leaf", "boom").is_fetch());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::fetch("https://x/page0.json", "status 404");
        assert_eq!(
            err.to_string(),
            "Fetch error for https://x/page0.json: status 404"
        );
    }
}
