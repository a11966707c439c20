// src/error.rs

//! Unified error handling for the aggregator.

use std::fmt;

use thiserror::Error;

/// Result type alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
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

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Page fetch or browser session error
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// Nothing could be aggregated
    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed client request
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an aggregation error.
    pub fn aggregation(message: impl Into<String>) -> Self {
        Self::Aggregation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Whether the caller, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::BadRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(AppError::not_found("category x").is_client_error());
        assert!(AppError::bad_request("missing q").is_client_error());
        assert!(!AppError::aggregation("no sources").is_client_error());
        assert!(!AppError::fetch("https://example.com", "timeout").is_client_error());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::fetch("https://example.com/events", "connection refused");
        assert_eq!(
            err.to_string(),
            "Fetch error for https://example.com/events: connection refused"
        );
    }
}
