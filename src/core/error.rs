//! Custom error types for tooldriver
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for tooldriver operations
#[derive(Error, Debug)]
pub enum DriverError {
    /// Model service returned an error response
    #[error("API error: {0}")]
    Api(String),

    /// Tool input or execution errors
    #[error("Tool error: {0}")]
    Tool(String),

    /// Path resolved outside the editor root
    #[error("Path '{0}' escapes the editor root")]
    PathEscape(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for tooldriver operations
pub type Result<T> = std::result::Result<T, DriverError>;

impl DriverError {
    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a tool error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DriverError::with_context("Failed to read 'a.txt'", io);
        assert_eq!(err.to_string(), "Failed to read 'a.txt': gone");
    }

    #[test]
    fn test_path_escape_message() {
        let err = DriverError::PathEscape("../etc/passwd".to_string());
        assert!(err.to_string().contains("escapes the editor root"));
    }
}
