//! Error types for the resolver.
//!
//! Handlers and providers convert these into result content or log lines;
//! nothing here is allowed to unwind into the search engine.

use thiserror::Error;

/// Errors that can occur while resolving or executing a query
#[derive(Debug, Error)]
pub enum NovaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unit or currency pair that no table knows about
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Legacy or misspelled command action type
    #[error("Unknown action type: {0}")]
    InvalidActionType(String),

    /// Launch errors (failed to start a program, URL, or system action)
    #[error("Launch error: {0}")]
    Launch(String),

    /// A captured process ran but could not be driven to completion
    #[error("Process error: {0}")]
    Process(String),

    /// Rate fetch or other network failure
    #[error("Network error: {0}")]
    Network(String),

    /// An external call exceeded its time budget
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    /// Item disappeared between enumeration and activation
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON store errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for resolver operations
pub type NovaResult<T> = Result<T, NovaError>;
