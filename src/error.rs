//! Error types for smithy-paginator
//!
//! This module defines the error hierarchy for the whole crate.
//! Setup-time problems (model, paths, policies, config files) are
//! configuration errors and prevent a pagination run from starting.
//! Everything raised while fetching a page surfaces to the consumer of
//! the page sequence at the point that page was demanded.

use thiserror::Error;

/// The main error type for smithy-paginator
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid member path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Shape '{shape}' not found in model")]
    UnknownShape { shape: String },

    #[error("Member '{member}' does not exist on shape '{shape}'")]
    UnknownMember { shape: String, member: String },

    #[error("Operation '{operation}' is not paginated")]
    NotPaginated { operation: String },

    #[error("Operation name '{name}' is ambiguous, candidates: {candidates}")]
    AmbiguousOperation { name: String, candidates: String },

    #[error("Failed to parse Smithy model: {source}")]
    ModelParse {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Fetch Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wrap a JSON error raised while reading a model document
    pub fn model_parse(source: serde_json::Error) -> Self {
        Self::ModelParse { source }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown shape error
    pub fn unknown_shape(shape: impl Into<String>) -> Self {
        Self::UnknownShape {
            shape: shape.into(),
        }
    }

    /// Create an unknown member error
    pub fn unknown_member(shape: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            shape: shape.into(),
            member: member.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Check if this error was raised while setting up pagination
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::InvalidPath { .. }
                | Error::UnknownShape { .. }
                | Error::UnknownMember { .. }
                | Error::NotPaginated { .. }
                | Error::AmbiguousOperation { .. }
                | Error::ModelParse { .. }
                | Error::YamlParse(_)
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for smithy-paginator
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
