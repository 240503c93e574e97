//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the gateway.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup, never raised while serving).
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation errors (missing required argument/field).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown operation name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal errors caught at a front-end boundary.
    #[error("internal error: {0}")]
    Internal(String),

    /// Outbound HTTP transport errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to a JSON-RPC 2.0 error code for the MCP front-end.
    ///
    /// Serialization errors surface at the protocol boundary as parse
    /// errors (−32700); everything unexpected is internal (−32603).
    pub fn to_jsonrpc_code(&self) -> i64 {
        match self {
            Error::Validation(_) => -32602,
            Error::NotFound(_) => -32601,
            Error::Serialization(_) => -32700,
            Error::Config(_) | Error::Internal(_) | Error::Http(_) | Error::Io(_) => -32603,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
