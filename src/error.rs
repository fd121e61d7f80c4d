// src/error.rs

use std::time::Duration;
use thiserror::Error;

/// Core error types for Aurum
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection could not be established or was dropped mid-request
    #[error("Network error: {0}")]
    Network(String),

    /// TLS configuration or handshake failure
    #[error("TLS error: {0}")]
    Tls(String),

    /// Request exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Status line or header block could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Response body is not valid JSON; the decoded text is kept for diagnosis
    #[error("Invalid JSON payload: {source}")]
    InvalidPayload {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    /// The RPC service answered with an `error` field
    #[error("AUR RPC error: {0}")]
    Rpc(String),

    /// A conflicts/replaces/provides line could not be parsed
    #[error("Invalid dependency line: {0}")]
    InvalidDependency(String),

    /// Repository is not configured in pacman.conf
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Local or sync database could not be read
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using Aurum's Error type
pub type Result<T> = std::result::Result<T, Error>;
